//! Configuration and log paths
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/dashboard-e2e/` and `~/.local/share/dashboard-e2e/`
//! - macOS: `~/Library/Application Support/dashboard-e2e/`
//! - Windows: `%APPDATA%\dashboard-e2e\`

use std::io;
use std::path::PathBuf;

/// Application directory name
const APP_NAME: &str = "dashboard-e2e";

/// Name of the run log file inside the log directory
pub const RUN_LOG_FILE: &str = "run.log";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the path to the log directory
pub fn log_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.data_dir().join("logs"))
}

/// Get the path to the run log file
pub fn run_log_path() -> Option<PathBuf> {
    log_dir().map(|d| d.join(RUN_LOG_FILE))
}

/// Ensure the log directory exists
pub fn ensure_log_dir() -> io::Result<Option<PathBuf>> {
    if let Some(dir) = log_dir() {
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(Some(dir))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_ends_with_toml() {
        if let Some(path) = config_path() {
            assert_eq!(path.file_name().unwrap(), "config.toml");
        }
    }

    #[test]
    fn test_run_log_lives_in_log_dir() {
        if let (Some(dir), Some(log)) = (log_dir(), run_log_path()) {
            assert_eq!(log.parent().unwrap(), dir);
        }
    }
}
