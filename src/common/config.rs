//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Dashboard under test
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// WebDriver endpoint and browser settings
    #[serde(default)]
    pub webdriver: WebDriverConfig,

    /// Wait timeouts
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Scenario run settings
    #[serde(default)]
    pub run: RunConfig,
}

/// Dashboard location and credentials
#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    /// Base URL of the dashboard
    #[serde(default = "default_url")]
    pub url: String,

    /// Token submitted on the login page
    #[serde(default)]
    pub login_token: String,

    /// Personal access token submitted on the GitHub auth page
    #[serde(default)]
    pub github_token: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            login_token: String::new(),
            github_token: String::new(),
        }
    }
}

fn default_url() -> String {
    "http://dashboard.dev.localflynn.com".to_string()
}

/// Browser engine requested from the WebDriver endpoint
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BrowserKind {
    /// Chrome / Chromium through chromedriver
    #[default]
    Chrome,
    /// Firefox through geckodriver
    Firefox,
}

impl BrowserKind {
    /// W3C `browserName` capability
    pub fn browser_name(self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Firefox => "firefox",
        }
    }

    /// Driver binary conventionally serving this browser
    pub fn driver_binary(self) -> &'static str {
        match self {
            Self::Chrome => "chromedriver",
            Self::Firefox => "geckodriver",
        }
    }
}

impl std::str::FromStr for BrowserKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chrome" | "chromium" => Ok(Self::Chrome),
            "firefox" => Ok(Self::Firefox),
            other => Err(format!("unknown browser '{}' (expected chrome or firefox)", other)),
        }
    }
}

/// WebDriver settings
#[derive(Debug, Deserialize, Clone)]
pub struct WebDriverConfig {
    /// Endpoint of a running WebDriver server
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Browser to request
    #[serde(default)]
    pub browser: BrowserKind,

    /// Run the browser without a window
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Driver binary to spawn before the run (not spawned when unset)
    #[serde(default)]
    pub driver_path: Option<PathBuf>,

    /// Port the spawned driver listens on
    #[serde(default = "default_driver_port")]
    pub driver_port: u16,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            browser: BrowserKind::default(),
            headless: default_true(),
            driver_path: None,
            driver_port: default_driver_port(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:9515".to_string()
}
fn default_true() -> bool {
    true
}
fn default_driver_port() -> u16 {
    9515
}

/// Wait timeouts in milliseconds
#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// Default bound for waits that expect a quick transition
    #[serde(default = "default_wait")]
    pub default_wait_ms: u64,

    /// Waiting for repository links and the launch modal
    #[serde(default = "default_selector_wait")]
    pub selector_wait_ms: u64,

    /// Returning from GitHub authorization
    #[serde(default = "default_auth_wait")]
    pub auth_wait_ms: u64,

    /// Waiting for an app launch to finish
    #[serde(default = "default_launch_wait")]
    pub launch_wait_ms: u64,

    /// Waiting for the env editor to save
    #[serde(default = "default_save_wait")]
    pub save_wait_ms: u64,

    /// Interval between condition checks
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            default_wait_ms: default_wait(),
            selector_wait_ms: default_selector_wait(),
            auth_wait_ms: default_auth_wait(),
            launch_wait_ms: default_launch_wait(),
            save_wait_ms: default_save_wait(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

fn default_wait() -> u64 {
    200
}
fn default_selector_wait() -> u64 {
    10_000
}
fn default_auth_wait() -> u64 {
    20_000
}
fn default_launch_wait() -> u64 {
    300_000
}
fn default_save_wait() -> u64 {
    10_000
}
fn default_poll_interval() -> u64 {
    50
}

impl Timeouts {
    pub fn default_wait(&self) -> Duration {
        Duration::from_millis(self.default_wait_ms)
    }

    pub fn selector_wait(&self) -> Duration {
        Duration::from_millis(self.selector_wait_ms)
    }

    pub fn auth_wait(&self) -> Duration {
        Duration::from_millis(self.auth_wait_ms)
    }

    pub fn launch_wait(&self) -> Duration {
        Duration::from_millis(self.launch_wait_ms)
    }

    pub fn save_wait(&self) -> Duration {
        Duration::from_millis(self.save_wait_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Scenario run settings
#[derive(Debug, Deserialize, Clone)]
pub struct RunConfig {
    /// Stop after the first step that records a failed assertion
    #[serde(default)]
    pub abort_on_failure: bool,

    /// Generated app names are truncated to this many characters
    #[serde(default = "default_max_app_name_length")]
    pub max_app_name_length: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            abort_on_failure: false,
            max_app_name_length: default_max_app_name_length(),
        }
    }
}

fn default_max_app_name_length() -> usize {
    30
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }

    /// Check that everything a run needs is present
    pub fn validate(&self) -> Result<()> {
        if self.dashboard.url.trim().is_empty() {
            return Err(super::Error::Config("dashboard url is empty".to_string()));
        }
        if self.dashboard.login_token.is_empty() {
            return Err(super::Error::Config(
                "no login token. Set [dashboard] login_token, --login-token \
                 or DASHBOARD_LOGIN_TOKEN"
                    .to_string(),
            ));
        }
        if self.dashboard.github_token.is_empty() {
            return Err(super::Error::Config(
                "no GitHub token. Set [dashboard] github_token, --github-token or GITHUB_TOKEN"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_scenario_timeouts() {
        let config = Config::default();
        assert_eq!(config.timeouts.default_wait(), Duration::from_millis(200));
        assert_eq!(config.timeouts.selector_wait(), Duration::from_secs(10));
        assert_eq!(config.timeouts.auth_wait(), Duration::from_secs(20));
        assert_eq!(config.timeouts.launch_wait(), Duration::from_secs(300));
        assert_eq!(config.run.max_app_name_length, 30);
        assert!(!config.run.abort_on_failure);
        assert_eq!(config.webdriver.browser, BrowserKind::Chrome);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[dashboard]
url = "https://dashboard.example.test"
login_token = "abc123"

[webdriver]
browser = "firefox"
headless = false

[timeouts]
launch_wait_ms = 1000
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.dashboard.url, "https://dashboard.example.test");
        assert_eq!(config.dashboard.login_token, "abc123");
        assert!(config.dashboard.github_token.is_empty());
        assert_eq!(config.webdriver.browser, BrowserKind::Firefox);
        assert!(!config.webdriver.headless);
        assert_eq!(config.webdriver.endpoint, "http://localhost:9515");
        assert_eq!(config.timeouts.launch_wait(), Duration::from_secs(1));
        assert_eq!(config.timeouts.default_wait_ms, 200);
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[timeouts]\ndefault_wait_ms = \"soon\"\n").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, super::super::Error::ConfigParse(_)));
    }

    #[test]
    fn test_validate_requires_tokens() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.dashboard.login_token = "abc123".to_string();
        assert!(config.validate().is_err());

        config.dashboard.github_token = "ghp_x".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_browser_kind_parsing() {
        assert_eq!("Chromium".parse::<BrowserKind>().unwrap(), BrowserKind::Chrome);
        assert_eq!("firefox".parse::<BrowserKind>().unwrap(), BrowserKind::Firefox);
        assert!("safari".parse::<BrowserKind>().is_err());
        assert_eq!(BrowserKind::Firefox.driver_binary(), "geckodriver");
    }
}
