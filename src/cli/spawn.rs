//! WebDriver process spawning
//!
//! Starts chromedriver / geckodriver as a child process when the run is asked
//! to manage its own driver, then waits until the driver reports ready.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};

use crate::common::config::WebDriverConfig;
use crate::common::{Error, Result};
use crate::webdriver::WebDriverClient;

/// Timeout for the driver to start up
const SPAWN_TIMEOUT_SECS: u64 = 5;

/// A running driver, killed when dropped
pub struct DriverProcess {
    child: Child,
    endpoint: String,
}

impl DriverProcess {
    /// Endpoint the driver listens on
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Stop the driver
    pub async fn stop(mut self) {
        if let Err(e) = self.child.kill().await {
            tracing::warn!("Failed to stop WebDriver: {}", e);
        } else {
            tracing::debug!("WebDriver stopped");
        }
    }
}

/// Locate the driver binary for the configured browser
///
/// An explicit `driver_path` wins; otherwise the browser's driver is looked
/// up on `PATH`.
pub fn find_driver(config: &WebDriverConfig) -> Result<PathBuf> {
    if let Some(path) = &config.driver_path {
        if path.exists() {
            return Ok(path.clone());
        }
        return Err(Error::driver_not_found(
            config.browser.driver_binary(),
            &[path.display().to_string()],
        ));
    }

    let name = config.browser.driver_binary();
    which::which(name).map_err(|_| Error::driver_not_found(name, &["PATH"]))
}

/// Spawn the driver on the configured port and wait until it is ready
pub async fn spawn_driver(config: &WebDriverConfig) -> Result<DriverProcess> {
    let binary = find_driver(config)?;
    spawn_at(&binary, config.driver_port).await
}

async fn spawn_at(binary: &Path, port: u16) -> Result<DriverProcess> {
    tracing::debug!("Spawning WebDriver {} on port {}", binary.display(), port);

    let child = Command::new(binary)
        .arg(format!("--port={}", port))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::DriverStartFailed(format!("{}: {}", binary.display(), e)))?;

    let mut process = DriverProcess {
        child,
        endpoint: format!("http://localhost:{}", port),
    };

    // Wait for the driver to start accepting sessions
    let deadline = tokio::time::Instant::now() + Duration::from_secs(SPAWN_TIMEOUT_SECS);

    loop {
        if tokio::time::Instant::now() >= deadline {
            process.stop().await;
            return Err(Error::DriverSpawnTimeout(SPAWN_TIMEOUT_SECS));
        }

        tokio::time::sleep(Duration::from_millis(50)).await;

        if let Ok(Some(status)) = process.child.try_wait() {
            return Err(Error::DriverStartFailed(format!(
                "{} exited with {}",
                binary.display(),
                status
            )));
        }

        match WebDriverClient::status(&process.endpoint).await {
            Ok(status) if status.ready => {
                tracing::debug!("WebDriver started successfully");
                return Ok(process);
            }
            _ => continue,
        }
    }
}
