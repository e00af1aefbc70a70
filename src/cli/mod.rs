//! CLI command handling
//!
//! Dispatches CLI commands and formats their output.

pub mod spawn;

use colored::Colorize;

use crate::browser::DriverPage;
use crate::commands::{Commands, RunArgs};
use crate::common::config::{BrowserKind, Config};
use crate::common::{paths, Error, Result};
use crate::testing::{ScenarioResult, ScenarioRunner};
use crate::webdriver::WebDriverClient;

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run(args) => run(args).await,

        Commands::Check { webdriver_url } => {
            let config = Config::load()?;
            let endpoint = webdriver_url.unwrap_or(config.webdriver.endpoint);
            let status = WebDriverClient::status(&endpoint).await?;

            if status.ready {
                println!("{} WebDriver at {} is ready", "✓".green(), endpoint);
                if !status.message.is_empty() {
                    println!("  {}", status.message.dimmed());
                }
                Ok(())
            } else {
                Err(Error::DriverStartFailed(format!(
                    "{} is not ready: {}",
                    endpoint, status.message
                )))
            }
        }

        Commands::Logs { lines, clear } => {
            if clear {
                crate::common::logging::truncate_run_log()?;
                println!("Run log cleared");
                return Ok(());
            }

            let path = paths::run_log_path()
                .ok_or_else(|| Error::Internal("could not determine data directory".to_string()))?;
            if !path.exists() {
                println!("No run log at {}", path.display());
                return Ok(());
            }

            let content = std::fs::read_to_string(&path).map_err(|e| Error::FileRead {
                path: path.display().to_string(),
                error: e.to_string(),
            })?;
            for line in tail(&content, lines) {
                println!("{}", line);
            }
            Ok(())
        }
    }
}

/// Load the configuration a run will use, with CLI flags applied on top
pub fn resolve_config(args: &RunArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    apply_overrides(&mut config, args)?;
    Ok(config)
}

fn apply_overrides(config: &mut Config, args: &RunArgs) -> Result<()> {
    if let Some(url) = &args.url {
        config.dashboard.url = url.clone();
    }
    if let Some(token) = &args.login_token {
        config.dashboard.login_token = token.clone();
    }
    if let Some(token) = &args.github_token {
        config.dashboard.github_token = token.clone();
    }
    if let Some(endpoint) = &args.webdriver_url {
        config.webdriver.endpoint = endpoint.clone();
    }
    if let Some(browser) = &args.browser {
        config.webdriver.browser = browser.parse::<BrowserKind>().map_err(Error::Config)?;
    }
    if args.headed {
        config.webdriver.headless = false;
    }
    if args.fail_fast {
        config.run.abort_on_failure = true;
    }
    Ok(())
}

async fn run(args: RunArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    config.validate()?;

    let driver = if args.spawn_driver || config.webdriver.driver_path.is_some() {
        let process = spawn::spawn_driver(&config.webdriver).await?;
        tracing::info!(endpoint = process.endpoint(), "WebDriver spawned");
        Some(process)
    } else {
        None
    };
    let endpoint = driver
        .as_ref()
        .map(|d| d.endpoint().to_string())
        .unwrap_or_else(|| config.webdriver.endpoint.clone());

    let outcome = run_session(&endpoint, &config, args.json).await;

    if let Some(driver) = driver {
        driver.stop().await;
    }

    let result = outcome?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    if result.passed {
        Ok(())
    } else {
        Err(Error::TestAssertion(format!(
            "{} of {} assertions failed",
            result.failure_count(),
            result.assertions.len()
        )))
    }
}

async fn run_session(endpoint: &str, config: &Config, quiet: bool) -> Result<ScenarioResult> {
    let client = WebDriverClient::new_session(
        endpoint,
        config.webdriver.browser,
        config.webdriver.headless,
    )
    .await?;
    let page = DriverPage::new(client);

    let result = ScenarioRunner::new(&page, config).quiet(quiet).run().await;

    if let Err(e) = page.close().await {
        tracing::warn!("Failed to close browser session: {}", e);
    }
    Ok(result)
}

/// Last `n` lines of `content`
fn tail(content: &str, n: usize) -> impl Iterator<Item = &str> {
    let lines: Vec<&str> = content.lines().collect();
    let skip = lines.len().saturating_sub(n);
    lines.into_iter().skip(skip)
}
