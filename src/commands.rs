//! CLI command definitions
//!
//! Defines the clap commands for the dashboard-e2e CLI.

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the dashboard scenario against a live browser
    Run(RunArgs),

    /// Check that a WebDriver server is reachable and ready
    Check {
        /// WebDriver endpoint (default: from config)
        #[arg(long)]
        webdriver_url: Option<String>,
    },

    /// Show the log of the last run
    Logs {
        /// Number of lines to show
        #[arg(long, short = 'n', default_value = "50")]
        lines: usize,

        /// Truncate the log instead of showing it
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Base URL of the dashboard
    #[arg(long, env = "DASHBOARD_URL")]
    pub url: Option<String>,

    /// Dashboard login token
    #[arg(long, env = "DASHBOARD_LOGIN_TOKEN", hide_env_values = true)]
    pub login_token: Option<String>,

    /// GitHub personal access token used for the auth step
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// WebDriver endpoint to connect to
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Browser to drive: chrome or firefox
    #[arg(long)]
    pub browser: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Start the browser's driver from PATH before the run
    #[arg(long)]
    pub spawn_driver: bool,

    /// Stop after the first step with a failing assertion
    #[arg(long)]
    pub fail_fast: bool,

    /// Print the result as JSON instead of the colored report
    #[arg(long)]
    pub json: bool,

    /// Configuration file (default: user config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbose logging on stderr
    #[arg(long, short)]
    pub verbose: bool,
}
