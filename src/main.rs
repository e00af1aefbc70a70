//! dashboard-e2e - end-to-end browser scenario for the dashboard
//!
//! Logs in, connects GitHub, launches an example app and cleans up its
//! token, asserting UI state at every step over WebDriver.

use clap::Parser;
use dashboard_e2e::common::logging;
use dashboard_e2e::{cli, commands};
use commands::Commands;

#[derive(Parser)]
#[command(name = "dashboard-e2e", about = "End-to-end dashboard scenario runner")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // The run log guard must outlive the run so buffered lines are flushed
    let log_guard = match &cli.command {
        Commands::Run(args) => logging::init_run(args.verbose).map(|(path, guard)| {
            tracing::debug!("Run log at {}", path.display());
            guard
        }),
        _ => {
            logging::init_cli(false);
            None
        }
    };

    let result = cli::dispatch(cli.command).await;
    drop(log_guard);

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
