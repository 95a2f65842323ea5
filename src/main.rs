use std::process::ExitCode;

use boost_test_lister::config;
use boost_test_lister::runner::{self, Cli};
use clap::Parser;
use tracing::Level;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // The document may go to stdout, so logs stay on stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let project_root = std::env::current_dir().ok();
    let settings = config::resolve(project_root.as_deref());
    let config = cli.into_run_config(settings);

    match runner::list_tests(&config).await {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            tracing::error!("Failed to write listing: {}", e);
            eprintln!("{}", e);
            ExitCode::from(2)
        }
    }
}
