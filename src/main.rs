use clap::Parser;
use tracing::error;

use tunswitch::cli::Cli;
use tunswitch::config::AppConfig;
use tunswitch::{handlers, logging};

fn main() {
    let cli = Cli::parse();
    logging::init_terminal(cli.verbose);

    let config = AppConfig::load();

    let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
    if let Err(e) = rt.block_on(handlers::run(cli.command, config)) {
        error!(error = %e, "command_failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
