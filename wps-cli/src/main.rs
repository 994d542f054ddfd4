//! WPS CLI - Command line tool for water network pressure monitoring.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "wps-cli",
    version,
    about = "Water network pressure semaphore and operation reports"
)]
struct Cli {
    #[command(subcommand)]
    command: wps_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("[WPS] cli: starting");
    wps_cmd::run(cli.command)
}
