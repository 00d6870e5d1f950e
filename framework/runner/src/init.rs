use crate::cli::InfraTunnelCli;
use clap::Parser;

/// Initialise the CLI and logging for the Infra Tunnel runner.
pub fn init() -> InfraTunnelCli {
    env_logger::init();

    InfraTunnelCli::parse()
}
