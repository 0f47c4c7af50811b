use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug, error};
use netconf::apply::apply_network_config;
use netconf::config::{NetworkConfig, read_input};
use netconf::logger::init_logger;
use netconf::netlink::NetlinkStack;
use netconf::process::SystemProcessRunner;
use netconf::script::ScriptLocation;

/// Bring up host networking from a YAML network configuration.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Configuration file; read from standard input when omitted.
    config: Option<PathBuf>,

    /// One of off, error, warn, info, debug or trace.
    #[arg(long, env = "NETCONF_LOG_LEVEL", default_value = "debug")]
    log_level: LevelFilter,
}

fn run(args: Args) -> Result<()> {
    let content = read_input(args.config.as_deref())?;
    let config = NetworkConfig::from_yaml(&content)?;
    debug!("Read {} interface entries", config.interfaces.iter().count());

    let stack = NetlinkStack::new()?;
    apply_network_config(
        &config,
        &stack,
        &SystemProcessRunner,
        &ScriptLocation::default(),
    )
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_logger(args.log_level) {
        // Use eprintln! here since there is no logger.
        eprintln!("unable to initialize logger: {}", e);
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
