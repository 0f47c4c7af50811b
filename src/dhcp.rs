use std::path::Path;

use log::{error, info};

use crate::constants::{DHCP_CLIENT, DHCP_CLIENT_FLAGS};
use crate::process::ProcessRunner;

fn dhcp_client_args(links: &[String]) -> Vec<String> {
    DHCP_CLIENT_FLAGS
        .iter()
        .map(|flag| flag.to_string())
        .chain(links.iter().cloned())
        .collect()
}

/// Hand every link in `links` to the DHCP client in a single invocation.
/// The client's failures are logged, never returned.
pub fn run_dhcp_client<R: ProcessRunner>(runner: &R, links: &[String]) {
    if links.is_empty() {
        return;
    }

    info!("Running DHCP on {}", links.join(" "));
    match runner.run(Path::new(DHCP_CLIENT), &dhcp_client_args(links)) {
        Ok(status) if status.success() => {}
        Ok(status) => error!("{} failed: {}", DHCP_CLIENT, status),
        Err(e) => error!("{:#}", e),
    }
}
