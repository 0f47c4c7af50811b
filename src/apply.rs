use std::net::IpAddr;

use anyhow::{Context, Error, Result};
use log::{debug, error, info};

use crate::config::{InterfaceConfig, NetworkConfig};
use crate::dhcp::run_dhcp_client;
use crate::error::NetconfError;
use crate::ipv4ll::assign_link_local;
use crate::matcher::resolve;
use crate::process::ProcessRunner;
use crate::script::{ScriptLocation, run_script};
use crate::stack::{AddressCidr, Link, NetworkStack};

/// Apply `config` to every link the stack reports.
///
/// The script, bridge creation and DHCP client are best effort. Each link is
/// configured independently; the first link that fails to configure is
/// returned as the error once all links and DHCP have been handled.
pub fn apply_network_config<S: NetworkStack, R: ProcessRunner>(
    config: &NetworkConfig,
    stack: &S,
    runner: &R,
    script_location: &ScriptLocation,
) -> Result<()> {
    debug!("Config: {:?}", config);

    if let Some(script) = config.script()
        && let Err(e) = run_script(script, script_location, runner)
    {
        error!("Failed to run network script: {:#}", e);
    }

    create_bridges(config, stack);

    let links = stack.links().context("unable to list network links")?;
    let mut dhcp_links = Vec::new();
    let mut first_error: Option<Error> = None;

    for link in &links {
        let Some((key, conf)) = resolve(link, &config.interfaces) else {
            continue;
        };
        debug!(
            "Link {} (up: {}) matched interface {}",
            link.name, link.up, key
        );

        if conf.dhcp {
            dhcp_links.push(link.name.clone());
        } else if let Err(e) = configure_link(stack, link, conf) {
            error!("Failed to apply settings to {}: {:#}", link.name, e);
            if first_error.is_none() {
                first_error = Some(e.context(format!("unable to configure {}", link.name)));
            }
        }
    }

    run_dhcp_client(runner, &dhcp_links);

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Create a bridge for every entry that asks for one. Failures, most often
/// a bridge left over from an earlier run, are only logged.
pub fn create_bridges<S: NetworkStack>(config: &NetworkConfig, stack: &S) {
    for (name, _) in config.interfaces.iter().filter(|(_, conf)| conf.bridge) {
        match stack.add_bridge(name) {
            Ok(()) => info!("Created bridge {}", name),
            Err(e) => error!("Failed to create bridge {}: {:#}", name, e),
        }
    }
}

/// Apply the static settings of `conf` to `link`.
pub fn configure_link<S: NetworkStack>(
    stack: &S,
    link: &Link,
    conf: &InterfaceConfig,
) -> Result<()> {
    if conf.ipv4ll {
        assign_link_local(stack, link).context("IPv4LL set failed")?;
    } else if let Some(address) = conf.address() {
        let cidr: AddressCidr = address.parse()?;
        match stack.add_address(link, &cidr) {
            Ok(()) => info!("Set {} on {}", cidr, link.name),
            // Usually the address is already present from an earlier run.
            Err(e) => error!("Failed to add {} to {}: {:#}", cidr, link.name, e),
        }
    }

    if let Some(mtu) = conf.mtu() {
        stack
            .set_mtu(link, mtu)
            .context(format!("unable to set MTU {}", mtu))?;
    }

    stack.set_up(link).context("unable to set link up")?;

    if let Some(gateway) = conf.gateway() {
        let gateway_ip: IpAddr = gateway
            .parse()
            .map_err(|_| NetconfError::InvalidAddress(gateway.to_string()))?;
        stack
            .add_default_route(link, gateway_ip)
            .context(format!("unable to set default gateway {}", gateway))?;
        info!("Set default gateway {}", gateway);
    }

    Ok(())
}
