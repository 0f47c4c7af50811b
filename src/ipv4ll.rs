use std::net::{IpAddr, Ipv4Addr};

use anyhow::Result;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::constants::{LINK_LOCAL_ATTEMPTS, LINK_LOCAL_PREFIX_LEN};
use crate::error::NetconfError;
use crate::stack::{AddressCidr, Link, NetworkStack};

fn is_link_local(address: &IpAddr) -> bool {
    matches!(address, IpAddr::V4(v4) if v4.is_link_local())
}

// The same hardware address yields the same sequence of candidates, so a
// host tends to get the same address across boots.
fn seed_from_mac(mac: &[u8]) -> u64 {
    mac.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
}

// 169.254.0.0/24 and 169.254.255.0/24 are reserved.
fn candidate(random: u32) -> Option<Ipv4Addr> {
    let third = (random & 0xff) as u8;
    let fourth = (random >> 24) as u8;
    if third == 0 || third == 255 {
        return None;
    }
    Some(Ipv4Addr::new(169, 254, third, fourth))
}

/// Give `link` an IPv4 link-local address unless it already has one.
///
/// A candidate counts as taken only when it is already in the link's
/// neighbour table. No ARP probe is sent, so a host this machine has not
/// yet talked to can still hold the chosen address.
pub fn assign_link_local<S: NetworkStack>(stack: &S, link: &Link) -> Result<()> {
    if stack.addresses(link)?.iter().any(|a| is_link_local(&a.address)) {
        info!("Link-local address already set on {}", link.name);
        return Ok(());
    }

    let mut rng = StdRng::seed_from_u64(seed_from_mac(&link.mac));
    let mut attempts = 0;
    while attempts < LINK_LOCAL_ATTEMPTS {
        let Some(address) = candidate(rng.random::<u32>()) else {
            continue;
        };
        attempts += 1;

        if stack.neighbour_present(link, IpAddr::V4(address))? {
            debug!("Link-local candidate {} is in use on {}", address, link.name);
            continue;
        }

        let cidr = AddressCidr {
            address: IpAddr::V4(address),
            prefix_len: LINK_LOCAL_PREFIX_LEN,
        };
        stack.add_address(link, &cidr)?;
        info!("Set link-local address {} on {}", cidr, link.name);
        return Ok(());
    }

    Err(NetconfError::NoLinkLocalAddress(link.name.clone()).into())
}
