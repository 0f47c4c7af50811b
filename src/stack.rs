use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use anyhow::Result;

use crate::error::NetconfError;

/// A network link as reported by the OS at the time of the inventory read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Link {
    pub name: String,
    pub index: u32,
    pub mac: Vec<u8>,
    pub up: bool,
}

/// An IP address with its prefix length, e.g. `10.0.0.5/24`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressCidr {
    pub address: IpAddr,
    pub prefix_len: u8,
}

impl FromStr for AddressCidr {
    type Err = NetconfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || NetconfError::InvalidCidr(s.to_string());
        let (address, prefix_len) = s.split_once('/').ok_or_else(invalid)?;
        let address: IpAddr = address.parse().map_err(|_| invalid())?;
        let prefix_len: u8 = prefix_len.parse().map_err(|_| invalid())?;
        let max = match address {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if prefix_len > max {
            return Err(invalid());
        }
        Ok(Self {
            address,
            prefix_len,
        })
    }
}

impl fmt::Display for AddressCidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

/// The OS network primitives the configuration engine needs. Every call
/// blocks until the kernel has answered.
pub trait NetworkStack {
    fn links(&self) -> Result<Vec<Link>>;

    fn add_bridge(&self, name: &str) -> Result<()>;

    fn addresses(&self, link: &Link) -> Result<Vec<AddressCidr>>;

    fn add_address(&self, link: &Link, address: &AddressCidr) -> Result<()>;

    fn set_mtu(&self, link: &Link, mtu: u32) -> Result<()>;

    fn set_up(&self, link: &Link) -> Result<()>;

    fn add_default_route(&self, link: &Link, gateway: IpAddr) -> Result<()>;

    /// Whether `address` is currently known in the neighbour table of `link`.
    fn neighbour_present(&self, link: &Link, address: IpAddr) -> Result<bool>;
}

// Accepts 6, 8 or 20 octets written as hex pairs separated by ':' or '-',
// or as groups of four hex digits separated by '.'.
pub fn parse_mac(s: &str) -> Result<Vec<u8>, NetconfError> {
    let invalid = || NetconfError::InvalidMac(s.to_string());
    let bytes = s.as_bytes();
    let (sep, group_len) = match (bytes.get(2), bytes.get(4)) {
        (Some(b':'), _) => (':', 2),
        (Some(b'-'), _) => ('-', 2),
        (_, Some(b'.')) => ('.', 4),
        _ => return Err(invalid()),
    };

    let mut octets = Vec::new();
    for group in s.split(sep) {
        if group.len() != group_len || !group.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        for i in (0..group_len).step_by(2) {
            octets.push(u8::from_str_radix(&group[i..i + 2], 16).map_err(|_| invalid())?);
        }
    }
    if !matches!(octets.len(), 6 | 8 | 20) {
        return Err(invalid());
    }
    Ok(octets)
}

pub fn mac_to_string(mac: &[u8]) -> String {
    mac.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
pub(crate) mod fake {
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::net::IpAddr;

    use anyhow::{Result, anyhow};

    use super::{AddressCidr, Link, NetworkStack};

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub(crate) enum Call {
        AddBridge(String),
        AddAddress(String, AddressCidr),
        SetMtu(String, u32),
        SetUp(String),
        AddDefaultRoute(String, IpAddr),
    }

    /// In-memory stand-in for the kernel. Operations named in `failing`
    /// as `"<op>:<link>"` return an error instead of being recorded.
    #[derive(Default)]
    pub(crate) struct FakeStack {
        pub(crate) links: RefCell<Vec<Link>>,
        pub(crate) addresses: RefCell<Vec<(String, AddressCidr)>>,
        pub(crate) neighbours: RefCell<Vec<(String, IpAddr)>>,
        pub(crate) all_neighbours_present: bool,
        pub(crate) failing: HashSet<String>,
        pub(crate) calls: RefCell<Vec<Call>>,
    }

    impl FakeStack {
        pub(crate) fn with_links(names: &[&str]) -> Self {
            let stack = Self::default();
            for name in names {
                stack.push_link(name, &[]);
            }
            stack
        }

        pub(crate) fn push_link(&self, name: &str, mac: &[u8]) {
            let mut links = self.links.borrow_mut();
            let index = links.len() as u32 + 1;
            links.push(Link {
                name: name.to_string(),
                index,
                mac: mac.to_vec(),
                up: false,
            });
        }

        pub(crate) fn fail(mut self, op: &str, link: &str) -> Self {
            self.failing.insert(format!("{}:{}", op, link));
            self
        }

        pub(crate) fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        pub(crate) fn calls_for(&self, name: &str) -> Vec<Call> {
            self.calls()
                .into_iter()
                .filter(|call| match call {
                    Call::AddBridge(n)
                    | Call::AddAddress(n, _)
                    | Call::SetMtu(n, _)
                    | Call::SetUp(n)
                    | Call::AddDefaultRoute(n, _) => n == name,
                })
                .collect()
        }

        fn check(&self, op: &str, link: &str) -> Result<()> {
            if self.failing.contains(&format!("{}:{}", op, link)) {
                return Err(anyhow!("{} failed on {}", op, link));
            }
            Ok(())
        }
    }

    impl NetworkStack for FakeStack {
        fn links(&self) -> Result<Vec<Link>> {
            self.check("links", "*")?;
            Ok(self.links.borrow().clone())
        }

        fn add_bridge(&self, name: &str) -> Result<()> {
            self.check("add_bridge", name)?;
            if self.links.borrow().iter().any(|l| l.name == name) {
                return Err(anyhow!("link {} already exists", name));
            }
            self.push_link(name, &[0x02, 0, 0, 0, 0, 0x01]);
            self.calls
                .borrow_mut()
                .push(Call::AddBridge(name.to_string()));
            Ok(())
        }

        fn addresses(&self, link: &Link) -> Result<Vec<AddressCidr>> {
            self.check("addresses", &link.name)?;
            Ok(self
                .addresses
                .borrow()
                .iter()
                .filter(|(name, _)| *name == link.name)
                .map(|(_, a)| *a)
                .collect())
        }

        fn add_address(&self, link: &Link, address: &AddressCidr) -> Result<()> {
            self.check("add_address", &link.name)?;
            self.addresses
                .borrow_mut()
                .push((link.name.clone(), *address));
            self.calls
                .borrow_mut()
                .push(Call::AddAddress(link.name.clone(), *address));
            Ok(())
        }

        fn set_mtu(&self, link: &Link, mtu: u32) -> Result<()> {
            self.check("set_mtu", &link.name)?;
            self.calls
                .borrow_mut()
                .push(Call::SetMtu(link.name.clone(), mtu));
            Ok(())
        }

        fn set_up(&self, link: &Link) -> Result<()> {
            self.check("set_up", &link.name)?;
            self.calls.borrow_mut().push(Call::SetUp(link.name.clone()));
            Ok(())
        }

        fn add_default_route(&self, link: &Link, gateway: IpAddr) -> Result<()> {
            self.check("add_default_route", &link.name)?;
            self.calls
                .borrow_mut()
                .push(Call::AddDefaultRoute(link.name.clone(), gateway));
            Ok(())
        }

        fn neighbour_present(&self, link: &Link, address: IpAddr) -> Result<bool> {
            self.check("neighbour_present", &link.name)?;
            Ok(self.all_neighbours_present
                || self
                    .neighbours
                    .borrow()
                    .iter()
                    .any(|(name, a)| *name == link.name && *a == address))
        }
    }
}
