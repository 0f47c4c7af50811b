use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Result, anyhow};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    pub script: Option<String>,
    pub interfaces: Interfaces,
}

impl NetworkConfig {
    pub fn from_yaml(value: &str) -> Result<Self> {
        if value.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml2::from_str::<NetworkConfig>(value).map_err(|e| anyhow!("{}", e))
    }

    pub fn script(&self) -> Option<&str> {
        non_empty(&self.script)
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct InterfaceConfig {
    #[serde(rename = "match")]
    pub match_: String,
    pub bridge: bool,
    pub dhcp: bool,
    pub address: Option<String>,
    pub gateway: Option<String>,
    pub mtu: Option<u32>,
    pub ipv4ll: bool,
}

impl InterfaceConfig {
    /// The string links are matched against: `match`, or the entry's key
    /// when `match` is empty.
    pub fn effective_match<'a>(&'a self, key: &'a str) -> &'a str {
        if self.match_.is_empty() {
            key
        } else {
            &self.match_
        }
    }

    pub fn address(&self) -> Option<&str> {
        non_empty(&self.address)
    }

    pub fn gateway(&self) -> Option<&str> {
        non_empty(&self.gateway)
    }

    pub fn mtu(&self) -> Option<u32> {
        self.mtu.filter(|mtu| *mtu > 0)
    }
}

/// Interface entries in the order they were declared in the document.
/// The order decides which of several matching glob patterns wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Interfaces(Vec<(String, InterfaceConfig)>);

impl Interfaces {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &InterfaceConfig)> {
        self.0.iter().map(|(key, conf)| (key.as_str(), conf))
    }
}

impl<K: Into<String>> FromIterator<(K, InterfaceConfig)> for Interfaces {
    fn from_iter<T: IntoIterator<Item = (K, InterfaceConfig)>>(iter: T) -> Self {
        let mut interfaces = Interfaces::default();
        for (key, conf) in iter {
            interfaces.insert(key.into(), conf);
        }
        interfaces
    }
}

impl Interfaces {
    // A repeated key replaces the earlier entry but keeps its position.
    fn insert(&mut self, key: String, conf: InterfaceConfig) {
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = conf,
            None => self.0.push((key, conf)),
        }
    }
}

impl<'de> Deserialize<'de> for Interfaces {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct InterfacesVisitor;

        impl<'de> Visitor<'de> for InterfacesVisitor {
            type Value = Interfaces;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of interface names to interface settings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut interfaces = Interfaces::default();
                while let Some((key, conf)) = map.next_entry::<String, InterfaceConfig>()? {
                    interfaces.insert(key, conf);
                }
                Ok(interfaces)
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(Interfaces::default())
            }

            fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(Interfaces::default())
            }
        }

        deserializer.deserialize_map(InterfacesVisitor)
    }
}

/// Read the whole configuration document from `path`, or from standard
/// input when no path is given.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    let mut content = String::new();
    match path {
        Some(p) => {
            File::open(p)
                .and_then(|mut f| f.read_to_string(&mut content))
                .map_err(|e| anyhow!("unable to read {:?}: {}", p, e))?;
        }
        None => {
            io::stdin()
                .read_to_string(&mut content)
                .map_err(|e| anyhow!("unable to read standard input: {}", e))?;
        }
    }
    Ok(content)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
