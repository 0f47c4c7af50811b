use glob::Pattern;
use log::{debug, warn};

use crate::config::{InterfaceConfig, Interfaces};
use crate::constants::MAC_MATCH_PREFIX;
use crate::stack::{Link, mac_to_string, parse_mac};

/// Shell-style glob match of a link name. A run of `*` means the same as a
/// single `*`. A pattern that does not compile matches nothing.
pub fn matches(link_name: &str, pattern: &str) -> bool {
    let mut collapsed = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if c == '*' && collapsed.ends_with('*') {
            continue;
        }
        collapsed.push(c);
    }
    Pattern::new(&collapsed).is_ok_and(|p| p.matches(link_name))
}

// Returns the address part of a "mac=..." specifier, if it is one.
fn mac_specifier(spec: &str) -> Option<&str> {
    let prefix = spec.get(..MAC_MATCH_PREFIX.len())?;
    if prefix.eq_ignore_ascii_case(MAC_MATCH_PREFIX) {
        Some(&spec[MAC_MATCH_PREFIX.len()..])
    } else {
        None
    }
}

/// Select the entry that governs `link`, if any.
///
/// A hardware address match wins outright and ends the scan. An exact name
/// match replaces whatever was selected before it. A glob match is only taken
/// while nothing is selected, so among several glob matches the first one
/// declared wins.
pub fn resolve<'a>(
    link: &Link,
    interfaces: &'a Interfaces,
) -> Option<(&'a str, &'a InterfaceConfig)> {
    let mut selected = None;

    for (key, conf) in interfaces.iter() {
        let spec = conf.effective_match(key);
        if spec.is_empty() {
            continue;
        }

        if let Some(mac) = mac_specifier(spec) {
            match parse_mac(mac) {
                Ok(mac) if !link.mac.is_empty() && mac == link.mac => {
                    debug!(
                        "Link {} matched interface {} by hardware address {}",
                        link.name,
                        key,
                        mac_to_string(&link.mac)
                    );
                    return Some((key, conf));
                }
                Ok(_) => {}
                Err(e) => warn!("Ignoring interface {}: {}", key, e),
            }
            continue;
        }

        if spec == link.name {
            selected = Some((key, conf));
        } else if selected.is_none() && matches(&link.name, spec) {
            selected = Some((key, conf));
        }
    }

    selected
}
