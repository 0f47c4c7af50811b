pub const DIR_CONF: &str = "/var/lib/netconf";

pub const FILE_NETWORK_SCRIPT: &str = "/var/lib/netconf/network.sh";

pub const DHCP_CLIENT: &str = "dhcpcd";
pub const DHCP_CLIENT_FLAGS: [&str; 3] = ["-MA4", "-e", "force_hostname=true"];

pub const MAC_MATCH_PREFIX: &str = "mac=";

pub const LINK_LOCAL_PREFIX_LEN: u8 = 16;
pub const LINK_LOCAL_ATTEMPTS: usize = 10;
