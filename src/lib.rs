pub mod apply;
pub mod config;
pub mod constants;
pub mod dhcp;
pub mod error;
mod fs;
pub mod ipv4ll;
pub mod logger;
pub mod matcher;
pub mod netlink;
pub mod process;
pub mod script;
pub mod stack;
