use thiserror::Error;

/// Failures that callers need to tell apart from generic I/O or netlink
/// errors. They travel inside `anyhow::Error` and are recovered with
/// `downcast_ref`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NetconfError {
    #[error("invalid address {0}")]
    InvalidAddress(String),
    #[error("invalid CIDR address {0}")]
    InvalidCidr(String),
    #[error("invalid hardware address {0}")]
    InvalidMac(String),
    #[error("no free link-local address found for {0}")]
    NoLinkLocalAddress(String),
}
