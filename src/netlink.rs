use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::pin::pin;

use anyhow::{Context, Result, anyhow};
use futures::{Stream, StreamExt, TryStreamExt};
use log::debug;
use netlink_packet_route::address::{AddressAttribute, AddressMessage};
use netlink_packet_route::link::{LinkAttribute, LinkFlags, LinkMessage};
use netlink_packet_route::neighbour::{NeighbourAddress, NeighbourAttribute};
use netlink_packet_route::route::RouteScope;
use rtnetlink::{
    Error as NlError, Handle as NlHandle, LinkBridge, LinkUnspec, RouteMessageBuilder,
    new_connection,
};
use tokio::runtime::{Builder, Runtime};

use crate::stack::{AddressCidr, Link, NetworkStack};

/// `NetworkStack` backed by rtnetlink. The netlink connection runs on a
/// private current-thread runtime that is only driven while a request is
/// blocked on, so callers stay synchronous.
pub struct NetlinkStack {
    rt: Runtime,
    handle: NlHandle,
}

impl NetlinkStack {
    pub fn new() -> Result<Self> {
        let rt = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("unable to start netlink runtime")?;
        let (connection, handle, _) = {
            let _guard = rt.enter();
            new_connection().map_err(|e| anyhow!("unable to create netlink socket: {}", e))?
        };
        rt.spawn(connection);
        Ok(Self { rt, handle })
    }

    fn link_stream(&self) -> impl Stream<Item = Result<LinkMessage, NlError>> {
        self.handle.link().get().execute()
    }

    fn address_stream(
        &self,
        ifindex: u32,
    ) -> impl Stream<Item = Result<AddressMessage, NlError>> {
        self.handle
            .address()
            .get()
            .set_link_index_filter(ifindex)
            .execute()
    }

    async fn link_set(&self, message: LinkMessage) -> Result<()> {
        let err = format!("failed to set link attributes: {:?}", &message);
        self.handle.link().set(message).execute().await.context(err)
    }
}

impl NetworkStack for NetlinkStack {
    fn links(&self) -> Result<Vec<Link>> {
        self.rt.block_on(async {
            let mut links = Vec::new();
            let mut stream = self.link_stream();
            while let Some(link_res) = stream.next().await {
                links.push(extract_link(link_res?));
            }
            Ok(links)
        })
    }

    fn add_bridge(&self, name: &str) -> Result<()> {
        self.rt.block_on(async {
            self.handle
                .link()
                .add(LinkBridge::new(name).build())
                .execute()
                .await
                .context(format!("unable to add bridge {}", name))
        })
    }

    fn addresses(&self, link: &Link) -> Result<Vec<AddressCidr>> {
        self.rt.block_on(async {
            let mut addresses = Vec::new();
            let mut stream = self.address_stream(link.index);
            while let Some(addr_res) = stream.next().await {
                let msg = addr_res?;
                if msg.header.index != link.index {
                    continue;
                }
                for attr in &msg.attributes {
                    if let AddressAttribute::Address(ip) = attr {
                        addresses.push(AddressCidr {
                            address: *ip,
                            prefix_len: msg.header.prefix_len,
                        });
                    }
                }
            }
            Ok(addresses)
        })
    }

    fn add_address(&self, link: &Link, address: &AddressCidr) -> Result<()> {
        self.rt.block_on(async {
            self.handle
                .address()
                .add(link.index, address.address, address.prefix_len)
                .execute()
                .await
                .context(format!("unable to add address {}", address))
        })
    }

    fn set_mtu(&self, link: &Link, mtu: u32) -> Result<()> {
        self.rt.block_on(
            self.link_set(LinkUnspec::new_with_index(link.index).mtu(mtu).build()),
        )
    }

    fn set_up(&self, link: &Link) -> Result<()> {
        self.rt
            .block_on(self.link_set(LinkUnspec::new_with_index(link.index).up().build()))
    }

    fn add_default_route(&self, link: &Link, gateway: IpAddr) -> Result<()> {
        let msg = match gateway {
            IpAddr::V4(g) => RouteMessageBuilder::<Ipv4Addr>::default()
                .output_interface(link.index)
                .scope(RouteScope::Universe)
                .gateway(g)
                .build(),
            IpAddr::V6(g) => RouteMessageBuilder::<Ipv6Addr>::default()
                .output_interface(link.index)
                .scope(RouteScope::Universe)
                .gateway(g)
                .build(),
        };
        self.rt.block_on(async {
            self.handle
                .route()
                .add(msg)
                .execute()
                .await
                .context("failed to add default route")
        })
    }

    fn neighbour_present(&self, link: &Link, address: IpAddr) -> Result<bool> {
        self.rt.block_on(async {
            let mut stream = pin!(self.handle.neighbours().get().execute());
            while let Some(msg) = stream.try_next().await? {
                if msg.header.ifindex != link.index {
                    continue;
                }
                let found = msg.attributes.iter().any(|attr| match attr {
                    NeighbourAttribute::Destination(NeighbourAddress::Inet(a)) => {
                        IpAddr::V4(*a) == address
                    }
                    NeighbourAttribute::Destination(NeighbourAddress::Inet6(a)) => {
                        IpAddr::V6(*a) == address
                    }
                    _ => false,
                });
                if found {
                    debug!("Found neighbour {} on {}", address, link.name);
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }
}

fn extract_link(link: LinkMessage) -> Link {
    let mut name = String::new();
    let mut mac = Vec::new();

    for nla in &link.attributes {
        match nla {
            LinkAttribute::IfName(n) => name = n.clone(),
            LinkAttribute::Address(addr) => mac = addr.clone(),
            _ => {}
        }
    }

    Link {
        name,
        index: link.header.index,
        mac,
        up: link.header.flags.contains(LinkFlags::Up),
    }
}
