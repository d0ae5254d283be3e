//! Resolves named network interfaces into the details raw sockets bind to

use pnet::{datalink::NetworkInterface as PNetNetworkInterface, util::MacAddr};
use std::net::{IpAddr, Ipv4Addr};

use crate::error::{FrameIoError, Result};

/// Data structure representing a network interface on the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    /// Name of the interface, i.e. eth0, en0, \Device\NPF_{...}
    pub name: String,
    /// Human readable description, populated on Windows only
    pub description: String,
    /// Numeric OS index of the interface
    pub index: u32,
    /// Hardware address, `None` for interfaces without one (tun, ppp)
    pub mac: Option<MacAddr>,
    /// Raw interface flags as reported by the OS
    pub flags: u32,
    /// Whether the interface is up
    pub is_up: bool,
    /// Whether the interface is a loopback interface
    pub is_loopback: bool,
    /// First IPv4 address assigned to the interface, if any
    pub ipv4: Option<Ipv4Addr>,
}

impl From<PNetNetworkInterface> for NetworkInterface {
    fn from(value: PNetNetworkInterface) -> Self {
        Self {
            is_up: value.is_up(),
            is_loopback: value.is_loopback(),
            ipv4: value.ips.iter().find_map(|net| match net.ip() {
                IpAddr::V4(ip) => Some(ip),
                IpAddr::V6(_) => None,
            }),
            mac: value.mac,
            name: value.name,
            description: value.description,
            index: value.index,
            flags: value.flags,
        }
    }
}

impl NetworkInterface {
    /// Returns the hardware address as raw bytes, if the interface has one
    pub fn mac_octets(&self) -> Option<[u8; 6]> {
        self.mac
            .map(|MacAddr(a, b, c, d, e, f)| [a, b, c, d, e, f])
    }
}

/// Returns every network interface on the host
pub fn list_interfaces() -> Vec<NetworkInterface> {
    pnet::datalink::interfaces()
        .into_iter()
        .map(NetworkInterface::from)
        .collect()
}

/// Finds a network interface by name
pub fn get_interface(name: &str) -> Result<NetworkInterface> {
    pnet::datalink::interfaces()
        .into_iter()
        .find(|i| i.name == name)
        .map(NetworkInterface::from)
        .ok_or_else(|| FrameIoError::InterfaceNotFound(name.to_string()))
}

/// Finds the default network interface: the first interface that is up,
/// not a loopback, and has an IPv4 address
pub fn get_default_interface() -> Result<NetworkInterface> {
    list_interfaces()
        .into_iter()
        .find(|i| i.is_up && !i.is_loopback && i.ipv4.is_some())
        .ok_or_else(|| {
            FrameIoError::InterfaceNotFound("no default interface".into())
        })
}

#[cfg(test)]
#[path = "./network_tests.rs"]
mod tests;
