//! Builds the frames the CLI sends

use color_eyre::eyre::{Result, eyre};
use pnet::{
    packet::{MutablePacket, arp, ethernet},
    util::MacAddr,
};
use std::net::Ipv4Addr;

const PKT_ETH_SIZE: usize = ethernet::EthernetPacket::minimum_packet_size();
const PKT_ARP_SIZE: usize = arp::ArpPacket::minimum_packet_size();

/// Size of an ARP request frame: ethernet header plus ARP payload
pub const ARP_FRAME_SIZE: usize = PKT_ETH_SIZE + PKT_ARP_SIZE;

/// Size of the minimal probe frame: a bare ethernet header
pub const PROBE_FRAME_SIZE: usize = PKT_ETH_SIZE;

/// Builds a broadcast ARP who-has request for `target_ipv4`
pub fn arp_request(
    source_ipv4: Ipv4Addr,
    source_mac: MacAddr,
    target_ipv4: Ipv4Addr,
) -> Result<[u8; ARP_FRAME_SIZE]> {
    let mut pkt_buf = [0u8; ARP_FRAME_SIZE];
    let mut arp_buf = [0u8; PKT_ARP_SIZE];

    let mut pkt_eth = ethernet::MutableEthernetPacket::new(&mut pkt_buf)
        .ok_or_else(|| eyre!("failed to generate ethernet packet"))?;

    let mut pkt_arp = arp::MutableArpPacket::new(&mut arp_buf)
        .ok_or_else(|| eyre!("failed to generate arp packet"))?;

    pkt_eth.set_destination(MacAddr::broadcast());
    pkt_eth.set_source(source_mac);
    pkt_eth.set_ethertype(ethernet::EtherTypes::Arp);

    pkt_arp.set_hardware_type(arp::ArpHardwareTypes::Ethernet);
    pkt_arp.set_protocol_type(ethernet::EtherTypes::Ipv4);
    pkt_arp.set_hw_addr_len(6);
    pkt_arp.set_proto_addr_len(4);
    pkt_arp.set_operation(arp::ArpOperations::Request);
    pkt_arp.set_sender_hw_addr(source_mac);
    pkt_arp.set_sender_proto_addr(source_ipv4);
    pkt_arp.set_target_hw_addr(MacAddr::zero());
    pkt_arp.set_target_proto_addr(target_ipv4);

    pkt_eth.set_payload(pkt_arp.packet_mut());

    Ok(pkt_buf)
}

/// Builds the minimal probe: zeroed addresses and an IPv4 ethertype with no
/// payload
pub fn minimal_probe() -> Result<[u8; PROBE_FRAME_SIZE]> {
    let mut pkt_buf = [0u8; PROBE_FRAME_SIZE];

    let mut pkt_eth = ethernet::MutableEthernetPacket::new(&mut pkt_buf)
        .ok_or_else(|| eyre!("failed to generate ethernet packet"))?;

    pkt_eth.set_destination(MacAddr::zero());
    pkt_eth.set_source(MacAddr::zero());
    pkt_eth.set_ethertype(ethernet::EtherTypes::Ipv4);

    Ok(pkt_buf)
}

/// Renders frame bytes as space separated hex pairs
pub fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
#[path = "./probe_tests.rs"]
mod tests;
