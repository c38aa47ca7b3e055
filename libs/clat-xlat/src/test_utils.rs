//! Packet fixtures shared by the unit tests

use std::net::{Ipv4Addr, Ipv6Addr};

use clat_map::MappingTable;
use pnet::packet::{
    ip::{IpNextHeaderProtocol, IpNextHeaderProtocols},
    ipv4::{self, Ipv4Flags, MutableIpv4Packet},
    ipv6::MutableIpv6Packet,
    tcp::{self, MutableTcpPacket, TcpPacket},
    udp::{self, MutableUdpPacket, UdpPacket},
};

use crate::protocols::{IPV4_HEADER_LEN, IPV6_HEADER_LEN, MAX_HEADER_GROWTH};

pub const CLIENT_IPV4: Ipv4Addr = Ipv4Addr::new(192, 0, 0, 4);
pub const CLIENT_IPV6: Ipv6Addr = Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 0x464);
pub const REMOTE_IPV4: Ipv4Addr = Ipv4Addr::new(198, 51, 100, 7);
pub const REMOTE_IPV6: Ipv6Addr = Ipv6Addr::new(0x64, 0xff9b, 0, 0, 0, 0, 0xc633, 0x6407);

/// Device 0 is enabled, device 1 is configured but disabled
pub fn test_table() -> MappingTable {
    let mut table = MappingTable::default();
    table.set_plat_prefix(Ipv6Addr::new(0x64, 0xff9b, 0, 0, 0, 0, 0, 0));
    table
        .set_device_mapping(0, CLIENT_IPV6, CLIENT_IPV4, true)
        .unwrap();
    table
        .set_device_mapping(
            1,
            "2001:db8:1::464".parse().unwrap(),
            "192.0.0.5".parse().unwrap(),
            false,
        )
        .unwrap();
    table
}

/// A TCP segment with a zeroed checksum
pub fn tcp_segment(payload: &[u8]) -> Vec<u8> {
    let mut buffer = vec![0u8; TcpPacket::minimum_packet_size() + payload.len()];
    let mut segment = MutableTcpPacket::new(&mut buffer).unwrap();
    segment.set_source(40123);
    segment.set_destination(443);
    segment.set_sequence(0x0102_0304);
    segment.set_data_offset(5);
    segment.set_window(64240);
    segment.set_payload(payload);
    buffer
}

/// A UDP datagram with a zeroed checksum
pub fn udp_datagram(payload: &[u8]) -> Vec<u8> {
    let length = UdpPacket::minimum_packet_size() + payload.len();
    let mut buffer = vec![0u8; length];
    let mut datagram = MutableUdpPacket::new(&mut buffer).unwrap();
    datagram.set_source(5353);
    datagram.set_destination(53);
    datagram.set_length(u16::try_from(length).unwrap());
    datagram.set_payload(payload);
    buffer
}

/// Wraps `transport` in an unfragmented IPv4 header with valid checksums everywhere
pub fn ipv4_packet(
    protocol: IpNextHeaderProtocol,
    source: Ipv4Addr,
    destination: Ipv4Addr,
    transport: &[u8],
) -> Vec<u8> {
    let mut transport = transport.to_vec();
    match protocol {
        IpNextHeaderProtocols::Tcp => {
            let checksum =
                tcp::ipv4_checksum(&TcpPacket::new(&transport).unwrap(), &source, &destination);
            MutableTcpPacket::new(&mut transport)
                .unwrap()
                .set_checksum(checksum);
        }
        IpNextHeaderProtocols::Udp => {
            let checksum =
                udp::ipv4_checksum(&UdpPacket::new(&transport).unwrap(), &source, &destination);
            MutableUdpPacket::new(&mut transport)
                .unwrap()
                .set_checksum(checksum);
        }
        _ => {}
    }
    raw_ipv4_packet(protocol, source, destination, &transport)
}

/// Wraps `transport` in an unfragmented IPv4 header, leaving the transport bytes as they are
pub fn raw_ipv4_packet(
    protocol: IpNextHeaderProtocol,
    source: Ipv4Addr,
    destination: Ipv4Addr,
    transport: &[u8],
) -> Vec<u8> {
    let mut buffer = vec![0u8; IPV4_HEADER_LEN + transport.len()];
    let mut packet = MutableIpv4Packet::new(&mut buffer).unwrap();
    packet.set_version(4);
    packet.set_header_length(5);
    packet.set_dscp(10);
    packet.set_ecn(1);
    packet.set_total_length(u16::try_from(IPV4_HEADER_LEN + transport.len()).unwrap());
    packet.set_identification(0x1234);
    packet.set_flags(Ipv4Flags::DontFragment);
    packet.set_ttl(64);
    packet.set_next_level_protocol(protocol);
    packet.set_source(source);
    packet.set_destination(destination);
    packet.set_payload(transport);
    let checksum = ipv4::checksum(&packet.to_immutable());
    packet.set_checksum(checksum);
    buffer
}

/// Wraps `transport` in an IPv6 header with valid checksums everywhere
pub fn ipv6_packet(
    protocol: IpNextHeaderProtocol,
    source: Ipv6Addr,
    destination: Ipv6Addr,
    transport: &[u8],
) -> Vec<u8> {
    let mut transport = transport.to_vec();
    match protocol {
        IpNextHeaderProtocols::Tcp => {
            let checksum =
                tcp::ipv6_checksum(&TcpPacket::new(&transport).unwrap(), &source, &destination);
            MutableTcpPacket::new(&mut transport)
                .unwrap()
                .set_checksum(checksum);
        }
        IpNextHeaderProtocols::Udp => {
            let checksum =
                udp::ipv6_checksum(&UdpPacket::new(&transport).unwrap(), &source, &destination);
            MutableUdpPacket::new(&mut transport)
                .unwrap()
                .set_checksum(checksum);
        }
        _ => {}
    }
    raw_ipv6_packet(protocol, source, destination, &transport)
}

/// Builds an IPv6 packet around `payload`, which may start with extension headers
pub fn raw_ipv6_packet(
    next_header: IpNextHeaderProtocol,
    source: Ipv6Addr,
    destination: Ipv6Addr,
    payload: &[u8],
) -> Vec<u8> {
    let mut buffer = vec![0u8; IPV6_HEADER_LEN + payload.len()];
    let mut packet = MutableIpv6Packet::new(&mut buffer).unwrap();
    packet.set_version(6);
    packet.set_traffic_class(0x29);
    packet.set_payload_length(u16::try_from(payload.len()).unwrap());
    packet.set_next_header(next_header);
    packet.set_hop_limit(57);
    packet.set_source(source);
    packet.set_destination(destination);
    packet.set_payload(payload);
    buffer
}

/// Copies `packet` behind enough headroom for any translation
pub fn with_headroom(packet: &[u8]) -> Vec<u8> {
    let mut buffer = vec![0u8; MAX_HEADER_GROWTH];
    buffer.extend_from_slice(packet);
    buffer
}
