//! Per-protocol translation steps.
//!
//! [`ip`] rewrites network-layer headers, while [`tcp`] and [`udp`] compute the transport checksum
//! that matches the new header. None of these functions touch the packet buffer; the dispatcher
//! applies their results once everything has been validated.

use pnet::packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols};

use crate::error::{Result, Unsupported};

pub mod fragment;
pub mod ip;
pub mod tcp;
pub mod udp;

/// Length of an IPv4 header without options
pub const IPV4_HEADER_LEN: usize = 20;

/// Length of the fixed IPv6 header
pub const IPV6_HEADER_LEN: usize = 40;

/// Length of the IPv6 Fragment extension header
pub const FRAGMENT_HEADER_LEN: usize = 8;

/// The most a packet can grow by during translation (IPv4 to IPv6 with a Fragment header)
pub const MAX_HEADER_GROWTH: usize = FRAGMENT_HEADER_LEN + IPV6_HEADER_LEN - IPV4_HEADER_LEN;

/// What the transport checksum step needs to know about a packet's upper-layer data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportInfo {
    /// The upper-layer protocol
    pub protocol: IpNextHeaderProtocol,
    /// Number of upper-layer bytes carried by this packet
    pub len: usize,
    /// Pseudo-header sum under the original network header
    pub old_pseudo_sum: u32,
    /// Pseudo-header sum under the translated network header
    pub new_pseudo_sum: u32,
    /// Whether this packet starts with the transport header (it is not a trailing fragment)
    pub has_header: bool,
    /// Whether the whole datagram is carried by this packet
    pub complete: bool,
}

/// Rejects upper-layer protocols other than TCP and UDP
pub(crate) fn ensure_supported(protocol: IpNextHeaderProtocol) -> Result<()> {
    match protocol {
        IpNextHeaderProtocols::Tcp | IpNextHeaderProtocols::Udp => Ok(()),
        other => Err(Unsupported::Protocol(other.0).into()),
    }
}

/// Computes the checksum `segment` must carry after translation.
///
/// Returns `None` for trailing fragments, which have no transport header to fix.
pub fn transport_checksum(segment: &[u8], transport: &TransportInfo) -> Result<Option<u16>> {
    if !transport.has_header {
        return Ok(None);
    }

    match transport.protocol {
        IpNextHeaderProtocols::Tcp => tcp::tcp_translate(
            segment,
            transport.old_pseudo_sum,
            transport.new_pseudo_sum,
        )
        .map(Some),
        IpNextHeaderProtocols::Udp => udp::udp_translate(
            segment,
            transport.old_pseudo_sum,
            transport.new_pseudo_sum,
            transport.complete,
        )
        .map(Some),
        other => Err(Unsupported::Protocol(other.0).into()),
    }
}

/// Stores a checksum produced by [`transport_checksum`] in its segment
pub fn write_transport_checksum(
    segment: &mut [u8],
    protocol: IpNextHeaderProtocol,
    checksum: u16,
) {
    match protocol {
        IpNextHeaderProtocols::Tcp => tcp::write_tcp_checksum(segment, checksum),
        IpNextHeaderProtocols::Udp => udp::write_udp_checksum(segment, checksum),
        _ => {}
    }
}
