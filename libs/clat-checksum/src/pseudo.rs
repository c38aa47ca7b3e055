//! Pseudo-header sums for transport checksums.
//!
//! Field order follows the on-wire pseudo-header layout so that sums are reproducible bit-for-bit.

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::sum::checksum_add;

/// Sums an IPv4 pseudo-header as defined in [RFC 768](https://datatracker.ietf.org/doc/html/rfc768)
/// and [RFC 793](https://datatracker.ietf.org/doc/html/rfc793#section-3.1).
///
/// Fields are accumulated as: source, destination, protocol (widened to 16 bits), payload length.
#[must_use]
pub fn ipv4_pseudo_header_sum(
    source: Ipv4Addr,
    destination: Ipv4Addr,
    protocol: u8,
    payload_len: u16,
) -> u32 {
    let mut sum = checksum_add(0, &source.octets());
    sum = checksum_add(sum, &destination.octets());
    sum = checksum_add(sum, &u16::from(protocol).to_be_bytes());
    checksum_add(sum, &payload_len.to_be_bytes())
}

/// Sums an IPv6 pseudo-header as defined in [RFC 2460 Section 8.1](https://datatracker.ietf.org/doc/html/rfc2460#section-8.1).
///
/// Fields are accumulated as: source, destination, 32-bit payload length, 32-bit next header.
#[must_use]
pub fn ipv6_pseudo_header_sum(
    source: Ipv6Addr,
    destination: Ipv6Addr,
    next_header: u8,
    payload_len: u32,
) -> u32 {
    let mut sum = checksum_add(0, &source.octets());
    sum = checksum_add(sum, &destination.octets());
    sum = checksum_add(sum, &payload_len.to_be_bytes());
    checksum_add(sum, &u32::from(next_header).to_be_bytes())
}
