//! Translation functions that rewrite network-layer headers between IPv4 and IPv6.
//!
//! Both directions only read the original packet. They return the replacement header bytes along
//! with the pseudo-header sums the transport checksum step needs.

use std::net::{Ipv4Addr, Ipv6Addr};

use clat_checksum::{ipv4_header_checksum, ipv4_pseudo_header_sum, ipv6_pseudo_header_sum};
use clat_map::MappingTable;
use pnet::packet::{
    ip::{IpNextHeaderProtocol, IpNextHeaderProtocols},
    ipv4::{Ipv4Flags, Ipv4Packet, MutableIpv4Packet},
    ipv6::{Ipv6Packet, MutableIpv6Packet},
    Packet,
};

use super::{
    ensure_supported, fragment::FragmentHeader, TransportInfo, FRAGMENT_HEADER_LEN,
    IPV4_HEADER_LEN, IPV6_HEADER_LEN,
};
use crate::error::{Malformed, Result};

/// Maps an IPv4 protocol number to its IPv6 next header equivalent
#[must_use]
pub fn map_proto_v4_to_v6(protocol: IpNextHeaderProtocol) -> IpNextHeaderProtocol {
    match protocol {
        IpNextHeaderProtocols::Icmp => IpNextHeaderProtocols::Icmpv6,
        other => other,
    }
}

/// Maps an IPv6 next header to its IPv4 protocol number equivalent
#[must_use]
pub fn map_proto_v6_to_v4(next_header: IpNextHeaderProtocol) -> IpNextHeaderProtocol {
    match next_header {
        IpNextHeaderProtocols::Icmpv6 => IpNextHeaderProtocols::Icmp,
        other => other,
    }
}

/// Guesses the hop limit a packet was originally sent with, given what is left of it
#[must_use]
pub fn guess_initial_ttl(hop_limit: u8) -> u8 {
    match hop_limit {
        0..=32 => 32,
        33..=64 => 64,
        65..=128 => 128,
        _ => 255,
    }
}

/// The IPv4 source used for IPv6 senders that fall outside the PLAT prefix.
///
/// These addresses live in `255.0.0.0/8`, with the sender's guessed initial hop limit in the
/// last octet.
#[must_use]
pub fn fallback_ipv4_source(hop_limit: u8) -> Ipv4Addr {
    Ipv4Addr::from(0xff00_0000 | u32::from(guess_initial_ttl(hop_limit)))
}

/// Checks that `bytes` starts with a usable IPv4 header.
///
/// The returned packet is cut down to its declared total length, and comes with its header length
/// in bytes.
pub fn validate_ipv4(bytes: &[u8]) -> Result<(Ipv4Packet<'_>, usize)> {
    let too_short = Malformed::TooShort {
        expected: IPV4_HEADER_LEN,
        actual: bytes.len(),
    };
    let packet = Ipv4Packet::new(bytes).ok_or(too_short.clone())?;

    if packet.get_version() != 4 {
        return Err(Malformed::BadVersion {
            expected: 4,
            actual: packet.get_version(),
        }
        .into());
    }

    let header_len = usize::from(packet.get_header_length()) * 4;
    if header_len < IPV4_HEADER_LEN {
        return Err(Malformed::LengthBelowHeader {
            declared: header_len,
            header: IPV4_HEADER_LEN,
        }
        .into());
    }

    let total_len = usize::from(packet.get_total_length());
    if total_len > bytes.len() {
        return Err(Malformed::LengthExceedsBuffer {
            declared: total_len,
            actual: bytes.len(),
        }
        .into());
    }
    if total_len < header_len {
        return Err(Malformed::LengthBelowHeader {
            declared: total_len,
            header: header_len,
        }
        .into());
    }

    Ok((Ipv4Packet::new(&bytes[..total_len]).ok_or(too_short)?, header_len))
}

/// Checks that `bytes` starts with a usable IPv6 header.
///
/// The returned packet is cut down to its declared length.
pub fn validate_ipv6(bytes: &[u8]) -> Result<Ipv6Packet<'_>> {
    let too_short = Malformed::TooShort {
        expected: IPV6_HEADER_LEN,
        actual: bytes.len(),
    };
    let packet = Ipv6Packet::new(bytes).ok_or(too_short.clone())?;

    if packet.get_version() != 6 {
        return Err(Malformed::BadVersion {
            expected: 6,
            actual: packet.get_version(),
        }
        .into());
    }

    let total_len = IPV6_HEADER_LEN + usize::from(packet.get_payload_length());
    if total_len > bytes.len() {
        return Err(Malformed::LengthExceedsBuffer {
            declared: total_len,
            actual: bytes.len(),
        }
        .into());
    }

    Ok(Ipv6Packet::new(&bytes[..total_len]).ok_or(too_short)?)
}

/// A synthesized IPv6 header, optionally followed by a Fragment header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv6Headers {
    bytes: [u8; IPV6_HEADER_LEN + FRAGMENT_HEADER_LEN],
    len: usize,
}

impl Ipv6Headers {
    /// Builds the header chain with a zero payload length
    fn new(
        traffic_class: u8,
        next_header: IpNextHeaderProtocol,
        hop_limit: u8,
        source: Ipv6Addr,
        destination: Ipv6Addr,
        fragment: Option<FragmentHeader>,
    ) -> Self {
        let mut bytes = [0; IPV6_HEADER_LEN + FRAGMENT_HEADER_LEN];

        // NOTE: There is no way this can fail since the buffer is a fixed size larger than the header.
        let mut header =
            unsafe { MutableIpv6Packet::new(&mut bytes[..IPV6_HEADER_LEN]).unwrap_unchecked() };
        header.set_version(6);
        header.set_traffic_class(traffic_class);
        header.set_flow_label(0);
        header.set_payload_length(0);
        header.set_hop_limit(hop_limit);
        header.set_source(source);
        header.set_destination(destination);

        let len = match fragment {
            Some(fragment) => {
                header.set_next_header(IpNextHeaderProtocols::Ipv6Frag);
                bytes[IPV6_HEADER_LEN..].copy_from_slice(&fragment.to_bytes());
                IPV6_HEADER_LEN + FRAGMENT_HEADER_LEN
            }
            None => {
                header.set_next_header(next_header);
                IPV6_HEADER_LEN
            }
        };

        Self { bytes, len }
    }

    /// Sets the payload length from the number of upper-layer bytes following the header chain
    fn set_payload_length(&mut self, transport_len: usize) -> Result<()> {
        let payload_len = transport_len + self.len - IPV6_HEADER_LEN;
        let payload_len = u16::try_from(payload_len).map_err(|_| Malformed::TooLong {
            length: IPV6_HEADER_LEN + payload_len,
            max: IPV6_HEADER_LEN + usize::from(u16::MAX),
        })?;
        self.bytes[4..6].copy_from_slice(&payload_len.to_be_bytes());
        Ok(())
    }

    /// The serialized header chain
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

/// A synthesized option-less IPv4 header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Header {
    bytes: [u8; IPV4_HEADER_LEN],
}

impl Ipv4Header {
    /// Builds the header with zeroed total length and checksum fields
    #[allow(clippy::too_many_arguments)]
    fn new(
        tos: u8,
        identification: u16,
        flags: u8,
        fragment_offset: u16,
        ttl: u8,
        protocol: IpNextHeaderProtocol,
        source: Ipv4Addr,
        destination: Ipv4Addr,
    ) -> Self {
        let mut bytes = [0; IPV4_HEADER_LEN];

        // NOTE: There is no way this can fail since the buffer is exactly the size of the header.
        let mut header = unsafe { MutableIpv4Packet::new(&mut bytes).unwrap_unchecked() };
        header.set_version(4);
        header.set_header_length(5);
        header.set_dscp(tos >> 2);
        header.set_ecn(tos & 0b11);
        header.set_identification(identification);
        header.set_flags(flags);
        header.set_fragment_offset(fragment_offset);
        header.set_ttl(ttl);
        header.set_next_level_protocol(protocol);
        header.set_source(source);
        header.set_destination(destination);

        Self { bytes }
    }

    /// Sets the total length from the number of upper-layer bytes, and refreshes the header checksum
    fn set_total_length(&mut self, transport_len: usize) -> Result<()> {
        let total_len = IPV4_HEADER_LEN + transport_len;
        let total_len = u16::try_from(total_len).map_err(|_| Malformed::TooLong {
            length: total_len,
            max: usize::from(u16::MAX),
        })?;
        self.bytes[2..4].copy_from_slice(&total_len.to_be_bytes());
        let checksum = ipv4_header_checksum(&self.bytes);
        self.bytes[10..12].copy_from_slice(&checksum.to_be_bytes());
        Ok(())
    }

    /// The serialized header
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// The result of translating an IPv4 header to IPv6
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedToIpv6 {
    /// Replacement header chain
    pub headers: Ipv6Headers,
    /// Length of the IPv4 header being replaced, options included
    pub old_header_len: usize,
    /// Upper-layer data following the old header
    pub transport: TransportInfo,
}

/// The result of translating an IPv6 header chain to IPv4
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedToIpv4 {
    /// Replacement header
    pub header: Ipv4Header,
    /// Length of the IPv6 header chain being replaced, Fragment header included
    pub old_header_len: usize,
    /// Upper-layer data following the old header chain
    pub transport: TransportInfo,
}

/// Builds the IPv6 header chain that replaces the header of `ipv4` on behalf of a device.
///
/// IPv4 options are dropped. A Fragment header is added when the packet is a fragment.
#[profiling::function]
pub fn translate_v4_to_v6(
    ipv4: &[u8],
    table: &MappingTable,
    device_index: usize,
) -> Result<TranslatedToIpv6> {
    let (packet, header_len) = validate_ipv4(ipv4)?;
    let protocol = packet.get_next_level_protocol();
    ensure_supported(protocol)?;

    let old_source = packet.get_source();
    let old_destination = packet.get_destination();
    let source = table.v6_from_v4(device_index, old_source)?;
    let destination = table.embed(old_destination);
    let next_header = map_proto_v4_to_v6(protocol);

    let offset = packet.get_fragment_offset();
    let more_fragments = packet.get_flags() & Ipv4Flags::MoreFragments != 0;
    let fragment = (more_fragments || offset != 0).then(|| FragmentHeader {
        next_header: next_header.0,
        offset,
        more_fragments,
        identification: u32::from(packet.get_identification()),
    });

    let mut headers = Ipv6Headers::new(
        (packet.get_dscp() << 2) | packet.get_ecn(),
        next_header,
        packet.get_ttl(),
        source,
        destination,
        fragment,
    );

    // Validation guarantees this fits the 16-bit total length it came from
    let transport_len = packet.packet().len() - header_len;
    headers.set_payload_length(transport_len)?;

    #[allow(clippy::cast_possible_truncation)]
    let transport = TransportInfo {
        protocol,
        len: transport_len,
        old_pseudo_sum: ipv4_pseudo_header_sum(
            old_source,
            old_destination,
            protocol.0,
            transport_len as u16,
        ),
        new_pseudo_sum: ipv6_pseudo_header_sum(
            source,
            destination,
            next_header.0,
            transport_len as u32,
        ),
        has_header: offset == 0,
        complete: offset == 0 && !more_fragments,
    };

    log::trace!(
        "Translated header {} -> {} to {} -> {} ({} transport bytes)",
        old_source,
        old_destination,
        source,
        destination,
        transport_len
    );

    Ok(TranslatedToIpv6 {
        headers,
        old_header_len: header_len,
        transport,
    })
}

/// Builds the IPv4 header that replaces the header chain of `ipv6` on behalf of a device.
///
/// The only extension header understood is a Fragment header directly after the fixed header.
#[profiling::function]
pub fn translate_v6_to_v4(
    ipv6: &[u8],
    table: &MappingTable,
    device_index: usize,
) -> Result<TranslatedToIpv4> {
    let packet = validate_ipv6(ipv6)?;

    let mut next_header = packet.get_next_header();
    let mut old_header_len = IPV6_HEADER_LEN;
    let mut fragment = None;
    if next_header == IpNextHeaderProtocols::Ipv6Frag {
        let header = FragmentHeader::parse(&packet.packet()[IPV6_HEADER_LEN..])?;
        next_header = IpNextHeaderProtocol::new(header.next_header);
        old_header_len += FRAGMENT_HEADER_LEN;
        fragment = Some(header);
    }
    ensure_supported(next_header)?;

    let mapping = table.device(device_index)?;
    let old_source = packet.get_source();
    let old_destination = packet.get_destination();
    let hop_limit = packet.get_hop_limit();
    let source = table
        .v4_from_v6(&old_source)
        .unwrap_or_else(|| fallback_ipv4_source(hop_limit));
    let destination = mapping.client_ipv4;
    let protocol = map_proto_v6_to_v4(next_header);

    #[allow(clippy::cast_possible_truncation)]
    let (identification, flags, fragment_offset) = match fragment {
        Some(fragment) => (
            fragment.identification as u16,
            if fragment.more_fragments {
                Ipv4Flags::MoreFragments
            } else {
                0
            },
            fragment.offset,
        ),
        None => (0, Ipv4Flags::DontFragment, 0),
    };

    let mut header = Ipv4Header::new(
        packet.get_traffic_class(),
        identification,
        flags,
        fragment_offset,
        hop_limit,
        protocol,
        source,
        destination,
    );

    let transport_len = packet.packet().len() - old_header_len;
    header.set_total_length(transport_len)?;

    // The total length check above bounds the transport length to 16 bits
    #[allow(clippy::cast_possible_truncation)]
    let transport = TransportInfo {
        protocol,
        len: transport_len,
        old_pseudo_sum: ipv6_pseudo_header_sum(
            old_source,
            old_destination,
            next_header.0,
            transport_len as u32,
        ),
        new_pseudo_sum: ipv4_pseudo_header_sum(
            source,
            destination,
            protocol.0,
            transport_len as u16,
        ),
        has_header: fragment.map_or(true, |fragment| fragment.offset == 0),
        complete: fragment.map_or(true, |fragment| {
            fragment.offset == 0 && !fragment.more_fragments
        }),
    };

    log::trace!(
        "Translated header {} -> {} to {} -> {} ({} transport bytes)",
        old_source,
        old_destination,
        source,
        destination,
        transport_len
    );

    Ok(TranslatedToIpv4 {
        header,
        old_header_len,
        transport,
    })
}
