//! Per-packet entry points: classify a packet, translate it, and splice the result into its buffer.
//!
//! Every check that can reject a packet runs before the first byte of the buffer is written.

use clat_map::{MappingReader, MappingTable};
use pnet::packet::ethernet::{EtherType, EtherTypes};

use crate::{
    error::{Malformed, RejectReason, Result, Unmapped},
    protocols::{
        ip::{translate_v4_to_v6, translate_v6_to_v4, validate_ipv4, validate_ipv6},
        transport_checksum, write_transport_checksum, TransportInfo,
    },
    view::PacketView,
};

/// Which way a packet was translated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// An application's IPv4 packet leaving over the IPv6 network
    Ipv4ToIpv6,
    /// An IPv6 packet arriving for an IPv4 application
    Ipv6ToIpv4,
}

impl Direction {
    /// The protocol tag a packet carries after being translated in this direction
    #[must_use]
    pub fn ethertype(self) -> EtherType {
        match self {
            Self::Ipv4ToIpv6 => EtherTypes::Ipv6,
            Self::Ipv6ToIpv4 => EtherTypes::Ipv4,
        }
    }
}

/// The outcome of classifying a packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The packet belongs to a translating device
    Translate(Direction),
    /// The packet must be left alone
    Reject(RejectReason),
}

impl Decision {
    /// Converts the decision to a `Result`, for use with `?`
    pub fn into_result(self) -> Result<Direction> {
        match self {
            Self::Translate(direction) => Ok(direction),
            Self::Reject(reason) => Err(reason),
        }
    }
}

impl From<Result<Direction>> for Decision {
    fn from(result: Result<Direction>) -> Self {
        match result {
            Ok(direction) => Self::Translate(direction),
            Err(reason) => Self::Reject(reason),
        }
    }
}

/// Decides whether an IPv6 packet received on a device should be translated to IPv4
#[must_use]
pub fn classify_inbound(
    table: &MappingTable,
    packet: &PacketView<'_>,
    device_index: usize,
) -> Decision {
    check_inbound(table, packet, device_index).into()
}

/// Decides whether an IPv4 packet sent on a device should be translated to IPv6
#[must_use]
pub fn classify_outbound(
    table: &MappingTable,
    packet: &PacketView<'_>,
    device_index: usize,
) -> Decision {
    check_outbound(table, packet, device_index).into()
}

fn check_inbound(
    table: &MappingTable,
    packet: &PacketView<'_>,
    device_index: usize,
) -> Result<Direction> {
    expect_ethertype(packet, EtherTypes::Ipv6)?;
    let destination = validate_ipv6(packet.bytes())?.get_destination();

    // Multicast never has a mapping, no matter what the table holds
    if destination.is_multicast() {
        return Err(Unmapped::Multicast(destination).into());
    }

    let mapping = table.enabled_device(device_index)?;
    if destination != mapping.client_ipv6 {
        return Err(Unmapped::UnknownDestination(destination).into());
    }

    Ok(Direction::Ipv6ToIpv4)
}

fn check_outbound(
    table: &MappingTable,
    packet: &PacketView<'_>,
    device_index: usize,
) -> Result<Direction> {
    expect_ethertype(packet, EtherTypes::Ipv4)?;
    let source = validate_ipv4(packet.bytes())?.0.get_source();

    let mapping = table.enabled_device(device_index)?;
    if source != mapping.client_ipv4 {
        return Err(Unmapped::UnknownSource(source).into());
    }

    Ok(Direction::Ipv4ToIpv6)
}

fn expect_ethertype(packet: &PacketView<'_>, expected: EtherType) -> Result<()> {
    if packet.ethertype() == expected {
        Ok(())
    } else {
        Err(Malformed::UnexpectedEtherType(packet.ethertype().0).into())
    }
}

/// Translates an IPv6 packet received on a device into IPv4, in place.
///
/// On success the view holds the IPv4 packet. On failure the buffer is untouched.
#[profiling::function]
pub fn translate_inbound(
    table: &MappingTable,
    device_index: usize,
    packet: &mut PacketView<'_>,
) -> Result<Direction> {
    splice_inbound(table, device_index, packet)
        .map(|direction| {
            // Track the translated packet
            #[cfg(feature = "metrics")]
            clat_metrics::metric!(PACKET_COUNTER, PROTOCOL_IPV6, STATUS_TRANSLATED).inc();

            direction
        })
        .map_err(|reason| {
            log::debug!("Inbound packet on device {} rejected: {}", device_index, reason);

            // Track the dropped packet
            #[cfg(feature = "metrics")]
            {
                clat_metrics::metric!(PACKET_COUNTER, PROTOCOL_IPV6, STATUS_DROPPED).inc();
                record_drop(clat_metrics::metrics::label_values::PROTOCOL_IPV6, &reason);
            }

            reason
        })
}

/// Translates an IPv4 packet sent on a device into IPv6, in place.
///
/// The view needs up to [`MAX_HEADER_GROWTH`](crate::protocols::MAX_HEADER_GROWTH) bytes of
/// headroom. On success the view holds the IPv6 packet. On failure the buffer is untouched.
#[profiling::function]
pub fn translate_outbound(
    table: &MappingTable,
    device_index: usize,
    packet: &mut PacketView<'_>,
) -> Result<Direction> {
    splice_outbound(table, device_index, packet)
        .map(|direction| {
            // Track the translated packet
            #[cfg(feature = "metrics")]
            clat_metrics::metric!(PACKET_COUNTER, PROTOCOL_IPV4, STATUS_TRANSLATED).inc();

            direction
        })
        .map_err(|reason| {
            log::debug!("Outbound packet on device {} rejected: {}", device_index, reason);

            // Track the dropped packet
            #[cfg(feature = "metrics")]
            {
                clat_metrics::metric!(PACKET_COUNTER, PROTOCOL_IPV4, STATUS_DROPPED).inc();
                record_drop(clat_metrics::metrics::label_values::PROTOCOL_IPV4, &reason);
            }

            reason
        })
}

fn splice_inbound(
    table: &MappingTable,
    device_index: usize,
    packet: &mut PacketView<'_>,
) -> Result<Direction> {
    let direction = classify_inbound(table, packet, device_index).into_result()?;
    let translation = translate_v6_to_v4(packet.bytes(), table, device_index)?;
    splice(
        packet,
        translation.old_header_len,
        translation.header.as_bytes(),
        &translation.transport,
    )?;
    packet.set_ethertype(direction.ethertype());

    log::trace!("Inbound packet on device {} translated to IPv4", device_index);
    Ok(direction)
}

fn splice_outbound(
    table: &MappingTable,
    device_index: usize,
    packet: &mut PacketView<'_>,
) -> Result<Direction> {
    let direction = classify_outbound(table, packet, device_index).into_result()?;
    let translation = translate_v4_to_v6(packet.bytes(), table, device_index)?;
    splice(
        packet,
        translation.old_header_len,
        translation.headers.as_bytes(),
        &translation.transport,
    )?;
    packet.set_ethertype(direction.ethertype());

    log::trace!("Outbound packet on device {} translated to IPv6", device_index);
    Ok(direction)
}

/// Swaps the network header of `packet` for `header` and fixes the transport checksum.
///
/// Trailing bytes past the transport data are trimmed.
fn splice(
    packet: &mut PacketView<'_>,
    old_header_len: usize,
    header: &[u8],
    transport: &TransportInfo,
) -> Result<()> {
    let transport_range = old_header_len..old_header_len + transport.len;
    let checksum = transport_checksum(&packet.bytes()[transport_range], transport)?;

    // This is the last point of failure, nothing has been written before it
    packet.replace_front(old_header_len, header)?;
    packet.truncate(header.len() + transport.len);

    if let Some(checksum) = checksum {
        write_transport_checksum(
            &mut packet.bytes_mut()[header.len()..],
            transport.protocol,
            checksum,
        );
    }
    Ok(())
}

/// Counts a dropped packet under the reason it was dropped for
#[cfg(feature = "metrics")]
fn record_drop(protocol: &str, reason: &RejectReason) {
    use clat_metrics::metrics::label_values::{
        REASON_BUFFER, REASON_MALFORMED, REASON_UNMAPPED, REASON_UNSUPPORTED,
    };

    let reason = match reason {
        RejectReason::MalformedHeader(_) => REASON_MALFORMED,
        RejectReason::UnsupportedProtocol(_) => REASON_UNSUPPORTED,
        RejectReason::AddressNotMapped(_) => REASON_UNMAPPED,
        RejectReason::BufferTooSmall { .. } => REASON_BUFFER,
    };
    clat_metrics::metrics::DROP_COUNTER
        .with_label_values(&[protocol, reason])
        .inc();
}

/// Translates packets against the latest published mapping table
#[derive(Debug, Clone)]
pub struct Translator {
    mappings: MappingReader,
}

impl Translator {
    /// Construct a new `Translator`
    #[must_use]
    pub fn new(mappings: MappingReader) -> Self {
        Self { mappings }
    }

    /// Translates an IPv6 packet received on a device into IPv4, in place
    pub fn translate_inbound(
        &self,
        device_index: usize,
        packet: &mut PacketView<'_>,
    ) -> Result<Direction> {
        translate_inbound(&self.mappings.snapshot(), device_index, packet)
    }

    /// Translates an IPv4 packet sent on a device into IPv6, in place
    pub fn translate_outbound(
        &self,
        device_index: usize,
        packet: &mut PacketView<'_>,
    ) -> Result<Direction> {
        translate_outbound(&self.mappings.snapshot(), device_index, packet)
    }
}
