use clat_checksum::{checksum_add, checksum_adjust, checksum_finish};
use pnet::packet::udp::{MutableUdpPacket, UdpPacket};

use crate::error::{Malformed, Result, Unsupported};

/// Computes a UDP datagram's checksum under a new pseudo-header.
///
/// A stored checksum is adjusted without reading the payload. Datagrams sent without a checksum
/// get a fresh one computed over the whole datagram, which requires the datagram to be `complete`
/// in this packet.
#[profiling::function]
pub fn udp_translate(
    segment: &[u8],
    old_pseudo_sum: u32,
    new_pseudo_sum: u32,
    complete: bool,
) -> Result<u16> {
    adjust_udp_checksum(segment, old_pseudo_sum, new_pseudo_sum, complete)
        .map(|checksum| {
            // Track the translated datagram
            #[cfg(feature = "metrics")]
            clat_metrics::metric!(PACKET_COUNTER, PROTOCOL_UDP, STATUS_TRANSLATED).inc();

            checksum
        })
        .map_err(|error| {
            // Track the dropped datagram
            #[cfg(feature = "metrics")]
            clat_metrics::metric!(PACKET_COUNTER, PROTOCOL_UDP, STATUS_DROPPED).inc();

            error
        })
}

fn adjust_udp_checksum(
    segment: &[u8],
    old_pseudo_sum: u32,
    new_pseudo_sum: u32,
    complete: bool,
) -> Result<u16> {
    // Access the datagram in a safe way
    let udp_packet = UdpPacket::new(segment).ok_or(Malformed::TooShort {
        expected: UdpPacket::minimum_packet_size(),
        actual: segment.len(),
    })?;

    let checksum = match udp_packet.get_checksum() {
        0 if !complete => return Err(Unsupported::UdpFragmentWithoutChecksum.into()),
        // The zeroed checksum field contributes nothing to the sum
        0 => checksum_finish(checksum_add(new_pseudo_sum, segment)),
        old_checksum => checksum_adjust(old_checksum, old_pseudo_sum, new_pseudo_sum),
    };

    // Zero means "no checksum" on the wire
    Ok(if checksum == 0 { 0xffff } else { checksum })
}

/// Stores a checksum in a UDP datagram. Datagrams too short to hold one are left alone.
pub fn write_udp_checksum(segment: &mut [u8], checksum: u16) {
    if let Some(mut udp_packet) = MutableUdpPacket::new(segment) {
        udp_packet.set_checksum(checksum);
    }
}
