use clat_checksum::checksum_adjust;
use pnet::packet::tcp::{MutableTcpPacket, TcpPacket};

use crate::error::{Malformed, Result};

/// Computes a TCP segment's checksum under a new pseudo-header.
///
/// Only the stored checksum is read. The payload is never scanned.
#[profiling::function]
pub fn tcp_translate(segment: &[u8], old_pseudo_sum: u32, new_pseudo_sum: u32) -> Result<u16> {
    adjust_tcp_checksum(segment, old_pseudo_sum, new_pseudo_sum)
        .map(|checksum| {
            // Track the translated segment
            #[cfg(feature = "metrics")]
            clat_metrics::metric!(PACKET_COUNTER, PROTOCOL_TCP, STATUS_TRANSLATED).inc();

            checksum
        })
        .map_err(|error| {
            // Track the dropped segment
            #[cfg(feature = "metrics")]
            clat_metrics::metric!(PACKET_COUNTER, PROTOCOL_TCP, STATUS_DROPPED).inc();

            error
        })
}

fn adjust_tcp_checksum(segment: &[u8], old_pseudo_sum: u32, new_pseudo_sum: u32) -> Result<u16> {
    // Access the segment in a safe way
    let tcp_packet = TcpPacket::new(segment).ok_or(Malformed::TooShort {
        expected: TcpPacket::minimum_packet_size(),
        actual: segment.len(),
    })?;

    // The data offset must cover the fixed header and stay inside the segment
    let data_offset = tcp_packet.get_data_offset();
    if data_offset < 5 || usize::from(data_offset) * 4 > segment.len() {
        return Err(Malformed::BadTcpDataOffset(data_offset).into());
    }

    Ok(checksum_adjust(
        tcp_packet.get_checksum(),
        old_pseudo_sum,
        new_pseudo_sum,
    ))
}

/// Stores a checksum in a TCP segment. Segments too short to hold one are left alone.
pub fn write_tcp_checksum(segment: &mut [u8], checksum: u16) {
    if let Some(mut tcp_packet) = MutableTcpPacket::new(segment) {
        tcp_packet.set_checksum(checksum);
    }
}
