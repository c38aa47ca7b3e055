/// Adds every 16-bit big-endian word of `data` to `running_sum`.
///
/// A trailing odd byte is treated as the high byte of a zero-padded word, as described in
/// [RFC 1071](https://datatracker.ietf.org/doc/html/rfc1071). Carries are *not* folded here, so
/// the result can be fed straight back into another call.
#[must_use]
pub fn checksum_add(running_sum: u32, data: &[u8]) -> u32 {
    let mut sum = running_sum;

    // Iterate over the data in 16-bit chunks
    let mut words = data.chunks_exact(2);
    for word in &mut words {
        sum = sum.wrapping_add(u32::from(u16::from_be_bytes([word[0], word[1]])));
    }

    // Pad out the odd byte if there is one
    if let [last] = words.remainder() {
        sum = sum.wrapping_add(u32::from(*last) << 8);
    }

    sum
}

/// Folds the carry bits of a 32-bit sum back into the low 16 bits
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn checksum_fold(sum: u32) -> u16 {
    let mut sum = sum;
    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    sum as u16
}

/// Folds a sum and complements it, producing the value that goes on the wire
#[must_use]
pub fn checksum_finish(sum: u32) -> u16 {
    !checksum_fold(sum)
}

/// Calculates the checksum of an IPv4 header.
///
/// The checksum field itself (the sixth 16-bit word) is skipped, so the header may be passed in
/// with a stale value there.
#[must_use]
pub fn ipv4_header_checksum(header: &[u8]) -> u16 {
    let before = header.get(..10).unwrap_or(header);
    let after = header.get(12..).unwrap_or(&[]);
    checksum_finish(checksum_add(checksum_add(0, before), after))
}
