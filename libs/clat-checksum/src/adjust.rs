use crate::sum::checksum_fold;

/// Incrementally updates a stored checksum after the pseudo-header it covers has changed.
///
/// This is the algorithm from [RFC 1624 Section 3](https://datatracker.ietf.org/doc/html/rfc1624#section-3):
/// the old pseudo-header sum is subtracted from, and the new one added to, the complemented
/// checksum. No payload bytes are touched, so the cost is independent of the segment size.
#[must_use]
pub fn checksum_adjust(old_checksum: u16, old_pseudo_sum: u32, new_pseudo_sum: u32) -> u16 {
    let folded_sum = checksum_fold(u32::from(!old_checksum).wrapping_add(new_pseudo_sum));
    let folded_old = checksum_fold(old_pseudo_sum);

    if folded_sum > folded_old {
        !(folded_sum - folded_old)
    } else {
        // End-around borrow
        !folded_sum.wrapping_sub(folded_old).wrapping_sub(1)
    }
}
