use std::cmp::Ordering;

use pnet::packet::ethernet::EtherType;

use crate::error::{Malformed, RejectReason, Result};

/// A mutable window over a caller-owned buffer holding exactly one network-layer packet.
///
/// The packet occupies `buffer[start..end]`. Bytes in front of `start` are headroom that a
/// translation may claim when the new network header is longer than the old one. Payload bytes
/// never move: headers are swapped by sliding the start of the window instead.
#[derive(Debug)]
pub struct PacketView<'a> {
    buffer: &'a mut [u8],
    start: usize,
    end: usize,
    ethertype: EtherType,
}

impl<'a> PacketView<'a> {
    /// Wrap a packet of `len` bytes that begins `headroom` bytes into `buffer`
    pub fn new(
        buffer: &'a mut [u8],
        headroom: usize,
        len: usize,
        ethertype: EtherType,
    ) -> Result<Self> {
        let end = headroom
            .checked_add(len)
            .filter(|end| *end <= buffer.len())
            .ok_or(RejectReason::BufferTooSmall {
                needed: headroom.saturating_add(len),
                available: buffer.len(),
            })?;
        Ok(Self {
            buffer,
            start: headroom,
            end,
            ethertype,
        })
    }

    /// Wrap a buffer that holds a packet and nothing else. There is no headroom to grow into.
    #[must_use]
    pub fn from_packet(buffer: &'a mut [u8], ethertype: EtherType) -> Self {
        let end = buffer.len();
        Self {
            buffer,
            start: 0,
            end,
            ethertype,
        }
    }

    /// The protocol tag the packet should be presented with
    #[must_use]
    pub fn ethertype(&self) -> EtherType {
        self.ethertype
    }

    /// Change the protocol tag
    pub fn set_ethertype(&mut self, ethertype: EtherType) {
        self.ethertype = ethertype;
    }

    /// Length of the packet
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Checks if the packet has no bytes at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Number of unused bytes in front of the packet
    #[must_use]
    pub fn headroom(&self) -> usize {
        self.start
    }

    /// The packet bytes
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.buffer[self.start..self.end]
    }

    /// The packet bytes, mutably
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.buffer[self.start..self.end]
    }

    /// Extend the packet `count` bytes to the front, claiming headroom.
    ///
    /// The new leading bytes hold whatever was previously in the buffer.
    pub fn grow_front(&mut self, count: usize) -> Result<()> {
        if count > self.start {
            return Err(RejectReason::BufferTooSmall {
                needed: count,
                available: self.start,
            });
        }
        self.start -= count;
        Ok(())
    }

    /// Drop `count` bytes from the front of the packet, returning them to the headroom
    pub fn shrink_front(&mut self, count: usize) -> Result<()> {
        if count > self.len() {
            return Err(Malformed::TooShort {
                expected: count,
                actual: self.len(),
            }
            .into());
        }
        self.start += count;
        Ok(())
    }

    /// Shorten the packet to `len` bytes. Does nothing if the packet is already shorter.
    pub fn truncate(&mut self, len: usize) {
        self.end = self.end.min(self.start + len);
    }

    /// Swap the first `old_header_len` bytes of the packet for `header`.
    ///
    /// Nothing is modified unless the swap can be completed.
    pub fn replace_front(&mut self, old_header_len: usize, header: &[u8]) -> Result<()> {
        if old_header_len > self.len() {
            return Err(Malformed::TooShort {
                expected: old_header_len,
                actual: self.len(),
            }
            .into());
        }

        match header.len().cmp(&old_header_len) {
            Ordering::Greater => self.grow_front(header.len() - old_header_len)?,
            Ordering::Less => self.shrink_front(old_header_len - header.len())?,
            Ordering::Equal => {}
        }
        self.bytes_mut()[..header.len()].copy_from_slice(header);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pnet::packet::ethernet::EtherTypes;

    use super::*;

    #[test]
    fn test_new_checks_bounds() {
        let mut buffer = [0u8; 16];
        assert_eq!(
            PacketView::new(&mut buffer, 8, 9, EtherTypes::Ipv4).unwrap_err(),
            RejectReason::BufferTooSmall {
                needed: 17,
                available: 16
            }
        );

        let view = PacketView::new(&mut buffer, 8, 8, EtherTypes::Ipv4).unwrap();
        assert_eq!(view.len(), 8);
        assert_eq!(view.headroom(), 8);
    }

    #[test]
    fn test_grow_and_shrink() {
        let mut buffer = [0, 0, 1, 2, 3, 4];
        let mut view = PacketView::new(&mut buffer, 2, 4, EtherTypes::Ipv4).unwrap();

        view.shrink_front(1).unwrap();
        assert_eq!(view.bytes(), &[2, 3, 4]);

        view.grow_front(3).unwrap();
        assert_eq!(view.bytes(), &[0, 0, 1, 2, 3, 4]);

        assert!(matches!(
            view.grow_front(1),
            Err(RejectReason::BufferTooSmall {
                needed: 1,
                available: 0
            })
        ));
        assert!(view.shrink_front(7).is_err());
        assert_eq!(view.len(), 6);
    }

    #[test]
    fn test_truncate() {
        let mut buffer = [1, 2, 3, 4];
        let mut view = PacketView::from_packet(&mut buffer, EtherTypes::Ipv6);
        view.truncate(10);
        assert_eq!(view.len(), 4);
        view.truncate(2);
        assert_eq!(view.bytes(), &[1, 2]);
    }

    #[test]
    fn test_replace_front_growing() {
        let mut buffer = [0, 0, 0xaa, 0xbb, 7, 8];
        let mut view = PacketView::new(&mut buffer, 2, 4, EtherTypes::Ipv4).unwrap();
        view.replace_front(2, &[1, 2, 3, 4]).unwrap();
        assert_eq!(view.bytes(), &[1, 2, 3, 4, 7, 8]);
    }

    #[test]
    fn test_replace_front_shrinking() {
        let mut buffer = [0xaa, 0xbb, 0xcc, 7, 8];
        let mut view = PacketView::from_packet(&mut buffer, EtherTypes::Ipv6);
        view.replace_front(3, &[1]).unwrap();
        assert_eq!(view.bytes(), &[1, 7, 8]);
        assert_eq!(view.headroom(), 2);
    }

    #[test]
    fn test_replace_front_without_room_changes_nothing() {
        let mut buffer = [0, 0xaa, 0xbb, 7, 8];
        let mut view = PacketView::new(&mut buffer, 1, 4, EtherTypes::Ipv4).unwrap();
        assert!(view.replace_front(2, &[1, 2, 3, 4]).is_err());
        assert_eq!(view.bytes(), &[0xaa, 0xbb, 7, 8]);
        drop(view);
        assert_eq!(buffer, [0, 0xaa, 0xbb, 7, 8]);
    }
}
