//! DDP packet header and frame packetizer.
//!
//! ## Wire format
//!
//! ```text
//! flags:        u8   (0x40 version marker, 0x01 on the last packet of a frame)
//! sequence:     u8   (1..=15, once per frame)
//! data_type:    u8   (0x01)
//! destination:  u8   (1)
//! offset:       u32  big-endian, byte offset of this payload in the frame
//! length:       u16  big-endian, payload bytes in this packet
//! data:         [u8] (length bytes, ≤ 1200, R G B per pixel)
//! ```

use bitflags::bitflags;
use bytes::{BufMut, Bytes, BytesMut};

use crate::error::CastError;

// ── Constants ────────────────────────────────────────────────────

/// UDP port DDP receivers listen on.
pub const DDP_PORT: u16 = 4048;

/// Maximum payload bytes per datagram (400 RGB pixels).
pub const DDP_MAX_DATALEN: usize = 1200;

/// Data type byte for 8-bit RGB.
pub const DDP_DATA_TYPE_RGB: u8 = 0x01;

/// Destination byte for the default output device.
pub const DDP_DESTINATION_ID: u8 = 1;

// ── DdpFlags ─────────────────────────────────────────────────────

bitflags! {
    /// First header byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DdpFlags: u8 {
        /// Last packet of a frame: the receiver may display it now.
        const PUSH = 0x01;
        /// Protocol version 1. Always set.
        const VER1 = 0x40;
    }
}

// ── DdpHeader ────────────────────────────────────────────────────

/// The fixed 10-byte header at the start of every datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DdpHeader {
    pub flags: DdpFlags,
    pub sequence: u8,
    pub data_type: u8,
    pub destination: u8,
    pub offset: u32,
    pub length: u16,
}

impl DdpHeader {
    /// Encoded size on the wire.
    pub const SIZE: usize = 10;

    /// Header for an RGB payload chunk.
    pub fn rgb(sequence: u8, offset: u32, length: u16, last: bool) -> Self {
        let mut flags = DdpFlags::VER1;
        flags.set(DdpFlags::PUSH, last);
        Self {
            flags,
            sequence,
            data_type: DDP_DATA_TYPE_RGB,
            destination: DDP_DESTINATION_ID,
            offset,
            length,
        }
    }

    pub fn is_last(&self) -> bool {
        self.flags.contains(DdpFlags::PUSH)
    }

    /// Serialize to bytes (big-endian).
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0] = self.flags.bits();
        buf[1] = self.sequence;
        buf[2] = self.data_type;
        buf[3] = self.destination;
        buf[4..8].copy_from_slice(&self.offset.to_be_bytes());
        buf[8..10].copy_from_slice(&self.length.to_be_bytes());
        buf
    }

    /// Deserialize from the start of a datagram.
    pub fn decode(data: &[u8]) -> Result<Self, CastError> {
        let Some(head) = data.get(..Self::SIZE) else {
            return Err(CastError::Other(format!(
                "DDP header too short: {} < {}",
                data.len(),
                Self::SIZE,
            )));
        };
        Ok(Self {
            flags: DdpFlags::from_bits_retain(head[0]),
            sequence: head[1],
            data_type: head[2],
            destination: head[3],
            offset: u32::from_be_bytes([head[4], head[5], head[6], head[7]]),
            length: u16::from_be_bytes([head[8], head[9]]),
        })
    }
}

// ── Packetizer ───────────────────────────────────────────────────

/// Split one frame's byte stream into ready-to-send datagrams.
///
/// Every datagram carries at most [`DDP_MAX_DATALEN`] payload bytes and
/// the offset of its payload in `stream`. Only the final datagram has
/// [`DdpFlags::PUSH`]. An empty stream yields no datagrams.
pub fn packetize(stream: &[u8], sequence: u8) -> Vec<Bytes> {
    let total = stream.len();
    stream
        .chunks(DDP_MAX_DATALEN)
        .enumerate()
        .map(|(idx, chunk)| {
            let offset = idx * DDP_MAX_DATALEN;
            let last = offset + chunk.len() >= total;
            let header = DdpHeader::rgb(sequence, offset as u32, chunk.len() as u16, last);

            let mut pkt = BytesMut::with_capacity(DdpHeader::SIZE + chunk.len());
            pkt.put_slice(&header.encode());
            pkt.put_slice(chunk);
            pkt.freeze()
        })
        .collect()
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout_is_bit_exact() {
        let hdr = DdpHeader::rgb(7, 0x0102_0304, 0x0506, true);
        assert_eq!(
            hdr.encode(),
            [0x41, 7, 0x01, 1, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06]
        );

        let mid = DdpHeader::rgb(7, 1200, 1200, false);
        assert_eq!(mid.encode()[0], 0x40);
    }

    #[test]
    fn header_decode() {
        let hdr = DdpHeader::rgb(15, 2400, 300, true);
        assert_eq!(DdpHeader::decode(&hdr.encode()).unwrap(), hdr);
        assert!(DdpHeader::decode(&[0x40, 1, 1]).is_err());
    }

    #[test]
    fn packet_count_and_reassembly() {
        // 1000 pixels → 3000 bytes → 1200 + 1200 + 600.
        let stream: Vec<u8> = (0..3000u32).map(|i| (i % 251) as u8).collect();
        let packets = packetize(&stream, 3);
        assert_eq!(packets.len(), 3000usize.div_ceil(DDP_MAX_DATALEN));

        let mut rebuilt = vec![0u8; stream.len()];
        let mut pushed = Vec::new();
        for pkt in &packets {
            let hdr = DdpHeader::decode(pkt).unwrap();
            let payload = &pkt[DdpHeader::SIZE..];
            assert_eq!(payload.len(), hdr.length as usize);
            assert_eq!(hdr.sequence, 3);
            let start = hdr.offset as usize;
            rebuilt[start..start + payload.len()].copy_from_slice(payload);
            if hdr.is_last() {
                pushed.push(hdr.offset);
            }
        }
        assert_eq!(rebuilt, stream);
        assert_eq!(pushed, vec![2400]);
    }

    #[test]
    fn exact_multiple_marks_last_full_chunk() {
        let stream = vec![9u8; 2 * DDP_MAX_DATALEN];
        let packets = packetize(&stream, 1);
        assert_eq!(packets.len(), 2);
        assert!(!DdpHeader::decode(&packets[0]).unwrap().is_last());
        assert!(DdpHeader::decode(&packets[1]).unwrap().is_last());
        assert_eq!(packets[1].len(), DdpHeader::SIZE + DDP_MAX_DATALEN);
    }

    #[test]
    fn empty_stream_sends_nothing() {
        assert!(packetize(&[], 4).is_empty());
    }
}
