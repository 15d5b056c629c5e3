//! Constants and limits for the meter frame format

use serde::{Deserialize, Serialize};

/// Sync marker - 4 bytes opening every frame
pub const SYNC_MARKER: &[u8; 4] = b"\x01\x00\x68\x02";

/// Size of the sync marker in bytes
pub const SYNC_SIZE: usize = SYNC_MARKER.len();

/// Size of the payload region following the marker
pub const PAYLOAD_SIZE: usize = 104;

/// Size of the trailer (ETX + BCC)
pub const TRAILER_SIZE: usize = 2;

/// Total frame size: marker + payload + trailer
pub const FRAME_SIZE: usize = SYNC_SIZE + PAYLOAD_SIZE + TRAILER_SIZE;

/// First payload offset of the energy register
pub const EXTRACT_START: usize = 45;

/// Last payload offset (inclusive) of the energy register
pub const EXTRACT_END: usize = 49;

/// Number of bytes in the extracted register
pub const EXTRACT_SIZE: usize = EXTRACT_END - EXTRACT_START + 1;

/// Unit label appended to every extract
pub const EXTRACT_UNIT: &str = "Wh";

/// End-of-text byte expected as the first trailer byte
pub const ETX: u8 = 0x03;

/// Default read size; one frame per read on a well-aligned link
pub const DEFAULT_CHUNK_SIZE: usize = FRAME_SIZE;

/// Default read timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Default line speed of the meter port
pub const DEFAULT_BAUD_RATE: u32 = 2400;

/// Header line written once at the top of the CSV log
pub const CSV_HEADER: &str = "Timp sistem,octeti specifici (Wh)";

/// Timestamp layout of a record (`HH:MM:SS.mmm`)
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S%.3f";

/// How trailer problems are treated by the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Accept every complete frame and only report ETX/BCC
    #[default]
    Lenient,
    /// Reject frames whose ETX or BCC does not verify
    Strict,
}

/// Block check character algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumKind {
    /// XOR over payload and ETX
    #[default]
    Xor,
    /// Wrapping 8-bit sum over payload and ETX
    Sum8,
}

impl ChecksumKind {
    /// Compute the check byte over `data`
    pub fn compute(&self, data: &[u8]) -> u8 {
        match self {
            ChecksumKind::Xor => data.iter().fold(0u8, |acc, b| acc ^ b),
            ChecksumKind::Sum8 => data.iter().fold(0u8, |acc, b| acc.wrapping_add(*b)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_layout() {
        assert_eq!(FRAME_SIZE, 110);
        assert_eq!(EXTRACT_SIZE, 5);
        assert!(EXTRACT_END < PAYLOAD_SIZE);
    }

    #[test]
    fn test_checksum_kinds() {
        assert_eq!(ChecksumKind::Xor.compute(&[0x0F, 0xF0, 0x03]), 0xFC);
        assert_eq!(ChecksumKind::Sum8.compute(&[0xFF, 0x02]), 0x01);
        assert_eq!(ChecksumKind::Xor.compute(&[]), 0);
    }
}
