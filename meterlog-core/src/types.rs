//! Core types for meter frames and log records

use crate::constants::{
    EXTRACT_END, EXTRACT_SIZE, EXTRACT_START, EXTRACT_UNIT, FRAME_SIZE, PAYLOAD_SIZE, SYNC_MARKER,
    SYNC_SIZE, TIMESTAMP_FORMAT,
};
use crate::error::FrameError;
use bytes::Bytes;
use chrono::NaiveTime;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Two-byte frame trailer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Trailer {
    /// End-of-text byte
    pub etx: u8,

    /// Block check character
    pub bcc: u8,
}

/// A whole frame with the sync marker stripped
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Payload region (always `PAYLOAD_SIZE` bytes)
    pub payload: Bytes,

    /// Trailer following the payload
    pub trailer: Trailer,
}

impl Frame {
    /// Parse a frame from exactly `FRAME_SIZE` bytes starting with the marker
    pub fn from_bytes(data: &[u8]) -> Result<Self, FrameError> {
        if data.len() < FRAME_SIZE {
            return Err(FrameError::IncompleteFrame {
                expected: FRAME_SIZE,
                actual: data.len(),
            });
        }

        if data.len() > FRAME_SIZE {
            return Err(FrameError::InvalidStructure(format!(
                "Frame length mismatch: expected {}, actual {}",
                FRAME_SIZE,
                data.len()
            )));
        }

        if &data[..SYNC_SIZE] != SYNC_MARKER {
            return Err(FrameError::NoSync);
        }

        let payload_end = SYNC_SIZE + PAYLOAD_SIZE;
        Ok(Self {
            payload: Bytes::copy_from_slice(&data[SYNC_SIZE..payload_end]),
            trailer: Trailer {
                etx: data[payload_end],
                bcc: data[payload_end + 1],
            },
        })
    }

    /// Energy register bytes at payload offsets 45..=49
    pub fn extract(&self) -> PayloadExtract {
        let mut bytes = [0u8; EXTRACT_SIZE];
        bytes.copy_from_slice(&self.payload[EXTRACT_START..=EXTRACT_END]);
        PayloadExtract(bytes)
    }
}

/// Five payload bytes read as one big-endian value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PayloadExtract(pub [u8; EXTRACT_SIZE]);

impl PayloadExtract {
    /// Raw register bytes
    pub fn as_bytes(&self) -> &[u8; EXTRACT_SIZE] {
        &self.0
    }

    /// Register as an integer
    pub fn value(&self) -> u64 {
        self.0.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
    }

    /// Unit label of the register
    pub fn unit(&self) -> &'static str {
        EXTRACT_UNIT
    }
}

impl fmt::Display for PayloadExtract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl FromStr for PayloadExtract {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = hex::decode(s.trim()).map_err(|e| FrameError::InvalidExtract(e.to_string()))?;
        let bytes: [u8; EXTRACT_SIZE] = raw.try_into().map_err(|v: Vec<u8>| {
            FrameError::InvalidExtract(format!("expected {} bytes, got {}", EXTRACT_SIZE, v.len()))
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for PayloadExtract {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One accepted frame as written to the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Wall-clock time of acceptance
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: NaiveTime,

    /// Extracted register
    pub extract: PayloadExtract,
}

impl Record {
    /// Create a new record
    pub fn new(timestamp: NaiveTime, extract: PayloadExtract) -> Self {
        Self { timestamp, extract }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{} {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.extract,
            self.extract.unit()
        )
    }
}

fn serialize_timestamp<S: Serializer>(ts: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
}
