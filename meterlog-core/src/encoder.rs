//! Frame encoding
//!
//! The meter never receives frames, so encoding exists to produce test
//! streams and synthetic captures.

use crate::constants::{
    ChecksumKind, ETX, EXTRACT_END, EXTRACT_START, FRAME_SIZE, PAYLOAD_SIZE, SYNC_MARKER,
};
use crate::error::FrameError;
use crate::types::{Frame, PayloadExtract, Trailer};
use bytes::{BufMut, Bytes, BytesMut};

/// Encode a frame into bytes
///
/// The frame is encoded with the following layout:
/// 1. Sync marker (4 bytes): `01 00 68 02`
/// 2. Payload (104 bytes)
/// 3. Trailer: ETX (1 byte), BCC (1 byte)
pub fn encode_frame(frame: &Frame) -> Result<Bytes, FrameError> {
    if frame.payload.len() != PAYLOAD_SIZE {
        return Err(FrameError::InvalidStructure(format!(
            "Payload length mismatch: expected {}, actual {}",
            PAYLOAD_SIZE,
            frame.payload.len()
        )));
    }

    let mut buf = BytesMut::with_capacity(FRAME_SIZE);
    buf.put_slice(SYNC_MARKER);
    buf.put_slice(&frame.payload);
    buf.put_u8(frame.trailer.etx);
    buf.put_u8(frame.trailer.bcc);

    Ok(buf.freeze())
}

/// Compute the block check character over payload and ETX
pub fn compute_bcc(kind: ChecksumKind, payload: &[u8], etx: u8) -> u8 {
    let body = kind.compute(payload);
    match kind {
        ChecksumKind::Xor => body ^ etx,
        ChecksumKind::Sum8 => body.wrapping_add(etx),
    }
}

/// Builder for constructing frames with various options
pub struct FrameBuilder {
    payload: [u8; PAYLOAD_SIZE],
    etx: u8,
    bcc: Option<u8>,
    checksum: ChecksumKind,
}

impl FrameBuilder {
    /// Create a new frame builder with a zeroed payload
    pub fn new() -> Self {
        Self {
            payload: [0u8; PAYLOAD_SIZE],
            etx: ETX,
            bcc: None,
            checksum: ChecksumKind::default(),
        }
    }

    /// Set the whole payload
    pub fn payload(mut self, payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() != PAYLOAD_SIZE {
            return Err(FrameError::InvalidStructure(format!(
                "Payload length mismatch: expected {}, actual {}",
                PAYLOAD_SIZE,
                payload.len()
            )));
        }
        self.payload.copy_from_slice(payload);
        Ok(self)
    }

    /// Place the energy register at payload offsets 45..=49
    pub fn extract(mut self, extract: PayloadExtract) -> Self {
        self.payload[EXTRACT_START..=EXTRACT_END].copy_from_slice(extract.as_bytes());
        self
    }

    /// Override the ETX byte
    pub fn etx(mut self, etx: u8) -> Self {
        self.etx = etx;
        self
    }

    /// Force a BCC value instead of computing it
    pub fn bcc(mut self, bcc: u8) -> Self {
        self.bcc = Some(bcc);
        self
    }

    /// Select the checksum used for the computed BCC
    pub fn checksum(mut self, kind: ChecksumKind) -> Self {
        self.checksum = kind;
        self
    }

    /// Build the frame struct
    pub fn build_struct(self) -> Frame {
        let bcc = self
            .bcc
            .unwrap_or_else(|| compute_bcc(self.checksum, &self.payload, self.etx));
        Frame {
            payload: Bytes::copy_from_slice(&self.payload),
            trailer: Trailer { etx: self.etx, bcc },
        }
    }

    /// Build and encode the frame
    pub fn build(self) -> Result<Bytes, FrameError> {
        encode_frame(&self.build_struct())
    }
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new()
    }
}
