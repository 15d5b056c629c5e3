//! Trailer validation for extracted frames

use crate::constants::{ChecksumKind, Strictness, ETX};
use crate::encoder::compute_bcc;
use crate::error::FrameError;
use crate::types::{Frame, Trailer};
use serde::{Deserialize, Serialize};

#[cfg(feature = "logging")]
use tracing::debug;

/// What the validator observed about an accepted frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    /// Trailer as received
    pub trailer: Trailer,

    /// BCC computed over payload and ETX
    pub expected_bcc: u8,

    /// ETX byte matched `0x03`
    pub etx_ok: bool,

    /// BCC matched the computed value
    pub bcc_ok: bool,
}

impl Verdict {
    /// True when both trailer bytes verified
    pub fn is_clean(&self) -> bool {
        self.etx_ok && self.bcc_ok
    }
}

/// Checks frame trailers under a strict or lenient policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameValidator {
    /// Whether bad trailers reject the frame
    pub strictness: Strictness,

    /// BCC algorithm
    pub checksum: ChecksumKind,
}

impl FrameValidator {
    /// Create a validator
    pub fn new(strictness: Strictness, checksum: ChecksumKind) -> Self {
        Self {
            strictness,
            checksum,
        }
    }

    /// Validator that reports but never rejects
    pub fn lenient() -> Self {
        Self::new(Strictness::Lenient, ChecksumKind::default())
    }

    /// Validator that rejects bad ETX or BCC
    pub fn strict() -> Self {
        Self::new(Strictness::Strict, ChecksumKind::default())
    }

    /// Validate a complete frame
    ///
    /// In lenient mode this never fails; the verdict carries what was seen.
    /// In strict mode a wrong ETX is reported before a BCC mismatch.
    pub fn validate(&self, frame: &Frame) -> Result<Verdict, FrameError> {
        let trailer = frame.trailer;
        let expected_bcc = compute_bcc(self.checksum, &frame.payload, trailer.etx);
        let verdict = Verdict {
            trailer,
            expected_bcc,
            etx_ok: trailer.etx == ETX,
            bcc_ok: trailer.bcc == expected_bcc,
        };

        #[cfg(feature = "logging")]
        debug!(
            "ETX {:02X}, BCC {:02X} (computed {:02X})",
            trailer.etx, trailer.bcc, expected_bcc
        );

        if self.strictness == Strictness::Strict {
            if !verdict.etx_ok {
                return Err(FrameError::BadEtx(trailer.etx));
            }
            if !verdict.bcc_ok {
                return Err(FrameError::ChecksumMismatch {
                    expected: expected_bcc,
                    actual: trailer.bcc,
                });
            }
        }

        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::FrameBuilder;
    use crate::types::PayloadExtract;

    fn extract() -> PayloadExtract {
        PayloadExtract([0x0A, 0x1B, 0x2C, 0x3D, 0x4E])
    }

    #[test]
    fn test_lenient_accepts_bad_bcc() {
        let frame = FrameBuilder::new().extract(extract()).bcc(0xF0).build_struct();
        let verdict = FrameValidator::lenient().validate(&frame).unwrap();

        assert!(verdict.etx_ok);
        assert!(!verdict.bcc_ok);
        assert_eq!(verdict.trailer.bcc, 0xF0);
    }

    #[test]
    fn test_strict_accepts_good_frame() {
        let frame = FrameBuilder::new().extract(extract()).build_struct();
        let verdict = FrameValidator::strict().validate(&frame).unwrap();
        assert!(verdict.is_clean());
    }

    #[test]
    fn test_strict_rejects_bad_bcc() {
        let good = FrameBuilder::new().extract(extract()).build_struct();
        let frame = FrameBuilder::new()
            .extract(extract())
            .bcc(good.trailer.bcc.wrapping_add(1))
            .build_struct();

        let err = FrameValidator::strict().validate(&frame).unwrap_err();
        assert_eq!(
            err,
            FrameError::ChecksumMismatch {
                expected: good.trailer.bcc,
                actual: good.trailer.bcc.wrapping_add(1),
            }
        );
    }

    #[test]
    fn test_strict_rejects_bad_etx_first() {
        let frame = FrameBuilder::new().etx(0x17).bcc(0x00).build_struct();
        let err = FrameValidator::strict().validate(&frame).unwrap_err();
        assert_eq!(err, FrameError::BadEtx(0x17));
    }

    #[test]
    fn test_checksum_kind_must_match() {
        let frame = FrameBuilder::new()
            .extract(extract())
            .checksum(ChecksumKind::Sum8)
            .build_struct();

        let sum8 = FrameValidator::new(Strictness::Strict, ChecksumKind::Sum8);
        assert!(sum8.validate(&frame).is_ok());
        assert!(FrameValidator::strict().validate(&frame).is_err());
    }
}
