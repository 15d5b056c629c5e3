//! Error types for meterlog operations

use std::io;

/// Errors raised while framing and validating a single frame
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    /// No sync marker in the scanned bytes
    #[error("No sync marker found")]
    NoSync,

    /// Incomplete frame - not enough data after the marker
    #[error("Incomplete frame: expected {expected} bytes, got {actual}")]
    IncompleteFrame {
        /// The number of bytes expected.
        expected: usize,
        /// The number of bytes actually found.
        actual: usize,
    },

    /// First trailer byte is not ETX
    #[error("Bad ETX byte: expected 03, got {0:02X}")]
    BadEtx(u8),

    /// Block check character mismatch
    #[error("Checksum mismatch: expected {expected:02X}, got {actual:02X}")]
    ChecksumMismatch {
        /// The BCC computed over the frame.
        expected: u8,
        /// The BCC carried in the trailer.
        actual: u8,
    },

    /// Invalid frame structure
    #[error("Invalid frame structure: {0}")]
    InvalidStructure(String),

    /// Extract value could not be parsed
    #[error("Invalid extract value: {0}")]
    InvalidExtract(String),
}

/// Outcome of a failed read from a byte source
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    /// Nothing arrived within the read timeout
    #[error("Read timed out")]
    Timeout,

    /// A finite source has no more bytes
    #[error("Source exhausted")]
    Exhausted,

    /// Any other I/O failure
    #[error("Read error: {0}")]
    Io(#[from] io::Error),
}

/// Errors that stop a capture session
#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The serial device does not exist
    #[error("Serial device not found: {0}")]
    DeviceNotFound(String),

    /// The serial device exists but could not be opened
    #[error("Failed to open serial device {device}: {reason}")]
    DeviceOpenFailed {
        /// Device path.
        device: String,
        /// Underlying failure.
        reason: String,
    },

    /// Line settings (baud, data bits, parity, stop bits) were refused
    #[error("Failed to configure serial device {device}: {reason}")]
    DeviceConfigFailed {
        /// Device path.
        device: String,
        /// Underlying failure.
        reason: String,
    },

    /// The read timeout was refused
    #[error("Failed to set read timeout on {device}: {reason}")]
    TimeoutConfigFailed {
        /// Device path.
        device: String,
        /// Underlying failure.
        reason: String,
    },

    /// The record log could not be created
    #[error("Failed to open log {path}: {source}")]
    LogOpenFailed {
        /// Log path.
        path: String,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },

    /// Writing or flushing the record log failed
    #[error("Failed to write log: {0}")]
    LogWriteFailed(#[from] io::Error),

    /// Too many read errors in a row
    #[error("{count} consecutive read errors, last: {last}")]
    ReadErrorsExceeded {
        /// Consecutive failures observed.
        count: u32,
        /// Message of the last failure.
        last: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = FrameError::ChecksumMismatch {
            expected: 0x0A,
            actual: 0xF0,
        };
        assert_eq!(err.to_string(), "Checksum mismatch: expected 0A, got F0");

        let err = CaptureError::ReadErrorsExceeded {
            count: 3,
            last: "broken pipe".into(),
        };
        assert_eq!(err.to_string(), "3 consecutive read errors, last: broken pipe");
    }

    #[test]
    fn test_source_error_from_io() {
        let err: SourceError = io::Error::new(io::ErrorKind::Other, "boom").into();
        assert!(matches!(err, SourceError::Io(_)));
    }
}
