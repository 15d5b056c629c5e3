//! Capture configuration

use crate::constants::{
    ChecksumKind, Strictness, DEFAULT_BAUD_RATE, DEFAULT_CHUNK_SIZE, DEFAULT_TIMEOUT_MS,
};
use crate::error::CaptureError;
use crate::poller::PollerConfig;
use crate::validator::FrameValidator;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default serial device for the current platform
#[cfg(windows)]
pub const DEFAULT_DEVICE: &str = "COM3";

/// Default serial device for the current platform
#[cfg(not(windows))]
pub const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";

/// Default record log path
pub const DEFAULT_OUTPUT: &str = "output.csv";

/// Everything needed to run one capture session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Serial device path or name
    pub device_path: String,

    /// CSV log path
    pub output_path: PathBuf,

    /// Line speed (8 data bits, no parity, 1 stop bit are fixed)
    pub baud_rate: u32,

    /// Read timeout in milliseconds
    pub timeout_ms: u64,

    /// Bytes requested per read
    pub chunk_size: usize,

    /// Trailer policy
    pub strictness: Strictness,

    /// BCC algorithm
    pub checksum: ChecksumKind,

    /// Consecutive read errors tolerated (`None` = retry forever)
    pub max_consecutive_errors: Option<u32>,

    /// Keep partial frames across reads
    pub carry_over: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_path: DEFAULT_DEVICE.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            strictness: Strictness::default(),
            checksum: ChecksumKind::default(),
            max_consecutive_errors: None,
            carry_over: true,
        }
    }
}

impl CaptureConfig {
    /// Reject values the serial layer or the loop cannot work with
    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.device_path.trim().is_empty() {
            return Err(CaptureError::InvalidConfig("device path is empty".into()));
        }
        if self.baud_rate == 0 {
            return Err(CaptureError::InvalidConfig("baud rate must be positive".into()));
        }
        if self.timeout_ms == 0 {
            return Err(CaptureError::InvalidConfig(
                "timeout must be at least 1 ms so reads never block forever".into(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(CaptureError::InvalidConfig("chunk size must be positive".into()));
        }
        if self.max_consecutive_errors == Some(0) {
            return Err(CaptureError::InvalidConfig(
                "max consecutive errors must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Poll loop settings derived from this configuration
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            chunk_size: self.chunk_size,
            timeout_ms: self.timeout_ms,
            validator: FrameValidator::new(self.strictness, self.checksum),
            max_consecutive_errors: self.max_consecutive_errors,
            carry_over: self.carry_over,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_meter_link() {
        let config = CaptureConfig::default();
        assert_eq!(config.baud_rate, 2400);
        assert_eq!(config.timeout_ms, 100);
        assert_eq!(config.chunk_size, 110);
        assert_eq!(config.output_path, PathBuf::from("output.csv"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = CaptureConfig {
            timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CaptureError::InvalidConfig(_))));

        let config = CaptureConfig {
            max_consecutive_errors: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CaptureConfig =
            serde_json::from_str(r#"{"device_path":"/dev/ttyS1","strictness":"strict"}"#).unwrap();
        assert_eq!(config.device_path, "/dev/ttyS1");
        assert_eq!(config.strictness, Strictness::Strict);
        assert_eq!(config.baud_rate, DEFAULT_BAUD_RATE);

        let poller = config.poller_config();
        assert_eq!(poller.validator.strictness, Strictness::Strict);
        assert!(poller.carry_over);
    }
}
