//! Library entry for meterlog-cli used by integration tests and embedding.

pub mod commands;
pub mod serial;

// Re-export commands for convenience
pub use commands::*;

use meterlog_core::constants::ChecksumKind;

/// BCC algorithm selectable on the command line
#[derive(Copy, Clone, Debug, Default, clap::ValueEnum)]
pub enum ChecksumArg {
    /// XOR over payload and ETX
    #[default]
    Xor,
    /// 8-bit sum over payload and ETX
    Sum8,
}

impl From<ChecksumArg> for ChecksumKind {
    fn from(arg: ChecksumArg) -> Self {
        match arg {
            ChecksumArg::Xor => ChecksumKind::Xor,
            ChecksumArg::Sum8 => ChecksumKind::Sum8,
        }
    }
}
