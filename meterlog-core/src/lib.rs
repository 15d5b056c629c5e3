//! # Meterlog Core
//!
//! Locates fixed-length meter frames in a raw serial byte stream by their
//! sync marker, checks their trailer and logs the energy register of each
//! accepted frame.
//!
//! ## Modules
//!
//! - `constants`: Frame layout, defaults, validation policies
//! - `types`: Core types (Frame, Trailer, PayloadExtract, Record)
//! - `scanner`: Single-chunk, whole-buffer and carry-over scanning
//! - `validator`: ETX/BCC checks under a strict or lenient policy
//! - `encoder`: Frame building for tests and synthetic captures
//! - `source`: Byte sources feeding the poll loop
//! - `emitter`: Record sinks and clocks
//! - `poller`: The polling loop
//! - `config`: Capture configuration

#![warn(missing_docs)]

pub mod config;
pub mod constants;
pub mod emitter;
pub mod encoder;
pub mod error;
pub mod poller;
pub mod scanner;
pub mod source;
pub mod types;
pub mod validator;

// Re-export commonly used types
pub use error::{CaptureError, FrameError, SourceError};
pub use types::{Frame, PayloadExtract, Record, Trailer};
