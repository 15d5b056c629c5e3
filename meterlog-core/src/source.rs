//! Byte sources feeding the poll loop

use crate::error::SourceError;
use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

/// Supplies one bounded chunk per call
///
/// Implementations must return within their configured timeout. `Ok(0)` and
/// `Err(SourceError::Timeout)` both mean nothing arrived in time.
pub trait ByteSource {
    /// Read at most `buf.len()` bytes into `buf`
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, SourceError>;
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
        (**self).read_chunk(buf)
    }
}

/// What an end-of-file read means for a [`ReaderSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EofPolicy {
    /// EOF is a quiet line; treat it as a timeout (serial ports)
    Timeout,
    /// EOF ends the stream (files)
    Exhausted,
}

/// Adapts any [`Read`] into a [`ByteSource`]
///
/// Serial handles report an expired read timeout as `TimedOut` (or
/// `WouldBlock` on some platforms); both map to [`SourceError::Timeout`].
pub struct ReaderSource<R> {
    inner: R,
    eof: EofPolicy,
}

impl<R: Read> ReaderSource<R> {
    /// Wrap a reader
    pub fn new(inner: R, eof: EofPolicy) -> Self {
        Self { inner, eof }
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
        loop {
            match self.inner.read(buf) {
                Ok(0) if !buf.is_empty() => {
                    return match self.eof {
                        EofPolicy::Timeout => Err(SourceError::Timeout),
                        EofPolicy::Exhausted => Err(SourceError::Exhausted),
                    }
                }
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    return Err(SourceError::Timeout)
                }
                Err(e) => return Err(SourceError::Io(e)),
            }
        }
    }
}

/// One scripted read
#[derive(Debug)]
pub enum ScriptedRead {
    /// Bytes returned by the read (empty means a timeout)
    Data(Vec<u8>),
    /// An I/O failure with the given message
    Fail(String),
}

/// Replays a fixed list of reads, then reports exhaustion
///
/// Data longer than the caller's buffer is split over several reads.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    reads: VecDeque<ScriptedRead>,
}

impl ScriptedSource {
    /// Create an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a read returning `bytes`
    pub fn data(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.reads.push_back(ScriptedRead::Data(bytes.into()));
        self
    }

    /// Queue a read that times out
    pub fn timeout(self) -> Self {
        self.data(Vec::new())
    }

    /// Queue a failing read
    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.reads.push_back(ScriptedRead::Fail(message.into()));
        self
    }

    /// Reads still queued
    pub fn remaining(&self) -> usize {
        self.reads.len()
    }
}

impl ByteSource for ScriptedSource {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
        match self.reads.pop_front() {
            None => Err(SourceError::Exhausted),
            Some(ScriptedRead::Fail(message)) => Err(SourceError::Io(std::io::Error::new(
                ErrorKind::Other,
                message,
            ))),
            Some(ScriptedRead::Data(bytes)) => {
                if bytes.is_empty() {
                    return Err(SourceError::Timeout);
                }
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    self.reads.push_front(ScriptedRead::Data(bytes[n..].to_vec()));
                }
                Ok(n)
            }
        }
    }
}
