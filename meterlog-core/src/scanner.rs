//! Sync-marker scanning over raw serial chunks

use crate::constants::{FRAME_SIZE, PAYLOAD_SIZE, SYNC_MARKER, SYNC_SIZE};
use crate::error::FrameError;
use crate::types::{Frame, Trailer};
use bytes::{Buf, BytesMut};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// A frame found at a specific offset in the scanned bytes
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedFrame {
    /// Byte offset where the sync marker was found
    pub offset: usize,

    /// The extracted frame
    pub frame: Frame,
}

/// Result of scanning one chunk
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// A whole frame starts at the first marker
    Complete(LocatedFrame),

    /// The first marker is too close to the end of the chunk
    Incomplete {
        /// Marker offset in the chunk
        offset: usize,
        /// Bytes available from the marker to the chunk end
        available: usize,
    },

    /// No marker in the chunk
    NoSync,
}

impl ScanOutcome {
    /// Bytes still missing for an incomplete frame
    pub fn needed(&self) -> usize {
        match self {
            ScanOutcome::Incomplete { available, .. } => FRAME_SIZE.saturating_sub(*available),
            _ => 0,
        }
    }
}

/// Scan a single chunk for the first sync marker
///
/// Only the first frame candidate is considered. A candidate that holds a
/// later marker was cut short, and scanning resyncs at that marker. A marker
/// with fewer than `FRAME_SIZE` bytes behind it yields `Incomplete` and
/// nothing past the end of `chunk` is ever read.
pub fn scan_chunk(chunk: &[u8]) -> ScanOutcome {
    let Some(mut offset) = find_marker(chunk) else {
        #[cfg(feature = "logging")]
        trace!("No sync marker in {} byte chunk", chunk.len());
        return ScanOutcome::NoSync;
    };

    while let Some(next) = find_resync(chunk, offset) {
        #[cfg(feature = "logging")]
        debug!("Candidate at offset {} cut short by marker at {}", offset, next);
        offset = next;
    }

    #[cfg(feature = "logging")]
    debug!("Sync marker found at offset {}", offset);

    match try_extract_at_offset(chunk, offset) {
        Ok(located) => ScanOutcome::Complete(located),
        Err(_) => ScanOutcome::Incomplete {
            offset,
            available: chunk.len() - offset,
        },
    }
}

/// Scan a buffer for every complete frame
///
/// After a complete frame scanning resumes at the frame end. A marker whose
/// frame runs past the end of `data` ends the scan.
pub fn scan_stream(data: &[u8]) -> Vec<LocatedFrame> {
    scan_stream_with_stats(data).0
}

/// Find the next occurrence of the sync marker
fn find_marker(data: &[u8]) -> Option<usize> {
    memchr::memmem::find(data, SYNC_MARKER)
}

/// Find a marker inside the candidate frame starting at `at`
///
/// The marker never occurs inside a frame, so one within `FRAME_SIZE` bytes
/// of `at` means the candidate was truncated and the real frame starts there.
fn find_resync(data: &[u8], at: usize) -> Option<usize> {
    let end = data.len().min(at.saturating_add(FRAME_SIZE));
    let from = at + 1;
    if from >= end {
        return None;
    }
    find_marker(&data[from..end]).map(|rel| from + rel)
}

/// Try to extract a frame at a specific offset
fn try_extract_at_offset(data: &[u8], offset: usize) -> Result<LocatedFrame, FrameError> {
    let end = offset
        .checked_add(FRAME_SIZE)
        .filter(|end| *end <= data.len())
        .ok_or(FrameError::IncompleteFrame {
            expected: FRAME_SIZE,
            actual: data.len().saturating_sub(offset),
        })?;

    let frame = Frame::from_bytes(&data[offset..end])?;
    Ok(LocatedFrame { offset, frame })
}

/// Scan statistics
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ScanStats {
    /// Total bytes scanned
    pub bytes_scanned: usize,

    /// Number of sync markers found
    pub markers_found: usize,

    /// Number of complete frames found
    pub frames_found: usize,

    /// Bytes held by an incomplete frame at the end of the data
    pub incomplete_tail: usize,

    /// Candidates cut short by a following marker
    pub truncated_frames: usize,

    /// Total bytes recovered (sum of all frame sizes)
    pub bytes_recovered: usize,
}

impl ScanStats {
    /// Calculate recovery rate as a percentage
    pub fn recovery_rate(&self) -> f64 {
        if self.bytes_scanned == 0 {
            0.0
        } else {
            (self.bytes_recovered as f64 / self.bytes_scanned as f64) * 100.0
        }
    }
}

/// Scan a buffer with statistics
pub fn scan_stream_with_stats(data: &[u8]) -> (Vec<LocatedFrame>, ScanStats) {
    let mut stats = ScanStats {
        bytes_scanned: data.len(),
        ..Default::default()
    };

    let mut results = Vec::new();
    let mut pos = 0;

    #[cfg(feature = "logging")]
    debug!("Starting stream scan of {} bytes", data.len());

    while let Some(rel) = find_marker(&data[pos..]) {
        let at = pos + rel;
        stats.markers_found += 1;

        if let Some(next) = find_resync(data, at) {
            #[cfg(feature = "logging")]
            debug!("Candidate at offset {} cut short by marker at {}", at, next);

            stats.truncated_frames += 1;
            pos = next;
            continue;
        }

        match try_extract_at_offset(data, at) {
            Ok(located) => {
                stats.bytes_recovered += FRAME_SIZE;
                pos = at + FRAME_SIZE;
                results.push(located);
            }
            Err(_e) => {
                #[cfg(feature = "logging")]
                debug!("Frame at offset {} runs past the data: {}", at, _e);

                stats.incomplete_tail = data.len() - at;
                break;
            }
        }
    }

    stats.frames_found = results.len();

    #[cfg(feature = "logging")]
    debug!(
        "Scan complete: found {} frames out of {} bytes scanned",
        stats.frames_found, stats.bytes_scanned
    );

    (results, stats)
}

/// Sliding-window scanner that carries bytes over between reads
///
/// Bytes that may still belong to a frame are kept after each drain:
/// an incomplete candidate from its marker on, or otherwise the last
/// `SYNC_SIZE - 1` bytes, which may hold the start of a split marker.
/// Retained data therefore never exceeds `FRAME_SIZE - 1` bytes between
/// pushes.
#[derive(Debug, Default)]
pub struct StreamScanner {
    buf: BytesMut,

    /// Absolute stream position of `buf[0]`
    position: usize,

    /// Noise bytes dropped so far
    discarded: usize,

    /// Truncated candidates dropped so far
    truncated: usize,
}

impl StreamScanner {
    /// Create an empty scanner
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(2 * FRAME_SIZE),
            position: 0,
            discarded: 0,
            truncated: 0,
        }
    }

    /// Append freshly read bytes
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Yield the next complete frame, if any
    ///
    /// Offsets in the returned frame are absolute positions in the whole
    /// stream pushed so far.
    pub fn next_frame(&mut self) -> Option<LocatedFrame> {
        let Some(mut at) = find_marker(&self.buf) else {
            let keep = self.buf.len().min(SYNC_SIZE - 1);
            self.discard(self.buf.len() - keep);
            return None;
        };

        while let Some(next) = find_resync(&self.buf, at) {
            #[cfg(feature = "logging")]
            debug!(
                "Dropping truncated frame at stream offset {}",
                self.position + at
            );
            self.truncated += 1;
            at = next;
        }

        self.discard(at);

        if self.buf.len() < FRAME_SIZE {
            #[cfg(feature = "logging")]
            trace!(
                "Holding partial frame at stream offset {} ({} of {} bytes)",
                self.position,
                self.buf.len(),
                FRAME_SIZE
            );
            return None;
        }

        let raw = self.buf.split_to(FRAME_SIZE).freeze();
        let offset = self.position;
        self.position += FRAME_SIZE;

        let payload_end = SYNC_SIZE + PAYLOAD_SIZE;
        let frame = Frame {
            payload: raw.slice(SYNC_SIZE..payload_end),
            trailer: Trailer {
                etx: raw[payload_end],
                bcc: raw[payload_end + 1],
            },
        };

        #[cfg(feature = "logging")]
        debug!("Frame complete at stream offset {}", offset);

        Some(LocatedFrame { offset, frame })
    }

    /// Drain every complete frame currently buffered
    pub fn drain_frames(&mut self) -> Vec<LocatedFrame> {
        let mut frames = Vec::new();
        while let Some(located) = self.next_frame() {
            frames.push(located);
        }
        frames
    }

    /// True when the retained bytes start with a sync marker
    pub fn has_pending_frame(&self) -> bool {
        self.buf.starts_with(SYNC_MARKER)
    }

    /// Number of bytes currently retained
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Number of noise bytes dropped so far
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Number of truncated frames dropped so far
    pub fn truncated(&self) -> usize {
        self.truncated
    }

    /// Drop all retained bytes
    pub fn clear(&mut self) {
        let len = self.buf.len();
        self.discard(len);
    }

    fn discard(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        self.buf.advance(n);
        self.position += n;
        self.discarded += n;
    }
}
