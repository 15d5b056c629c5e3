//! The polling loop: source → scanner → validator → emitter

use crate::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_TIMEOUT_MS};
use crate::emitter::{Clock, RecordEmitter, SystemClock};
use crate::error::{CaptureError, SourceError};
use crate::scanner::{scan_chunk, LocatedFrame, ScanOutcome, StreamScanner};
use crate::source::ByteSource;
use crate::types::Record;
use crate::validator::FrameValidator;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "logging")]
use tracing::{debug, info, warn};

/// Poll loop settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// Maximum bytes requested per read
    pub chunk_size: usize,

    /// Read timeout of the source, used for reporting
    pub timeout_ms: u64,

    /// Trailer policy
    pub validator: FrameValidator,

    /// Consecutive read errors tolerated before giving up (`None` = forever)
    pub max_consecutive_errors: Option<u32>,

    /// Keep partial frames across reads instead of scanning each chunk alone
    pub carry_over: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            validator: FrameValidator::default(),
            max_consecutive_errors: None,
            carry_over: true,
        }
    }
}

/// Where the loop is in its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// No frame accepted yet
    Idle,
    /// At least one frame accepted
    Draining,
}

/// What a single poll did to the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    /// Keep polling
    Continue,
    /// The source has no more bytes
    Exhausted,
}

/// Counters for one capture session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PollSummary {
    /// Reads that returned bytes
    pub chunks: u64,
    /// Bytes received
    pub bytes: u64,
    /// Reads that timed out
    pub timeouts: u64,
    /// Reads that failed
    pub read_errors: u64,
    /// Frames written to the log
    pub frames_accepted: u64,
    /// Frames dropped by strict validation
    pub frames_rejected: u64,
    /// Chunks that ended inside a frame
    pub incomplete: u64,
    /// Chunks without any marker
    pub no_sync: u64,
}

/// Drives one source into one emitter
pub struct Poller<S, E, C = SystemClock> {
    source: S,
    emitter: E,
    clock: C,
    config: PollerConfig,
    state: PollState,
    scanner: StreamScanner,
    summary: PollSummary,
    consecutive_errors: u32,
}

impl<S: ByteSource, E: RecordEmitter> Poller<S, E, SystemClock> {
    /// Create a poller stamping records with local time
    pub fn new(source: S, emitter: E, config: PollerConfig) -> Self {
        Self::with_clock(source, emitter, SystemClock, config)
    }
}

impl<S: ByteSource, E: RecordEmitter, C: Clock> Poller<S, E, C> {
    /// Create a poller with an explicit clock
    pub fn with_clock(source: S, emitter: E, clock: C, config: PollerConfig) -> Self {
        Self {
            source,
            emitter,
            clock,
            config,
            state: PollState::Idle,
            scanner: StreamScanner::new(),
            summary: PollSummary::default(),
            consecutive_errors: 0,
        }
    }

    /// Poll until `cancel` is set or the source is exhausted
    ///
    /// The flag is checked before every read, so shutdown takes at most one
    /// read timeout. The emitter is flushed on every clean exit.
    pub fn run(&mut self, cancel: &AtomicBool) -> Result<PollSummary, CaptureError> {
        let mut buf = vec![0u8; self.config.chunk_size.max(1)];

        #[cfg(feature = "logging")]
        info!(
            "Polling with {} byte reads ({} mode)",
            buf.len(),
            if self.config.carry_over { "carry-over" } else { "single-chunk" }
        );

        loop {
            if cancel.load(Ordering::Acquire) {
                #[cfg(feature = "logging")]
                info!("Cancellation requested, stopping");
                break;
            }

            if self.poll_once(&mut buf)? == PollStep::Exhausted {
                #[cfg(feature = "logging")]
                info!("Source exhausted, stopping");
                break;
            }
        }

        self.emitter.flush()?;
        Ok(self.summary.clone())
    }

    /// Perform one read and process whatever it returned
    #[cfg_attr(not(feature = "logging"), allow(unused_variables))]
    pub fn poll_once(&mut self, buf: &mut [u8]) -> Result<PollStep, CaptureError> {
        let n = match self.source.read_chunk(buf) {
            Ok(0) | Err(SourceError::Timeout) => {
                self.summary.timeouts += 1;
                self.consecutive_errors = 0;
                #[cfg(feature = "logging")]
                debug!("No bytes received in the last {} ms", self.config.timeout_ms);
                return Ok(PollStep::Continue);
            }
            Err(SourceError::Exhausted) => return Ok(PollStep::Exhausted),
            Err(SourceError::Io(e)) => {
                self.summary.read_errors += 1;
                self.consecutive_errors += 1;
                #[cfg(feature = "logging")]
                warn!("Read error ({} in a row): {}", self.consecutive_errors, e);

                if let Some(max) = self.config.max_consecutive_errors {
                    if self.consecutive_errors >= max {
                        return Err(CaptureError::ReadErrorsExceeded {
                            count: self.consecutive_errors,
                            last: e.to_string(),
                        });
                    }
                }
                return Ok(PollStep::Continue);
            }
            Ok(n) => n,
        };

        self.consecutive_errors = 0;
        self.summary.chunks += 1;
        self.summary.bytes += n as u64;
        let chunk = &buf[..n];

        if self.config.carry_over {
            self.scanner.push(chunk);
            let mut accepted_any = false;
            while let Some(located) = self.scanner.next_frame() {
                self.accept(located)?;
                accepted_any = true;
            }
            if !accepted_any {
                if self.scanner.has_pending_frame() {
                    self.summary.incomplete += 1;
                } else {
                    self.summary.no_sync += 1;
                }
            }
        } else {
            match scan_chunk(chunk) {
                ScanOutcome::Complete(located) => self.accept(located)?,
                ScanOutcome::Incomplete { offset, available } => {
                    self.summary.incomplete += 1;
                    #[cfg(feature = "logging")]
                    debug!(
                        "Discarding partial frame at offset {} ({} bytes available)",
                        offset, available
                    );
                }
                ScanOutcome::NoSync => self.summary.no_sync += 1,
            }
        }

        Ok(PollStep::Continue)
    }

    #[cfg_attr(not(feature = "logging"), allow(unused_variables))]
    fn accept(&mut self, located: LocatedFrame) -> Result<(), CaptureError> {
        let verdict = match self.config.validator.validate(&located.frame) {
            Ok(verdict) => verdict,
            Err(e) => {
                self.summary.frames_rejected += 1;
                #[cfg(feature = "logging")]
                warn!("Dropping frame at offset {}: {}", located.offset, e);
                return Ok(());
            }
        };

        let record = Record::new(self.clock.now(), located.frame.extract());
        self.emitter.append(&record)?;
        self.summary.frames_accepted += 1;

        if self.state == PollState::Idle {
            #[cfg(feature = "logging")]
            info!("First frame accepted at offset {}", located.offset);
            self.state = PollState::Draining;
        }

        #[cfg(feature = "logging")]
        {
            info!(
                "{} {} (ETX {:02X}, BCC {:02X})",
                record.extract,
                record.extract.unit(),
                verdict.trailer.etx,
                verdict.trailer.bcc
            );
            if !verdict.is_clean() {
                debug!(
                    "Trailer did not verify (expected BCC {:02X})",
                    verdict.expected_bcc
                );
            }
        }

        Ok(())
    }

    /// Current loop state
    pub fn state(&self) -> PollState {
        self.state
    }

    /// Counters so far
    pub fn summary(&self) -> &PollSummary {
        &self.summary
    }

    /// Borrow the emitter
    pub fn emitter(&self) -> &E {
        &self.emitter
    }

    /// Tear down into source and emitter
    pub fn into_parts(self) -> (S, E) {
        (self.source, self.emitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::{ManualClock, MemoryEmitter};
    use crate::encoder::FrameBuilder;
    use crate::source::ScriptedSource;
    use crate::types::PayloadExtract;
    use chrono::NaiveTime;

    fn clock() -> ManualClock {
        ManualClock::new(NaiveTime::from_hms_milli_opt(10, 0, 0, 0).unwrap(), 250)
    }

    fn frame(extract: [u8; 5]) -> Vec<u8> {
        FrameBuilder::new()
            .extract(PayloadExtract(extract))
            .build()
            .unwrap()
            .to_vec()
    }

    fn run(source: ScriptedSource, config: PollerConfig) -> (PollSummary, MemoryEmitter) {
        let mut poller = Poller::with_clock(source, MemoryEmitter::new(), clock(), config);
        let summary = poller.run(&AtomicBool::new(false)).unwrap();
        assert_eq!(
            poller.state() == PollState::Draining,
            summary.frames_accepted > 0
        );
        (summary, poller.into_parts().1)
    }

    #[test]
    fn test_timeouts_then_frame() {
        let source = ScriptedSource::new()
            .timeout()
            .timeout()
            .data(frame([1, 2, 3, 4, 5]));
        let (summary, emitter) = run(source, PollerConfig::default());

        assert_eq!(summary.timeouts, 2);
        assert_eq!(summary.frames_accepted, 1);
        assert_eq!(emitter.records[0].extract.as_bytes(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_single_chunk_drops_split_frame() {
        let data = frame([1, 2, 3, 4, 5]);
        let source = ScriptedSource::new()
            .data(data[..60].to_vec())
            .data(data[60..].to_vec());
        let config = PollerConfig {
            carry_over: false,
            ..Default::default()
        };
        let (summary, emitter) = run(source, config);

        assert!(emitter.records.is_empty());
        assert_eq!(summary.incomplete, 1);
        assert_eq!(summary.no_sync, 1);
    }

    #[test]
    fn test_carry_over_joins_split_frame() {
        let data = frame([1, 2, 3, 4, 5]);
        let source = ScriptedSource::new()
            .data(data[..60].to_vec())
            .data(data[60..].to_vec());
        let (summary, emitter) = run(source, PollerConfig::default());

        assert_eq!(emitter.records.len(), 1);
        assert_eq!(summary.incomplete, 1);
    }

    #[test]
    fn test_read_errors_escalate() {
        let source = ScriptedSource::new().fail("a").fail("b").fail("c");
        let config = PollerConfig {
            max_consecutive_errors: Some(3),
            ..Default::default()
        };
        let mut poller = Poller::with_clock(source, MemoryEmitter::new(), clock(), config);
        let err = poller.run(&AtomicBool::new(false)).unwrap_err();

        match err {
            CaptureError::ReadErrorsExceeded { count, last } => {
                assert_eq!(count, 3);
                assert_eq!(last, "c");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_successful_read_resets_error_count() {
        let source = ScriptedSource::new()
            .fail("a")
            .fail("b")
            .data(vec![0u8; 10])
            .fail("c")
            .fail("d");
        let config = PollerConfig {
            max_consecutive_errors: Some(3),
            ..Default::default()
        };
        let (summary, _) = run(source, config);
        assert_eq!(summary.read_errors, 4);
    }

    #[test]
    fn test_cancelled_before_first_read() {
        let source = ScriptedSource::new().data(frame([1, 2, 3, 4, 5]));
        let mut poller =
            Poller::with_clock(source, MemoryEmitter::new(), clock(), PollerConfig::default());

        let summary = poller.run(&AtomicBool::new(true)).unwrap();
        assert_eq!(summary, PollSummary::default());
        assert_eq!(poller.state(), PollState::Idle);
        assert_eq!(poller.into_parts().0.remaining(), 1);
    }

    #[test]
    fn test_strict_mode_rejects() {
        let bad = FrameBuilder::new().bcc(0xF0).etx(0x03).build().unwrap().to_vec();
        let good = frame([0, 0, 0, 0, 7]);
        let source = ScriptedSource::new().data(bad).data(good);
        let config = PollerConfig {
            validator: FrameValidator::strict(),
            ..Default::default()
        };
        let (summary, emitter) = run(source, config);

        assert_eq!(summary.frames_rejected, 1);
        assert_eq!(summary.frames_accepted, 1);
        assert_eq!(emitter.records[0].extract.value(), 7);
    }
}
