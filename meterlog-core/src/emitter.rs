//! Record sinks and the clock that stamps records

use crate::constants::CSV_HEADER;
use crate::error::CaptureError;
use crate::types::Record;
use chrono::{Duration, Local, NaiveTime};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Source of record timestamps
pub trait Clock {
    /// Current time of day
    fn now(&mut self) -> NaiveTime;
}

/// Local wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&mut self) -> NaiveTime {
        Local::now().time()
    }
}

/// Deterministic clock advancing by a fixed step on every reading
#[derive(Debug, Clone)]
pub struct ManualClock {
    next: NaiveTime,
    step: Duration,
}

impl ManualClock {
    /// Start at `start`, advancing `step_ms` milliseconds per reading
    pub fn new(start: NaiveTime, step_ms: i64) -> Self {
        Self {
            next: start,
            step: Duration::milliseconds(step_ms),
        }
    }
}

impl Clock for ManualClock {
    fn now(&mut self) -> NaiveTime {
        let now = self.next;
        self.next = now + self.step;
        now
    }
}

/// Append-only sink for accepted records
pub trait RecordEmitter {
    /// Persist one record
    fn append(&mut self, record: &Record) -> io::Result<()>;

    /// Push buffered records to durable storage
    fn flush(&mut self) -> io::Result<()>;
}

impl<E: RecordEmitter + ?Sized> RecordEmitter for &mut E {
    fn append(&mut self, record: &Record) -> io::Result<()> {
        (**self).append(record)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// CSV log: a fixed header, then one `<time>,<hex> Wh` line per record
pub struct CsvEmitter<W: Write> {
    writer: W,
    written: usize,
}

impl CsvEmitter<BufWriter<File>> {
    /// Create (truncate) the log file at `path` and write the header
    pub fn create(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        let open_failed = |source| CaptureError::LogOpenFailed {
            path: path.display().to_string(),
            source,
        };

        let file = File::create(path).map_err(open_failed)?;
        Self::new(BufWriter::new(file)).map_err(open_failed)
    }
}

impl<W: Write> CsvEmitter<W> {
    /// Wrap a writer and write the header line
    pub fn new(mut writer: W) -> io::Result<Self> {
        writeln!(writer, "{}", CSV_HEADER)?;
        writer.flush()?;
        Ok(Self { writer, written: 0 })
    }

    /// Records written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Unwrap the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordEmitter for CsvEmitter<W> {
    fn append(&mut self, record: &Record) -> io::Result<()> {
        writeln!(self.writer, "{}", record)?;
        // Each line reaches the file before the next read
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Keeps records in memory
#[derive(Debug, Default)]
pub struct MemoryEmitter {
    /// Records in arrival order
    pub records: Vec<Record>,
}

impl MemoryEmitter {
    /// Create an empty emitter
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordEmitter for MemoryEmitter {
    fn append(&mut self, record: &Record) -> io::Result<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PayloadExtract;

    fn time(h: u32, m: u32, s: u32, ms: u32) -> NaiveTime {
        NaiveTime::from_hms_milli_opt(h, m, s, ms).unwrap()
    }

    #[test]
    fn test_csv_layout() {
        let mut emitter = CsvEmitter::new(Vec::new()).unwrap();
        emitter
            .append(&Record::new(
                time(12, 0, 1, 5),
                PayloadExtract([0x0A, 0x1B, 0x2C, 0x3D, 0x4E]),
            ))
            .unwrap();
        assert_eq!(emitter.written(), 1);

        let text = String::from_utf8(emitter.into_inner()).unwrap();
        assert_eq!(
            text,
            "Timp sistem,octeti specifici (Wh)\n12:00:01.005,0A1B2C3D4E Wh\n"
        );
    }

    #[test]
    fn test_manual_clock_steps() {
        let mut clock = ManualClock::new(time(23, 59, 59, 900), 100);
        assert_eq!(clock.now(), time(23, 59, 59, 900));
        assert_eq!(clock.now(), time(0, 0, 0, 0));
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let err = CsvEmitter::create("/nonexistent-dir/for/sure/output.csv")
            .err()
            .unwrap();
        assert!(matches!(err, CaptureError::LogOpenFailed { .. }));
    }
}
