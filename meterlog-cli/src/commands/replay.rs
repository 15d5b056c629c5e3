use anyhow::{Context, Result};
use meterlog_core::{
    emitter::CsvEmitter,
    poller::{PollSummary, Poller, PollerConfig},
    source::{EofPolicy, ReaderSource},
};
use std::fs::File;
use std::sync::atomic::AtomicBool;
use tracing::info;

/// Feed a raw capture file through the poll loop, as if read from the port
///
/// The file is consumed in `config.chunk_size` reads; records are stamped
/// with the current time.
pub fn execute(input: &str, output: &str, config: PollerConfig) -> Result<PollSummary> {
    info!("Replaying {} into {}", input, output);

    let file =
        File::open(input).with_context(|| format!("Failed to open input file: {}", input))?;
    let source = ReaderSource::new(file, EofPolicy::Exhausted);
    let emitter = CsvEmitter::create(output)?;

    let mut poller = Poller::new(source, emitter, config);
    let summary = poller
        .run(&AtomicBool::new(false))
        .with_context(|| format!("Replay of {} failed", input))?;

    info!(
        "Replay complete: {} frames logged to {}",
        summary.frames_accepted, output
    );

    Ok(summary)
}
