use crate::serial;
use anyhow::{Context, Result};
use meterlog_core::{
    config::CaptureConfig,
    emitter::CsvEmitter,
    poller::{PollSummary, Poller},
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Capture frames from the serial port until Ctrl-C
///
/// The poll loop runs on a blocking thread; the signal handler only raises
/// the cancellation flag, so the loop exits after its current read and
/// flushes the log on the way out.
pub async fn execute(config: CaptureConfig) -> Result<PollSummary> {
    config.validate()?;
    debug!(
        "Capture configuration: {}",
        serde_json::to_string(&config).with_context(|| "Failed to serialize configuration")?
    );

    let source = serial::open(&config)?;
    let emitter = CsvEmitter::create(&config.output_path)?;

    info!(
        "Logging {} to {} (Ctrl-C to stop)",
        config.device_path,
        config.output_path.display()
    );

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    let poller_config = config.poller_config();

    let mut task = tokio::task::spawn_blocking(move || {
        let mut poller = Poller::new(source, emitter, poller_config);
        poller.run(&flag)
    });

    let joined = tokio::select! {
        res = &mut task => res,
        Ok(()) = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            cancel.store(true, Ordering::Release);
            task.await
        }
    };

    let summary = joined.with_context(|| "Capture thread panicked")??;
    info!("Capture stopped, {} records written", summary.frames_accepted);
    Ok(summary)
}
