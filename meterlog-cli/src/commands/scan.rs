use anyhow::{Context, Result};
use meterlog_core::{
    scanner::{scan_stream_with_stats, LocatedFrame},
    validator::FrameValidator,
    PayloadExtract,
};
use serde::Serialize;
use std::fs;
use tracing::{info, warn};

/// One frame found by an offline scan
#[derive(Debug, Serialize)]
pub struct ScannedFrame {
    /// Marker offset in the file
    pub offset: usize,
    /// Energy register
    pub extract: PayloadExtract,
    /// Unit of the register
    pub unit: &'static str,
    /// ETX byte as received
    pub etx: u8,
    /// BCC byte as received
    pub bcc: u8,
    /// Whether ETX and BCC verified
    pub trailer_ok: bool,
}

fn to_scanned(located: &LocatedFrame, validator: &FrameValidator) -> ScannedFrame {
    let extract = located.frame.extract();
    let trailer_ok = match validator.validate(&located.frame) {
        Ok(verdict) => verdict.is_clean(),
        Err(e) => {
            warn!("Frame at offset {} failed validation: {}", located.offset, e);
            false
        }
    };

    ScannedFrame {
        offset: located.offset,
        extract,
        unit: extract.unit(),
        etx: located.frame.trailer.etx,
        bcc: located.frame.trailer.bcc,
        trailer_ok,
    }
}

/// Scan a raw capture file for every frame and report what was found
pub fn execute(
    input: &str,
    output: Option<&str>,
    stats_only: bool,
    validator: FrameValidator,
) -> Result<Vec<ScannedFrame>> {
    info!("Scanning file: {}", input);

    let data = fs::read(input).with_context(|| format!("Failed to read input file: {}", input))?;

    info!("File size: {} bytes", data.len());

    let (located_frames, stats) = scan_stream_with_stats(&data);

    println!("\n=== Scan Results ===");
    println!("Bytes scanned:     {} bytes", stats.bytes_scanned);
    println!("Markers found:     {}", stats.markers_found);
    println!("Complete frames:   {}", stats.frames_found);
    println!("Incomplete tail:   {} bytes", stats.incomplete_tail);
    println!("Truncated frames:  {}", stats.truncated_frames);
    println!("Bytes recovered:   {} bytes", stats.bytes_recovered);
    println!("Recovery rate:     {:.2}%", stats.recovery_rate());
    println!();

    let scanned: Vec<ScannedFrame> = located_frames
        .iter()
        .map(|lf| to_scanned(lf, &validator))
        .collect();

    if stats_only {
        return Ok(scanned);
    }

    if let Some(output_path) = output {
        let json = serde_json::to_string_pretty(&scanned)
            .with_context(|| "Failed to serialize scanned frames")?;

        fs::write(output_path, json)
            .with_context(|| format!("Failed to write output file: {}", output_path))?;

        info!("Scanned frames written to: {}", output_path);
    } else {
        println!("=== Frames ===");
        for frame in &scanned {
            println!(
                "@ offset {}: {} {} (ETX {:02X}, BCC {:02X}{})",
                frame.offset,
                frame.extract,
                frame.unit,
                frame.etx,
                frame.bcc,
                if frame.trailer_ok { "" } else { ", unverified" }
            );
        }
    }

    Ok(scanned)
}
