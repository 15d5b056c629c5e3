use anyhow::{Context, Result};
use meterlog_core::{constants::ChecksumKind, encoder::FrameBuilder, PayloadExtract};
use std::fs;
use tracing::info;

/// Noise byte written between synthetic frames
pub const NOISE_BYTE: u8 = 0x55;

/// Build a raw capture from a JSON array of 10-hex-digit register values
///
/// `noise` filler bytes are written before every frame, so the result also
/// exercises resynchronisation on leading noise.
pub fn execute(input: &str, output: &str, noise: usize, checksum: ChecksumKind) -> Result<usize> {
    info!("Synthesizing frames from {} to {}", input, output);

    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input))?;

    let values: Vec<String> =
        serde_json::from_str(&content).with_context(|| "Failed to parse JSON input")?;

    info!("Found {} values to encode", values.len());

    let mut output_data = Vec::new();

    for (i, value) in values.iter().enumerate() {
        let extract: PayloadExtract = value
            .parse()
            .with_context(|| format!("Value {} ({:?}) is not 10 hex digits", i, value))?;

        let frame = FrameBuilder::new()
            .extract(extract)
            .checksum(checksum)
            .build()
            .with_context(|| format!("Failed to build frame {}", i))?;

        output_data.extend(std::iter::repeat(NOISE_BYTE).take(noise));
        output_data.extend_from_slice(&frame);
    }

    fs::write(output, &output_data)
        .with_context(|| format!("Failed to write output file: {}", output))?;

    info!(
        "Successfully wrote {} frames ({} bytes total)",
        values.len(),
        output_data.len()
    );

    Ok(values.len())
}
