use anyhow::Result;
use clap::{Parser, Subcommand};
use meterlog_cli::{commands, ChecksumArg};
use meterlog_core::{
    config::{CaptureConfig, DEFAULT_DEVICE, DEFAULT_OUTPUT},
    constants::{Strictness, DEFAULT_BAUD_RATE, DEFAULT_CHUNK_SIZE, DEFAULT_TIMEOUT_MS},
    poller::PollerConfig,
    validator::FrameValidator,
};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "meterlog")]
#[command(about = "Meterlog - log energy registers from a serial meter stream", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture frames from a serial device into a CSV log
    Capture {
        /// Serial device path or name
        #[arg(short, long, default_value = DEFAULT_DEVICE)]
        device: String,

        /// Output CSV file
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Line speed in baud
        #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
        baud: u32,

        /// Read timeout in milliseconds
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
        timeout_ms: u64,

        #[command(flatten)]
        framing: FramingArgs,

        /// Give up after this many consecutive read errors (default: never)
        #[arg(long)]
        max_read_errors: Option<u32>,
    },

    /// Feed a raw capture file through the capture loop
    Replay {
        /// Raw capture file
        #[arg(short, long)]
        input: String,

        /// Output CSV file
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: String,

        #[command(flatten)]
        framing: FramingArgs,
    },

    /// Scan a raw capture file for every frame
    Scan {
        /// Input file to scan
        #[arg(short, long)]
        input: String,

        /// Output JSON file for found frames
        #[arg(short, long)]
        output: Option<String>,

        /// Show statistics only
        #[arg(long)]
        stats_only: bool,

        /// BCC algorithm used to flag unverified trailers
        #[arg(long, value_enum, default_value_t = ChecksumArg::Xor)]
        checksum: ChecksumArg,
    },

    /// Build a raw capture file from register values
    Synth {
        /// Input JSON file (array of 10-hex-digit values)
        #[arg(short, long)]
        input: String,

        /// Output raw file
        #[arg(short, long)]
        output: String,

        /// Noise bytes written before each frame
        #[arg(long, default_value = "0")]
        noise: usize,

        /// BCC algorithm for the trailers
        #[arg(long, value_enum, default_value_t = ChecksumArg::Xor)]
        checksum: ChecksumArg,
    },
}

/// Options shared by every command that runs the capture loop
#[derive(clap::Args)]
struct FramingArgs {
    /// Bytes requested per read
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Drop frames whose ETX or BCC does not verify
    #[arg(long)]
    strict: bool,

    /// BCC algorithm
    #[arg(long, value_enum, default_value_t = ChecksumArg::Xor)]
    checksum: ChecksumArg,

    /// Scan every read on its own; frames split across reads are lost
    #[arg(long)]
    single_chunk: bool,
}

impl FramingArgs {
    fn strictness(&self) -> Strictness {
        if self.strict {
            Strictness::Strict
        } else {
            Strictness::Lenient
        }
    }

    fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            chunk_size: self.chunk_size.max(1),
            validator: FrameValidator::new(self.strictness(), self.checksum.into()),
            carry_over: !self.single_chunk,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Execute command
    match cli.command {
        Commands::Capture {
            device,
            output,
            baud,
            timeout_ms,
            framing,
            max_read_errors,
        } => {
            let config = CaptureConfig {
                device_path: device,
                output_path: output,
                baud_rate: baud,
                timeout_ms,
                chunk_size: framing.chunk_size,
                strictness: framing.strictness(),
                checksum: framing.checksum.into(),
                max_consecutive_errors: max_read_errors,
                carry_over: !framing.single_chunk,
            };
            let summary = commands::capture::execute(config).await?;
            commands::print_summary(&summary);
        }

        Commands::Replay {
            input,
            output,
            framing,
        } => {
            let summary = commands::replay::execute(&input, &output, framing.poller_config())?;
            commands::print_summary(&summary);
        }

        Commands::Scan {
            input,
            output,
            stats_only,
            checksum,
        } => {
            let validator = FrameValidator::new(Strictness::Lenient, checksum.into());
            commands::scan::execute(&input, output.as_deref(), stats_only, validator)?;
        }

        Commands::Synth {
            input,
            output,
            noise,
            checksum,
        } => {
            commands::synth::execute(&input, &output, noise, checksum.into())?;
        }
    }

    Ok(())
}
