//! Subcommand implementations

pub mod capture;
pub mod replay;
pub mod scan;
pub mod synth;

use colored::*;
use meterlog_core::poller::PollSummary;

/// Print the counters of a finished poll session
pub fn print_summary(summary: &PollSummary) {
    println!("\n=== Capture Summary ===");
    println!("Chunks read:       {}", summary.chunks);
    println!("Bytes read:        {} bytes", summary.bytes);
    println!("Timeouts:          {}", summary.timeouts);
    if summary.read_errors > 0 {
        println!("Read errors:       {}", summary.read_errors.to_string().red());
    } else {
        println!("Read errors:       {}", summary.read_errors);
    }
    println!("Frames logged:     {}", summary.frames_accepted.to_string().green());
    if summary.frames_rejected > 0 {
        println!("Frames rejected:   {}", summary.frames_rejected.to_string().yellow());
    } else {
        println!("Frames rejected:   {}", summary.frames_rejected);
    }
    println!("Incomplete chunks: {}", summary.incomplete);
    println!("Chunks w/o sync:   {}", summary.no_sync);
    println!();
}
