//! Fuzzing entry points for meterlog-core scanning
//!
//! To use with cargo-fuzz:
//! 1. Install cargo-fuzz: cargo install cargo-fuzz
//! 2. Run fuzzer: cargo fuzz run fuzz_scan

use meterlog_core::constants::FRAME_SIZE;

pub fn fuzz_scan(data: &[u8]) {
    use meterlog_core::scanner::{scan_chunk, scan_stream};

    // Try to scan - should never panic
    let _ = scan_chunk(data);
    let _ = scan_stream(data);
}

/// Feed `data` to the carry-over scanner in reads sized by its first byte
pub fn fuzz_stream(data: &[u8]) {
    use meterlog_core::scanner::StreamScanner;

    let Some((&first, rest)) = data.split_first() else {
        return;
    };
    let read_size = usize::from(first).max(1);

    let mut scanner = StreamScanner::new();
    for chunk in rest.chunks(read_size) {
        scanner.push(chunk);
        while scanner.next_frame().is_some() {}
        assert!(scanner.buffered() < FRAME_SIZE);
    }
}
