use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use meterlog_core::{
    constants::FRAME_SIZE,
    encoder::FrameBuilder,
    scanner::{scan_chunk, scan_stream_with_stats, StreamScanner},
    PayloadExtract,
};

fn make_stream(num_frames: usize, noise_len: usize) -> Vec<u8> {
    let mut stream = Vec::new();
    for i in 0..num_frames {
        let value = (i as u64).to_be_bytes();
        let frame = FrameBuilder::new()
            .extract(PayloadExtract([value[3], value[4], value[5], value[6], value[7]]))
            .build()
            .unwrap();
        stream.extend_from_slice(&frame);
        // line noise between frames
        stream.extend(std::iter::repeat(0x55).take(noise_len));
    }
    stream
}

fn bench_scanner(c: &mut Criterion) {
    let mut group = c.benchmark_group("scanner");

    for &noise_len in &[0usize, 16, 256] {
        let stream = make_stream(500, noise_len);
        group.throughput(Throughput::Bytes(stream.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("scan_stream_with_stats", noise_len),
            &stream,
            |b, data| {
                b.iter(|| {
                    let res = scan_stream_with_stats(data);
                    criterion::black_box(res);
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("stream_scanner_110b_reads", noise_len),
            &stream,
            |b, data| {
                b.iter(|| {
                    let mut scanner = StreamScanner::new();
                    let mut found = 0;
                    for chunk in data.chunks(FRAME_SIZE) {
                        scanner.push(chunk);
                        found += scanner.drain_frames().len();
                    }
                    criterion::black_box(found);
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("scan_chunk_110b_reads", noise_len),
            &stream,
            |b, data| {
                b.iter(|| {
                    for chunk in data.chunks(FRAME_SIZE) {
                        criterion::black_box(scan_chunk(chunk));
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_scanner);
criterion_main!(benches);
