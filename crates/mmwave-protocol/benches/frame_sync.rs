//! Throughput benchmarks for the receive pipeline.
//!
//! ## Running the benchmarks
//!
//! ```bash
//! cargo bench -p mmwave-protocol
//! ```
//!
//! ## Benchmarks included
//!
//! - `synchronize/N_frames` - Frame boundary detection over a captured stream
//! - `pipeline/N_frames` - Synchronize, validate and decode into a cache

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use mmwave_protocol::*;

/// Build a stream of vital-sign reports with line noise between frames.
fn capture(frames: usize) -> Vec<u8> {
    let mut stream = Vec::new();
    for i in 0..frames {
        let (type_code, value) = match i % 3 {
            0 => (TYPE_BREATH_RATE, 14.0f32),
            1 => (TYPE_HEART_RATE, 68.0f32),
            _ => (TYPE_HUMAN_PRESENCE, 1.0f32),
        };
        let payload = if type_code == TYPE_HUMAN_PRESENCE {
            vec![1u8]
        } else {
            value.to_le_bytes().to_vec()
        };
        stream.extend_from_slice(&encode_frame(i as u16, type_code, &payload).unwrap());
        stream.extend_from_slice(&[0x00, 0x55]);
    }
    stream
}

fn bench_synchronize(c: &mut Criterion) {
    let mut group = c.benchmark_group("synchronize");

    for frames in [16usize, 256, 4096].iter() {
        let stream = capture(*frames);
        group.throughput(Throughput::Bytes(stream.len() as u64));

        group.bench_with_input(BenchmarkId::new("frames", frames), &stream, |b, stream| {
            b.iter(|| {
                let mut sync = FrameSynchronizer::new();
                black_box(sync.push(black_box(stream)).len())
            });
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let registry = DecoderRegistry::new(DeviceProfile::mr60bha2());

    for frames in [16usize, 256, 4096].iter() {
        let stream = capture(*frames);
        group.throughput(Throughput::Elements(*frames as u64));

        group.bench_with_input(BenchmarkId::new("frames", frames), &stream, |b, stream| {
            b.iter(|| {
                let mut sync = FrameSynchronizer::new();
                let mut cache = ReadingCache::new();
                for candidate in sync.push(stream) {
                    if let Ok(frame) = validate(&candidate, TypeFilter::Any) {
                        if let Ok(decoded) = registry.decode(frame.type_code, frame.payload) {
                            cache.store(decoded.reading, decoded.valid);
                        }
                    }
                }
                black_box(cache.heart_rate())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_synchronize, bench_pipeline);
criterion_main!(benches);
