//! Benchmarks for waveform rendering and interpolated reads.

use std::hint::black_box;

use additive_synth::{
    dsp::{HarmonicTable, Waveform},
    NUM_ADDITIVE_FREQS,
};
use criterion::{BenchmarkId, Criterion};

use crate::BLOCK_SIZES;

pub fn bench_waveform(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/waveform");
    let table = HarmonicTable::new(48_000.0);

    // Control path: summing all 64 harmonics into one cycle
    let levels: Vec<f32> = (0..NUM_ADDITIVE_FREQS).map(|i| 1.0 / (i + 1) as f32).collect();
    let mut waveform = Waveform::for_table(&table);
    group.bench_function("rebuild_64", |b| {
        b.iter(|| waveform.rebuild(black_box(&levels), &table))
    });

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];
        let step = 37.3; // roughly A4 relative to the lowest note

        group.bench_with_input(BenchmarkId::new("interpolated_read", size), &size, |b, _| {
            let mut phase = 0.0f32;
            let len = waveform.len() as f32;
            b.iter(|| {
                for out in buffer.iter_mut() {
                    *out = waveform.interpolated_sample(phase);
                    phase += step;
                    if phase >= len {
                        phase -= len;
                    }
                }
                black_box(&buffer);
            })
        });
    }

    group.finish();
}
