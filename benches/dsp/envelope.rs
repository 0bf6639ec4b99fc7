//! Benchmarks for envelope table construction.

use std::hint::black_box;

use additive_synth::dsp::Envelope;
use criterion::Criterion;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    // Longest tables: 500ms segments
    let mut env = Envelope::new(48_000.0);
    group.bench_function("set_adsr_max", |b| {
        b.iter(|| env.set_adsr(black_box(500), black_box(500), 0.5, black_box(500)))
    });

    let mut env = Envelope::new(48_000.0);
    group.bench_function("set_sustain", |b| {
        b.iter(|| env.set_sustain(black_box(0.7)))
    });

    group.finish();
}
