//! Benchmarks for rendering chords through the synthesizer.
//!
//! All four oscillators carry a full harmonic stack, the worst case for
//! per-voice cost.

use std::hint::black_box;

use additive_synth::{SynthConfig, Synthesizer, NUM_ADDITIVE_FREQS, NUM_OSCILLATORS};
use criterion::{BenchmarkId, Criterion};

use crate::BLOCK_SIZES;

fn full_synth() -> Synthesizer {
    let mut synth = Synthesizer::new(SynthConfig::with_sample_rate(48_000.0));
    let levels: Vec<f32> = (0..NUM_ADDITIVE_FREQS).map(|i| 1.0 / (i + 1) as f32).collect();
    for osc in 0..NUM_OSCILLATORS {
        let osc = synth.oscillator_mut(osc);
        osc.set_additive_levels(&levels);
        // Long sustain so voices never finish mid-benchmark
        osc.envelope_mut().set_adsr(1, 10, 0.8, 500);
    }
    synth
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for &count in &[1usize, 8, 32] {
            let mut synth = full_synth();
            for note in 0..count {
                synth.note_on(36 + note as u8, 0.8);
            }

            group.bench_with_input(
                BenchmarkId::new(format!("{count}_voices"), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        synth.render_block(black_box(&mut buffer));
                    })
                },
            );
        }
    }

    group.finish();
}
