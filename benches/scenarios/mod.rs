mod voices;

pub use voices::bench_voices;
