//! Criterion benchmarks for rapidgroth live under `benches/`.
