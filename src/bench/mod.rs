//! Benchmark engine module
//!
//! Throughput passes, striping comparison and the batch drivers built on
//! them.

pub mod batch;
pub mod striping;
pub mod throughput;

// Re-export commonly used types
pub use batch::{BenchmarkBatch, FixedSizes, LargeFileBatch, SizeSampler, UniformSizeSampler};
pub use striping::StripingController;
pub use throughput::{block_count, CacheControl, ThroughputBenchmark};
