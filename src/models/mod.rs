//! Data models module
//!
//! Contains data structures for benchmark results, generated files and
//! stripe policies.

pub mod result;
pub mod target;

// Re-export commonly used types
pub use result::{BenchmarkResult, BenchmarkRun, Operation, SizeEntry, StripeComparison};
pub use target::{GeneratedArtifact, GeneratedFileSpec, StripePolicy};
