//! Utility functions module
//!
//! Contains helpers for size units, block sizes and human-readable
//! formatting.

pub mod units;

// Re-export commonly used functions
pub use units::{
    bytes_to_gb, format_bytes, format_duration, format_throughput, throughput_mbps, BlockSize,
    GIB, KIB, MIB,
};
