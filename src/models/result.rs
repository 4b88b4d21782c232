//! Benchmark result data models
//!
//! Contains the per-pass measurement, the per-size write/read pair, the
//! whole batch run and the striping comparison.

use crate::util::units::{self, MIB};
use crate::{LustreBenchError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Direction of a timed transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Write,
    Read,
}

impl Operation {
    /// Get a human-readable description of the operation
    pub fn description(&self) -> &'static str {
        match self {
            Operation::Write => "Sequential Write",
            Operation::Read => "Sequential Read",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Write => f.write_str("write"),
            Operation::Read => f.write_str("read"),
        }
    }
}

/// One timed transfer. Only constructible with a strictly positive duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredResult")]
pub struct BenchmarkResult {
    /// Requested transfer size in bytes
    size_bytes: u64,
    operation: Operation,
    /// Wall-clock seconds around the transfer command
    duration_secs: f64,
    /// Bytes per second
    throughput: f64,
}

/// Serialized form; throughput is recomputed on load
#[derive(Deserialize)]
struct StoredResult {
    size_bytes: u64,
    operation: Operation,
    duration_secs: f64,
}

impl TryFrom<StoredResult> for BenchmarkResult {
    type Error = LustreBenchError;

    fn try_from(stored: StoredResult) -> Result<Self> {
        Self::from_secs(stored.size_bytes, stored.operation, stored.duration_secs)
    }
}

impl BenchmarkResult {
    /// Build a result from a measured elapsed time
    pub fn from_elapsed(size_bytes: u64, operation: Operation, elapsed: Duration) -> Result<Self> {
        Self::from_secs(size_bytes, operation, elapsed.as_secs_f64())
    }

    /// Build a result from a duration in seconds, rejecting zero, negative
    /// and non-finite durations and any non-finite throughput
    pub fn from_secs(size_bytes: u64, operation: Operation, duration_secs: f64) -> Result<Self> {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(LustreBenchError::ZeroDuration(format!(
                "{} of {} took {}s",
                operation,
                units::format_bytes(size_bytes),
                duration_secs
            )));
        }

        let throughput = size_bytes as f64 / duration_secs;
        if !throughput.is_finite() {
            return Err(LustreBenchError::ZeroDuration(format!(
                "{} of {} in {}s gives a non-finite throughput",
                operation,
                units::format_bytes(size_bytes),
                duration_secs
            )));
        }

        Ok(Self {
            size_bytes,
            operation,
            duration_secs,
            throughput,
        })
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn size_mb(&self) -> u64 {
        self.size_bytes / MIB
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Throughput in bytes per second
    pub fn throughput(&self) -> f64 {
        self.throughput
    }

    /// Throughput in MB/s (size in MB over seconds)
    pub fn throughput_mbps(&self) -> f64 {
        self.throughput / MIB as f64
    }

    /// Get a human-readable summary of the result
    pub fn summary(&self) -> String {
        format!(
            "{} - {} - {:.2}s - {:.2} MB/s",
            self.operation.description(),
            units::format_bytes(self.size_bytes),
            self.duration_secs,
            self.throughput_mbps()
        )
    }
}

/// Write and read measurement for one requested size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeEntry {
    pub size_mb: u64,
    pub write: BenchmarkResult,
    pub read: BenchmarkResult,
}

/// Ordered results of one benchmark batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkRun {
    /// When the batch started
    pub timestamp: DateTime<Utc>,
    /// Mount the batch ran against
    pub mount_path: PathBuf,
    /// One entry per requested size, in request order
    pub entries: Vec<SizeEntry>,
}

impl BenchmarkRun {
    pub fn new(timestamp: DateTime<Utc>, mount_path: PathBuf, entries: Vec<SizeEntry>) -> Self {
        Self {
            timestamp,
            mount_path,
            entries,
        }
    }

    /// All measurements in execution order (write then read per size)
    pub fn results(&self) -> impl Iterator<Item = &BenchmarkResult> {
        self.entries.iter().flat_map(|e| [&e.write, &e.read])
    }

    /// (size MB, throughput MB/s) points for one operation
    pub fn series(&self, operation: Operation) -> Vec<(u64, f64)> {
        self.entries
            .iter()
            .map(|e| {
                let result = match operation {
                    Operation::Write => &e.write,
                    Operation::Read => &e.read,
                };
                (e.size_mb, result.throughput_mbps())
            })
            .collect()
    }

    /// Timestamp formatted for artifact file names
    pub fn file_stamp(&self) -> String {
        self.timestamp.format("%Y%m%d_%H%M%S").to_string()
    }
}

/// Write durations before and after switching to all-target striping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredComparison")]
pub struct StripeComparison {
    pub size_gb: u64,
    pub before_secs: f64,
    pub after_secs: f64,
    /// `before_secs / after_secs`, unsmoothed
    pub speedup: f64,
}

#[derive(Deserialize)]
struct StoredComparison {
    size_gb: u64,
    before_secs: f64,
    after_secs: f64,
}

impl TryFrom<StoredComparison> for StripeComparison {
    type Error = LustreBenchError;

    fn try_from(stored: StoredComparison) -> Result<Self> {
        Self::new(stored.size_gb, stored.before_secs, stored.after_secs)
    }
}

impl StripeComparison {
    pub fn new(size_gb: u64, before_secs: f64, after_secs: f64) -> Result<Self> {
        if !after_secs.is_finite() || after_secs <= 0.0 {
            return Err(LustreBenchError::ZeroDuration(format!(
                "striped write took {}s, speed-up is undefined",
                after_secs
            )));
        }
        let speedup = before_secs / after_secs;
        if !speedup.is_finite() {
            return Err(LustreBenchError::ZeroDuration(format!(
                "speed-up {}s / {}s is not finite",
                before_secs, after_secs
            )));
        }

        Ok(Self {
            size_gb,
            before_secs,
            after_secs,
            speedup,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(size_mb: u64, write_secs: f64, read_secs: f64) -> SizeEntry {
        SizeEntry {
            size_mb,
            write: BenchmarkResult::from_secs(size_mb * MIB, Operation::Write, write_secs).unwrap(),
            read: BenchmarkResult::from_secs(size_mb * MIB, Operation::Read, read_secs).unwrap(),
        }
    }

    #[test]
    fn test_throughput_is_size_over_duration() {
        let result = BenchmarkResult::from_secs(1024 * MIB, Operation::Write, 4.0).unwrap();
        assert_eq!(result.size_mb(), 1024);
        assert_eq!(result.throughput_mbps(), 1024.0 / 4.0);
        assert_eq!(result.throughput(), (1024 * MIB) as f64 / 4.0);
    }

    #[test]
    fn test_throughput_mbps_matches_size_mb_over_duration() {
        for (size_mb, secs) in [(1024u64, 0.37), (2048, 3.3), (7, 0.001)] {
            let result = BenchmarkResult::from_secs(size_mb * MIB, Operation::Read, secs).unwrap();
            assert_eq!(result.throughput_mbps(), size_mb as f64 / secs);
        }
    }

    #[test]
    fn test_deserialize_goes_through_duration_guard() {
        let stored = BenchmarkResult::from_secs(1024 * MIB, Operation::Write, 4.0).unwrap();
        let json = serde_json::to_string(&stored).unwrap();
        let loaded: BenchmarkResult = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, stored);

        let zero = r#"{"size_bytes":1024,"operation":"write","duration_secs":0.0,"throughput":1.0}"#;
        let err = serde_json::from_str::<BenchmarkResult>(zero).unwrap_err();
        assert!(err.to_string().contains("Invalid duration"));

        let negative = r#"{"size_bytes":1024,"operation":"read","duration_secs":-2.0}"#;
        assert!(serde_json::from_str::<BenchmarkResult>(negative).is_err());

        let instant_striped = r#"{"size_gb":20,"before_secs":3.0,"after_secs":0.0,"speedup":1.0}"#;
        assert!(serde_json::from_str::<StripeComparison>(instant_striped).is_err());
    }

    #[test]
    fn test_zero_duration_rejected() {
        let err = BenchmarkResult::from_elapsed(MIB, Operation::Write, Duration::ZERO).unwrap_err();
        assert!(matches!(err, LustreBenchError::ZeroDuration(_)));
        assert!(BenchmarkResult::from_secs(MIB, Operation::Read, -1.0).is_err());
        assert!(BenchmarkResult::from_secs(MIB, Operation::Read, f64::NAN).is_err());
        assert!(BenchmarkResult::from_secs(MIB, Operation::Read, f64::INFINITY).is_err());
    }

    #[test]
    fn test_tiny_duration_never_infinite() {
        match BenchmarkResult::from_secs(u64::MAX, Operation::Write, f64::MIN_POSITIVE) {
            Ok(result) => assert!(result.throughput().is_finite()),
            Err(err) => assert!(matches!(err, LustreBenchError::ZeroDuration(_))),
        }
    }

    #[test]
    fn test_summary() {
        let result = BenchmarkResult::from_secs(1024 * MIB, Operation::Read, 2.0).unwrap();
        let summary = result.summary();
        assert!(summary.contains("Sequential Read"));
        assert!(summary.contains("512.00 MB/s"));
    }

    #[test]
    fn test_run_results_order_and_series() {
        let run = BenchmarkRun::new(
            Utc::now(),
            PathBuf::from("/scratch"),
            vec![entry(1024, 2.0, 1.0), entry(2048, 4.0, 2.0)],
        );

        let ops: Vec<_> = run.results().map(|r| (r.size_mb(), r.operation())).collect();
        assert_eq!(
            ops,
            vec![
                (1024, Operation::Write),
                (1024, Operation::Read),
                (2048, Operation::Write),
                (2048, Operation::Read),
            ]
        );
        assert_eq!(run.series(Operation::Write), vec![(1024, 512.0), (2048, 512.0)]);
        assert_eq!(run.series(Operation::Read), vec![(1024, 1024.0), (2048, 1024.0)]);
    }

    #[test]
    fn test_stripe_comparison_exact_ratio() {
        let cmp = StripeComparison::new(20, 30.0, 12.0).unwrap();
        assert_eq!(cmp.speedup, 30.0 / 12.0);

        let err = StripeComparison::new(20, 30.0, 0.0).unwrap_err();
        assert!(matches!(err, LustreBenchError::ZeroDuration(_)));
    }

    #[test]
    fn test_serde_serialization() {
        let run = BenchmarkRun::new(Utc::now(), PathBuf::from("/scratch"), vec![entry(1024, 2.0, 1.0)]);
        let json = serde_json::to_string(&run).expect("Failed to serialize to JSON");
        assert!(json.contains("\"operation\":\"write\""));

        let back: BenchmarkRun = serde_json::from_str(&json).expect("Failed to deserialize");
        assert_eq!(back.entries, run.entries);
        assert_eq!(back.timestamp, run.timestamp);
    }
}
