//! Results persistence module
//!
//! Each benchmark run is written to its own timestamped JSON record in the
//! results directory.

use crate::models::{BenchmarkResult, BenchmarkRun};
use crate::{LustreBenchError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const RECORD_VERSION: u32 = 1;
const RECORD_PREFIX: &str = "results_";

/// Results storage manager
#[derive(Debug, Clone)]
pub struct ResultsStorage {
    results_dir: PathBuf,
}

/// Results file structure for JSON persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    pub mount_point: PathBuf,
    pub tests: Vec<TestRecord>,
}

/// Write and read figures for one size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    pub size_mb: u64,
    pub write: PhaseRecord,
    pub read: PhaseRecord,
}

/// Duration in seconds and throughput in MB/s
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub duration: f64,
    pub throughput: f64,
}

impl From<&BenchmarkResult> for PhaseRecord {
    fn from(result: &BenchmarkResult) -> Self {
        Self {
            duration: result.duration_secs(),
            throughput: result.throughput_mbps(),
        }
    }
}

impl From<&BenchmarkRun> for RunRecord {
    fn from(run: &BenchmarkRun) -> Self {
        Self {
            version: RECORD_VERSION,
            timestamp: run.timestamp,
            mount_point: run.mount_path.clone(),
            tests: run
                .entries
                .iter()
                .map(|e| TestRecord {
                    size_mb: e.size_mb,
                    write: PhaseRecord::from(&e.write),
                    read: PhaseRecord::from(&e.read),
                })
                .collect(),
        }
    }
}

impl ResultsStorage {
    /// Create a results storage manager rooted at `results_dir`
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    /// Get results directory for external access
    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Write a run to `results_<stamp>.json`, creating the directory if needed
    pub fn persist(&self, run: &BenchmarkRun) -> Result<PathBuf> {
        fs::create_dir_all(&self.results_dir).map_err(|e| {
            LustreBenchError::PersistenceError(format!(
                "Failed to create results directory {}: {}",
                self.results_dir.display(),
                e
            ))
        })?;

        let path = self.unused_path(&run.file_stamp());
        let content = serde_json::to_string_pretty(&RunRecord::from(run))?;

        fs::write(&path, content).map_err(|e| {
            LustreBenchError::PersistenceError(format!(
                "Failed to write results file {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::info!(path = %path.display(), tests = run.entries.len(), "results saved");
        Ok(path)
    }

    /// Load one record
    pub fn load(&self, path: &Path) -> Result<RunRecord> {
        let content = fs::read_to_string(path).map_err(|e| {
            LustreBenchError::PersistenceError(format!(
                "Failed to read results file {}: {}",
                path.display(),
                e
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            LustreBenchError::PersistenceError(format!(
                "Failed to parse results file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// All record files, oldest first
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.results_dir.exists() {
            return Ok(Vec::new());
        }

        let mut records: Vec<PathBuf> = fs::read_dir(&self.results_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension().is_some_and(|ext| ext == "json")
                    && p.file_name()
                        .is_some_and(|n| n.to_string_lossy().starts_with(RECORD_PREFIX))
            })
            .collect();
        records.sort();
        Ok(records)
    }

    /// Two runs in the same second must not overwrite each other
    fn unused_path(&self, stamp: &str) -> PathBuf {
        let base = self
            .results_dir
            .join(format!("{}{}.json", RECORD_PREFIX, stamp));
        if !base.exists() {
            return base;
        }
        (1..)
            .map(|n| {
                self.results_dir
                    .join(format!("{}{}_{}.json", RECORD_PREFIX, stamp, n))
            })
            .find(|p| !p.exists())
            .unwrap_or(base)
    }
}
