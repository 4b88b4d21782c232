//! Filesystem targets: files to generate and stripe policies to apply

use crate::util::units;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Archive extension of generated files
pub const ARCHIVE_EXTENSION: &str = "tgz";
/// Extension of the payload entry inside the archive
pub const PAYLOAD_EXTENSION: &str = "dat";

/// A zero-filled file to generate and archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFileSpec {
    /// Archive path to produce
    pub path: PathBuf,
    /// Payload size in whole binary gigabytes
    pub size_gb: u64,
}

impl GeneratedFileSpec {
    pub fn new(path: impl Into<PathBuf>, size_gb: u64) -> Self {
        Self {
            path: path.into(),
            size_gb,
        }
    }

    /// Payload bytes for a given size unit (1 GiB in production)
    pub fn payload_bytes(&self, unit_bytes: u64) -> u64 {
        self.size_gb.saturating_mul(unit_bytes)
    }

    /// Name of the archive entry: the target base name with `.tgz` swapped for `.dat`
    ///
    /// # Examples
    /// ```
    /// use lustre_bench::models::GeneratedFileSpec;
    ///
    /// let spec = GeneratedFileSpec::new("/scratch/test_file_01_150GB.tgz", 150);
    /// assert_eq!(spec.entry_name(), "test_file_01_150GB.dat");
    /// ```
    pub fn entry_name(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match Path::new(&name).extension() {
            Some(ext) if ext == ARCHIVE_EXTENSION => Path::new(&name)
                .with_extension(PAYLOAD_EXTENSION)
                .to_string_lossy()
                .into_owned(),
            _ => format!("{}.{}", name, PAYLOAD_EXTENSION),
        }
    }
}

/// Outcome of a successful generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub path: PathBuf,
    pub size_gb: u64,
    /// Uncompressed bytes archived
    pub payload_bytes: u64,
    /// On-disk size of the archive
    pub archive_bytes: u64,
    pub entry_name: String,
}

impl GeneratedArtifact {
    /// Archive size in binary GB
    pub fn archive_gb(&self) -> f64 {
        units::bytes_to_gb(self.archive_bytes)
    }
}

/// Per-directory striping policy. The filesystem is the source of truth;
/// this only describes the change to apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripePolicy {
    /// Number of storage targets, -1 for all available
    pub stripe_count: i64,
    pub path: PathBuf,
}

impl StripePolicy {
    pub const ALL_TARGETS: i64 = -1;

    pub fn new(path: impl Into<PathBuf>, stripe_count: i64) -> Self {
        Self {
            stripe_count,
            path: path.into(),
        }
    }

    /// Stripe across every available OST
    pub fn all_targets(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Self::ALL_TARGETS)
    }

    pub fn uses_all_targets(&self) -> bool {
        self.stripe_count == Self::ALL_TARGETS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::units::GIB;

    #[test]
    fn test_entry_name_strips_archive_extension() {
        let spec = GeneratedFileSpec::new("/scratch/test_file_03_120GB.tgz", 120);
        assert_eq!(spec.entry_name(), "test_file_03_120GB.dat");

        let spec = GeneratedFileSpec::new("/scratch/blob", 1);
        assert_eq!(spec.entry_name(), "blob.dat");
    }

    #[test]
    fn test_payload_bytes() {
        let spec = GeneratedFileSpec::new("/scratch/a.tgz", 3);
        assert_eq!(spec.payload_bytes(GIB), 3 * GIB);
        assert_eq!(spec.payload_bytes(4096), 3 * 4096);
    }

    #[test]
    fn test_archive_gb() {
        let artifact = GeneratedArtifact {
            path: "/scratch/test_file_01_2GB.tgz".into(),
            size_gb: 2,
            payload_bytes: 2 * GIB,
            archive_bytes: GIB / 4,
            entry_name: "test_file_01_2GB.dat".into(),
        };
        assert_eq!(artifact.archive_gb(), 0.25);
    }

    #[test]
    fn test_all_targets_policy() {
        let policy = StripePolicy::all_targets("/scratch");
        assert_eq!(policy.stripe_count, -1);
        assert!(policy.uses_all_targets());
        assert!(!StripePolicy::new("/scratch", 4).uses_all_targets());
    }
}
