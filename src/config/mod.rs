//! Configuration management module
//!
//! Handles loading, saving, and validation of benchmark configuration.
//! Precedence is defaults, then the TOML file, then environment and
//! command-line overrides applied by the binary.

use crate::util::units::BlockSize;
use crate::{LustreBenchError, Result, APP_NAME, CONFIG_FILE, DEFAULT_MOUNT, PAGE_CACHE_CONTROL, RESULTS_DIR};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod persistence;

/// Benchmark configuration structure containing all test parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Lustre mount / scratch path under test
    pub mount_path: PathBuf,
    /// Where result records and charts go (default `<mount>/performance_results`)
    pub results_dir: Option<PathBuf>,
    /// Batch job input location, logged at startup
    pub input_path: Option<PathBuf>,
    /// Batch job output location, logged at startup
    pub output_path: Option<PathBuf>,
    /// Sizes (MB) for the throughput batch, run in this order
    pub sizes_mb: Vec<u64>,
    /// `dd` block size for the throughput batch
    pub block_size: BlockSize,
    /// Drop the page cache before each timed pass (needs root)
    pub drop_caches: bool,
    /// Pseudo-file written to drop the page cache
    pub page_cache_control: PathBuf,
    /// Per-command timeout, humantime syntax (`"90m"`, `"2h 30m"`)
    pub command_timeout: Option<String>,
    /// Render an SVG chart after the throughput batch
    pub render_chart: bool,
    /// Draw progress bars
    pub show_progress: bool,
    pub stripe: StripeSettings,
    pub generate: GenerateSettings,
}

/// Settings for the striping comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StripeSettings {
    /// Size of each comparison write in GB
    pub size_gb: u64,
    pub block_size: BlockSize,
}

/// Settings for the large-file generation batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateSettings {
    /// Number of files to generate
    pub count: usize,
    /// Smallest file size in GB (inclusive)
    pub min_gb: u64,
    /// Largest file size in GB (inclusive)
    pub max_gb: u64,
    /// Seed for reproducible sizes
    pub seed: Option<u64>,
    /// gzip level, 0-9
    pub compression_level: u32,
    /// Output directory (default: the mount path)
    pub output_dir: Option<PathBuf>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            mount_path: PathBuf::from(DEFAULT_MOUNT),
            results_dir: None,
            input_path: None,
            output_path: None,
            sizes_mb: vec![1024, 2048, 4096, 8192],
            block_size: BlockSize::from_megabytes(1),
            drop_caches: true,
            page_cache_control: PathBuf::from(PAGE_CACHE_CONTROL),
            command_timeout: None,
            render_chart: true,
            show_progress: true,
            stripe: StripeSettings::default(),
            generate: GenerateSettings::default(),
        }
    }
}

impl Default for StripeSettings {
    fn default() -> Self {
        Self {
            size_gb: 20,
            block_size: BlockSize::from_megabytes(20),
        }
    }
}

impl Default for GenerateSettings {
    fn default() -> Self {
        Self {
            count: 24,
            min_gb: 100,
            max_gb: 300,
            seed: None,
            compression_level: 6,
            output_dir: None,
        }
    }
}

impl BenchConfig {
    /// Create a new benchmark configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.sizes_mb.is_empty() {
            return Err(LustreBenchError::ConfigError(
                "At least one test size is required".to_string(),
            ));
        }
        if self.sizes_mb.contains(&0) {
            return Err(LustreBenchError::ConfigError(
                "Test sizes must be greater than 0 MB".to_string(),
            ));
        }

        // dd moves whole blocks, so a block must be a whole number of MiB
        if self.block_size.whole_megabytes().is_none() {
            return Err(LustreBenchError::ConfigError(format!(
                "Block size must be a whole number of MiB (at least 1M), got {}",
                self.block_size
            )));
        }

        if self.stripe.size_gb == 0 {
            return Err(LustreBenchError::ConfigError(
                "Stripe test size must be greater than 0 GB".to_string(),
            ));
        }
        if self.stripe.block_size.whole_megabytes().is_none() {
            return Err(LustreBenchError::ConfigError(format!(
                "Stripe block size must be a whole number of MiB (at least 1M), got {}",
                self.stripe.block_size
            )));
        }

        let gen = &self.generate;
        if gen.count == 0 {
            return Err(LustreBenchError::ConfigError(
                "File count must be greater than 0".to_string(),
            ));
        }
        if gen.min_gb == 0 || gen.min_gb > gen.max_gb {
            return Err(LustreBenchError::ConfigError(format!(
                "Invalid file size range: {}..={} GB",
                gen.min_gb, gen.max_gb
            )));
        }
        if gen.compression_level > 9 {
            return Err(LustreBenchError::ConfigError(format!(
                "Compression level must be between 0 and 9, got {}",
                gen.compression_level
            )));
        }

        self.command_timeout()?;
        Ok(())
    }

    /// Check that the mount path is an existing directory
    pub fn validate_mount(&self) -> Result<()> {
        if !self.mount_path.exists() {
            return Err(LustreBenchError::ConfigError(format!(
                "Mount path does not exist: {}",
                self.mount_path.display()
            )));
        }
        if !self.mount_path.is_dir() {
            return Err(LustreBenchError::ConfigError(format!(
                "Mount path is not a directory: {}",
                self.mount_path.display()
            )));
        }
        Ok(())
    }

    /// Parsed command timeout
    pub fn command_timeout(&self) -> Result<Option<Duration>> {
        self.command_timeout
            .as_deref()
            .map(|text| {
                humantime::parse_duration(text).map_err(|e| {
                    LustreBenchError::ConfigError(format!(
                        "Invalid command timeout '{}': {}",
                        text, e
                    ))
                })
            })
            .transpose()
    }

    /// Directory for result records and charts
    pub fn results_dir(&self) -> PathBuf {
        self.results_dir
            .clone()
            .unwrap_or_else(|| self.mount_path.join(RESULTS_DIR))
    }

    /// Directory for generated archives
    pub fn generate_output_dir(&self) -> PathBuf {
        self.generate
            .output_dir
            .clone()
            .unwrap_or_else(|| self.mount_path.clone())
    }

    /// Set the mount path under test
    pub fn with_mount_path(mut self, path: PathBuf) -> Self {
        self.mount_path = path;
        self
    }

    /// Set the throughput batch sizes
    pub fn with_sizes_mb(mut self, sizes: Vec<u64>) -> Self {
        self.sizes_mb = sizes;
        self
    }

    /// Set the throughput block size
    pub fn with_block_size(mut self, block_size: BlockSize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Enable or disable the page-cache drop
    pub fn with_drop_caches(mut self, enabled: bool) -> Self {
        self.drop_caches = enabled;
        self
    }

    /// Enable or disable progress bars
    pub fn with_show_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// Set the results directory
    pub fn with_results_dir(mut self, dir: PathBuf) -> Self {
        self.results_dir = Some(dir);
        self
    }

    /// Load configuration from the standard config file location
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load configuration from a specific file, defaults if it doesn't exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| {
            LustreBenchError::ConfigError(format!(
                "Failed to read config file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            LustreBenchError::ConfigError(format!(
                "Failed to parse config file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a file, creating its directory
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                LustreBenchError::ConfigError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| {
            LustreBenchError::ConfigError(format!(
                "Failed to write config file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Get the standard configuration file path
    /// Uses $CONFIG_HOME/lustre-bench/lustre-bench.toml
    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            LustreBenchError::ConfigError("Unable to determine config directory".to_string())
        })?;

        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}
