//! Sequential throughput benchmark
//!
//! Cold-cache `dd` write and read passes with direct I/O. Only the `dd`
//! invocation is timed; the cache drop completes before the clock starts.

use crate::config::BenchConfig;
use crate::exec::{tools, CommandRunner, CommandSpec, Dd};
use crate::models::{BenchmarkResult, Operation};
use crate::util::units::{BlockSize, MIB};
use crate::{LustreBenchError, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn, Instrument, Span};

/// How `dd` block count is derived: `size_mb / block_mb`, remainder dropped.
///
/// A block size that does not divide the size tests a smaller volume than
/// requested; that is reported with a warning, never rounded.
///
/// # Examples
/// ```
/// use lustre_bench::bench::throughput::block_count;
/// use lustre_bench::util::BlockSize;
///
/// assert_eq!(block_count(1024, &BlockSize::parse("1M").unwrap()).unwrap(), 1024);
/// assert_eq!(block_count(20480, &BlockSize::parse("20M").unwrap()).unwrap(), 1024);
/// assert_eq!(block_count(50, &BlockSize::parse("20M").unwrap()).unwrap(), 2);
/// ```
pub fn block_count(size_mb: u64, block_size: &BlockSize) -> Result<u64> {
    let block_mb = block_size.whole_megabytes().ok_or_else(|| {
        LustreBenchError::ConfigError(format!(
            "Block size {} is not a whole number of MiB (at least 1M)",
            block_size
        ))
    })?;
    if size_mb % block_mb != 0 {
        warn!(
            size_mb,
            block_size = %block_size,
            tested_mb = size_mb / block_mb * block_mb,
            "block size does not divide test size, tested volume is truncated"
        );
    }
    Ok(size_mb / block_mb)
}

/// Page-cache invalidation before each timed pass
#[derive(Debug, Clone)]
pub struct CacheControl {
    enabled: bool,
    control_file: PathBuf,
}

impl CacheControl {
    pub fn new(enabled: bool, control_file: impl Into<PathBuf>) -> Self {
        Self {
            enabled,
            control_file: control_file.into(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(false, crate::PAGE_CACHE_CONTROL)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for CacheControl {
    fn default() -> Self {
        Self::new(true, crate::PAGE_CACHE_CONTROL)
    }
}

#[cfg(unix)]
fn running_as_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn running_as_root() -> bool {
    false
}

/// Timed `dd` passes against files on the mount
#[derive(Debug)]
pub struct ThroughputBenchmark<R> {
    runner: R,
    mount_path: PathBuf,
    cache: CacheControl,
    span: Span,
}

impl<R: CommandRunner> ThroughputBenchmark<R> {
    pub fn new(runner: R, mount_path: impl Into<PathBuf>, span: Span) -> Self {
        Self {
            runner,
            mount_path: mount_path.into(),
            cache: CacheControl::default(),
            span,
        }
    }

    /// Benchmark for the configured mount and cache settings
    pub fn from_config(runner: R, config: &BenchConfig, span: Span) -> Self {
        Self::new(runner, config.mount_path.clone(), span).with_cache_control(CacheControl::new(
            config.drop_caches,
            config.page_cache_control.clone(),
        ))
    }

    pub fn with_cache_control(mut self, cache: CacheControl) -> Self {
        self.cache = cache;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn mount_path(&self) -> &Path {
        &self.mount_path
    }

    pub(crate) fn span(&self) -> &Span {
        &self.span
    }

    /// `<mount>/write_test_<size>mb.dat`
    pub fn test_file_path(&self, size_mb: u64) -> PathBuf {
        self.mount_path.join(format!("write_test_{}mb.dat", size_mb))
    }

    /// `sync`, then drop page cache, dentries and inodes
    pub async fn drop_caches(&self) -> Result<()> {
        if !self.cache.enabled {
            debug!("page cache drop disabled");
            return Ok(());
        }
        if !running_as_root() {
            warn!(
                control_file = %self.cache.control_file.display(),
                "not running as root, dropping the page cache will likely fail"
            );
        }
        self.runner.run(&tools::sync()).await?;
        self.runner
            .run(&tools::drop_caches(&self.cache.control_file))
            .await?;
        debug!("page cache dropped");
        Ok(())
    }

    /// Sequential direct-I/O write of `size_mb` to the size's test file
    pub async fn write_test(&self, size_mb: u64, block_size: &BlockSize) -> Result<BenchmarkResult> {
        self.write_pass(size_mb, block_size)
            .instrument(self.span.clone())
            .await
    }

    /// Sequential direct-I/O read of the file a previous `write_test` produced
    pub async fn read_test(&self, size_mb: u64, block_size: &BlockSize) -> Result<BenchmarkResult> {
        self.read_pass(size_mb, block_size)
            .instrument(self.span.clone())
            .await
    }

    async fn write_pass(&self, size_mb: u64, block_size: &BlockSize) -> Result<BenchmarkResult> {
        let file = self.test_file_path(size_mb);
        info!(size_mb, block_size = %block_size, file = %file.display(), "write test");

        let elapsed = self.timed_write(&file, size_mb, block_size).await?;
        let result =
            BenchmarkResult::from_elapsed(size_mb.saturating_mul(MIB), Operation::Write, elapsed)?;
        log_result(&result);
        Ok(result)
    }

    async fn read_pass(&self, size_mb: u64, block_size: &BlockSize) -> Result<BenchmarkResult> {
        let file = self.test_file_path(size_mb);
        if !file.exists() {
            return Err(LustreBenchError::Precondition(format!(
                "test file does not exist: {}",
                file.display()
            )));
        }
        info!(size_mb, block_size = %block_size, file = %file.display(), "read test");

        let count = block_count(size_mb, block_size)?;
        self.drop_caches().await?;
        let elapsed = self.timed(&Dd::read(&file, block_size, count)).await?;
        let result =
            BenchmarkResult::from_elapsed(size_mb.saturating_mul(MIB), Operation::Read, elapsed)?;
        log_result(&result);
        Ok(result)
    }

    /// Cold-cache timed `dd` write of `size_mb` to an arbitrary file
    pub async fn timed_write(&self, file: &Path, size_mb: u64, block_size: &BlockSize) -> Result<Duration> {
        let count = block_count(size_mb, block_size)?;
        self.drop_caches().await?;
        self.timed(&Dd::write(file, block_size, count)).await
    }

    async fn timed(&self, command: &CommandSpec) -> Result<Duration> {
        let start = Instant::now();
        self.runner.run(command).await?;
        let elapsed = start.elapsed();
        debug!(command = %command, elapsed_secs = elapsed.as_secs_f64(), "transfer finished");
        Ok(elapsed)
    }
}

fn log_result(result: &BenchmarkResult) {
    info!(
        operation = %result.operation(),
        size_mb = result.size_mb(),
        "{}",
        result.summary()
    );
}
