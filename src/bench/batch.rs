//! Batch drivers
//!
//! [`BenchmarkBatch`] sweeps the throughput benchmark over a list of sizes.
//! [`LargeFileBatch`] fills a directory with randomly sized archives.

use crate::bench::throughput::ThroughputBenchmark;
use crate::exec::CommandRunner;
use crate::io::LargeFileGenerator;
use crate::models::{BenchmarkRun, GeneratedArtifact, GeneratedFileSpec, SizeEntry};
use crate::util::units::{self, BlockSize};
use crate::{LustreBenchError, Result};
use chrono::{Local, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, Instrument, Span};

fn progress_bar(len: u64, visible: bool, unit: &str) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    let template = format!("{{spinner}} [{{bar:30}}] {{pos}}/{{len}} {} {{msg}}", unit);
    if let Ok(style) = ProgressStyle::with_template(&template) {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

/// Write-then-read sweep over several sizes
pub struct BenchmarkBatch<'a, R> {
    bench: &'a ThroughputBenchmark<R>,
    block_size: BlockSize,
    show_progress: bool,
}

impl<'a, R: CommandRunner> BenchmarkBatch<'a, R> {
    pub fn new(bench: &'a ThroughputBenchmark<R>, block_size: BlockSize) -> Self {
        Self {
            bench,
            block_size,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Run every size in order, write before read. The first failure ends the
    /// batch; entries gathered so far are discarded with it.
    pub async fn run_batch(&self, sizes_mb: &[u64]) -> Result<BenchmarkRun> {
        self.sweep(sizes_mb)
            .instrument(self.bench.span().clone())
            .await
    }

    async fn sweep(&self, sizes_mb: &[u64]) -> Result<BenchmarkRun> {
        let timestamp = Utc::now();
        info!(sizes = ?sizes_mb, block_size = %self.block_size, "starting throughput batch");

        let bar = progress_bar(sizes_mb.len() as u64, self.show_progress, "sizes");
        let mut entries = Vec::with_capacity(sizes_mb.len());

        for &size_mb in sizes_mb {
            bar.set_message(format!("{} MB", size_mb));
            match self.measure(size_mb).await {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    bar.abandon_with_message(format!("failed at {} MB", size_mb));
                    error!(size_mb, error = %e, "throughput batch aborted");
                    return Err(e);
                }
            }
            bar.inc(1);
        }

        bar.finish_and_clear();
        info!(sizes = entries.len(), "throughput batch complete");
        Ok(BenchmarkRun::new(
            timestamp,
            self.bench.mount_path().to_path_buf(),
            entries,
        ))
    }

    async fn measure(&self, size_mb: u64) -> Result<SizeEntry> {
        let write = self.bench.write_test(size_mb, &self.block_size).await?;
        let read = self.bench.read_test(size_mb, &self.block_size).await?;
        Ok(SizeEntry {
            size_mb,
            write,
            read,
        })
    }
}

/// Source of target sizes, in GB, for generated files
pub trait SizeSampler {
    fn sample(&mut self) -> u64;
}

/// Uniform integer sizes in `[min_gb, max_gb]`
#[derive(Debug, Clone)]
pub struct UniformSizeSampler {
    rng: SmallRng,
    min_gb: u64,
    max_gb: u64,
}

impl UniformSizeSampler {
    /// Seeded samplers repeat their size sequence; unseeded ones draw from OS entropy
    pub fn new(min_gb: u64, max_gb: u64, seed: Option<u64>) -> Result<Self> {
        if min_gb == 0 || min_gb > max_gb {
            return Err(LustreBenchError::ConfigError(format!(
                "Invalid size range {}..={} GB",
                min_gb, max_gb
            )));
        }
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Ok(Self { rng, min_gb, max_gb })
    }
}

impl SizeSampler for UniformSizeSampler {
    fn sample(&mut self) -> u64 {
        self.rng.gen_range(self.min_gb..=self.max_gb)
    }
}

/// Predetermined sizes, repeated when exhausted
#[derive(Debug, Clone)]
pub struct FixedSizes {
    sizes: Vec<u64>,
    next: usize,
}

impl FixedSizes {
    pub fn new(sizes: Vec<u64>) -> Self {
        Self { sizes, next: 0 }
    }
}

impl SizeSampler for FixedSizes {
    fn sample(&mut self) -> u64 {
        if self.sizes.is_empty() {
            return 0;
        }
        let size = self.sizes[self.next % self.sizes.len()];
        self.next += 1;
        size
    }
}

/// `test_file_<NN>_<size>GB.tgz`, 1-based and zero-padded to two digits
pub fn file_name(index: usize, size_gb: u64) -> String {
    format!("test_file_{:02}_{}GB.tgz", index, size_gb)
}

/// Generates `count` archives of sampled size into one directory
pub struct LargeFileBatch<S> {
    generator: LargeFileGenerator,
    sampler: S,
    count: usize,
    output_dir: PathBuf,
    show_progress: bool,
    span: Span,
}

impl<S: SizeSampler> LargeFileBatch<S> {
    pub fn new(
        generator: LargeFileGenerator,
        sampler: S,
        count: usize,
        output_dir: impl Into<PathBuf>,
        span: Span,
    ) -> Self {
        Self {
            generator,
            sampler,
            count,
            output_dir: output_dir.into(),
            show_progress: false,
            span,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Generate files one after another. Stops at the first failure; files
    /// already completed stay on disk.
    pub fn run(&mut self) -> Result<Vec<GeneratedArtifact>> {
        let span = self.span.clone();
        let _enter = span.enter();

        fs::create_dir_all(&self.output_dir).map_err(|e| {
            LustreBenchError::Resource(format!(
                "Failed to create output directory {}: {}",
                self.output_dir.display(),
                e
            ))
        })?;

        let started_at = Local::now();
        let start = Instant::now();
        info!(
            count = self.count,
            output_dir = %self.output_dir.display(),
            started = %started_at.format("%Y-%m-%d %H:%M:%S"),
            "starting file generation"
        );

        let bar = progress_bar(self.count as u64, self.show_progress, "files");
        let mut artifacts = Vec::with_capacity(self.count);

        for index in 1..=self.count {
            let size_gb = self.sampler.sample();
            let name = file_name(index, size_gb);
            let spec = GeneratedFileSpec::new(self.output_dir.join(&name), size_gb);
            info!(file = %name, index, count = self.count, target = %format!("{} GB", size_gb), "generating");
            bar.set_message(name.clone());

            let item_start = Instant::now();
            match self.generator.generate(&spec) {
                Ok(artifact) => {
                    info!(
                        file = %name,
                        elapsed = %units::format_duration(item_start.elapsed()),
                        "file complete"
                    );
                    artifacts.push(artifact);
                    bar.inc(1);
                }
                Err(e) => {
                    bar.abandon_with_message(format!("failed: {}", name));
                    error!(file = %name, completed = artifacts.len(), "file generation aborted");
                    return Err(LustreBenchError::GenerationAborted {
                        file: name,
                        source: Box::new(e),
                    });
                }
            }
        }

        bar.finish_and_clear();
        let elapsed = start.elapsed();
        info!(
            files = artifacts.len(),
            started = %started_at.format("%Y-%m-%d %H:%M:%S"),
            finished = %Local::now().format("%Y-%m-%d %H:%M:%S"),
            elapsed = %units::format_duration(elapsed),
            hours = %format!("{:.2}", elapsed.as_secs_f64() / 3600.0),
            "file generation complete"
        );
        Ok(artifacts)
    }
}
