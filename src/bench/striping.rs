//! Lustre striping control and before/after comparison

use crate::bench::throughput::ThroughputBenchmark;
use crate::exec::{CommandRunner, Lfs};
use crate::models::{StripeComparison, StripePolicy};
use crate::util::units::{self, BlockSize};
use crate::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info, Instrument};

/// Queries and changes stripe layouts through `lfs`
#[derive(Debug)]
pub struct StripingController<R> {
    bench: ThroughputBenchmark<R>,
}

impl<R: CommandRunner> StripingController<R> {
    /// Controller sharing the benchmark's runner, cache control and span
    pub fn new(bench: ThroughputBenchmark<R>) -> Self {
        Self { bench }
    }

    pub fn benchmark(&self) -> &ThroughputBenchmark<R> {
        &self.bench
    }

    /// `lfs getstripe` output, verbatim
    pub async fn get_stripe_info(&self, path: &Path) -> Result<String> {
        self.bench.runner().run(&Lfs::getstripe(path)).await
    }

    pub async fn apply_policy(&self, policy: &StripePolicy) -> Result<()> {
        debug!(
            path = %policy.path.display(),
            stripe_count = policy.stripe_count,
            all_targets = policy.uses_all_targets(),
            "applying stripe policy"
        );
        self.bench.runner().run(&Lfs::setstripe(policy)).await?;
        Ok(())
    }

    /// Stripe `path` across every OST and log the resulting layout
    pub async fn set_stripe_all(&self, path: &Path) -> Result<()> {
        self.stripe_all(path)
            .instrument(self.bench.span().clone())
            .await
    }

    async fn stripe_all(&self, path: &Path) -> Result<()> {
        self.apply_policy(&StripePolicy::all_targets(path)).await?;
        let layout = self.get_stripe_info(path).await?;
        info!(path = %path.display(), "striping set to all OSTs\n{}", layout.trim_end());
        Ok(())
    }

    /// `lfs df -h` output, verbatim
    pub async fn get_ost_usage(&self) -> Result<String> {
        self.bench.runner().run(&Lfs::df_human()).await
    }

    /// Time a `size_gb` write under the current layout of `path`, then again
    /// after striping it across all OSTs.
    pub async fn compare(&self, path: &Path, size_gb: u64, block_size: &BlockSize) -> Result<StripeComparison> {
        self.compare_layouts(path, size_gb, block_size)
            .instrument(self.bench.span().clone())
            .await
    }

    async fn compare_layouts(&self, path: &Path, size_gb: u64, block_size: &BlockSize) -> Result<StripeComparison> {
        let layout = self.get_stripe_info(path).await?;
        info!(path = %path.display(), "current striping\n{}", layout.trim_end());

        let before = self.timed_phase(path, size_gb, block_size, "no_stripe").await?;
        self.stripe_all(path).await?;
        let after = self.timed_phase(path, size_gb, block_size, "with_stripe").await?;

        let comparison = StripeComparison::new(size_gb, before, after)?;
        info!(
            size_gb,
            before = %format!("{:.2}s", comparison.before_secs),
            after = %format!("{:.2}s", comparison.after_secs),
            speedup = %format!("{:.2}x", comparison.speedup),
            "striping comparison complete"
        );
        Ok(comparison)
    }

    /// One timed write bracketed by OST usage snapshots; elapsed seconds
    async fn timed_phase(&self, dir: &Path, size_gb: u64, block_size: &BlockSize, label: &str) -> Result<f64> {
        let file = phase_file(dir, size_gb, label);
        let size_mb = size_gb.saturating_mul(1024);

        let usage = self.get_ost_usage().await?;
        info!(phase = label, "OST usage before write\n{}", usage.trim_end());

        let elapsed = self
            .bench
            .timed_write(&file, size_mb, block_size)
            .await?
            .as_secs_f64();
        let rate = units::throughput_mbps(size_mb, elapsed)
            .map(units::format_throughput)
            .unwrap_or_else(|| "n/a".to_string());
        info!(
            phase = label,
            file = %file.display(),
            elapsed = %format!("{:.2}s", elapsed),
            throughput = %rate,
            "timed write complete"
        );

        let usage = self.get_ost_usage().await?;
        info!(phase = label, "OST usage after write\n{}", usage.trim_end());

        Ok(elapsed)
    }
}

/// `<dir>/test_<size>gb_<label>`
pub fn phase_file(dir: &Path, size_gb: u64, label: &str) -> PathBuf {
    dir.join(format!("test_{}gb_{}", size_gb, label))
}
