//! Reporting module
//!
//! Console summaries of finished runs and the optional throughput chart.

pub mod chart;

pub use chart::{chart_file_name, is_available, render_chart};

use crate::models::{BenchmarkRun, StripeComparison};
use crate::util::units;

/// Fixed-width table of one run, one row per size
pub fn run_summary(run: &BenchmarkRun) -> String {
    let mut out = format!(
        "Mount: {}\nStarted: {}\n\n{:>10}  {:>10}  {:>14}  {:>10}  {:>14}\n",
        run.mount_path.display(),
        run.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        "Size (MB)",
        "Write (s)",
        "Write",
        "Read (s)",
        "Read"
    );
    for entry in &run.entries {
        out.push_str(&format!(
            "{:>10}  {:>10.2}  {:>14}  {:>10.2}  {:>14}\n",
            entry.size_mb,
            entry.write.duration_secs(),
            units::format_throughput(entry.write.throughput_mbps()),
            entry.read.duration_secs(),
            units::format_throughput(entry.read.throughput_mbps()),
        ));
    }
    out
}

/// Before/after lines of a striping comparison
pub fn stripe_summary(comparison: &StripeComparison) -> String {
    format!(
        "Without striping: {:.2}s\nWith striping:    {:.2}s\nSpeed-up:         {:.2}x\n",
        comparison.before_secs, comparison.after_secs, comparison.speedup
    )
}
