//! Logging setup
//!
//! The binary installs one subscriber at startup. Components never reach
//! for a global logger configuration; each is handed the span it logs
//! under.

use tracing::{info_span, Span};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` wins over `default_level`.
pub fn init(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A subscriber may already be installed (tests, embedding)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Span for one component working against a mount
pub fn component_span(component: &'static str, mount: &std::path::Path) -> Span {
    info_span!("lustre_bench", component, mount = %mount.display())
}
