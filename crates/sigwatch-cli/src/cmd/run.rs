//! Run command

use std::sync::Arc;

use anyhow::{Context, Result};
use sigwatch_core::{Config, Monitor, RunReport};

use crate::ui::ConsoleReporter;

/// Snapshot the index and verify up to `limit` versions.
pub async fn run(config: Config, limit: Option<usize>, verbose: bool) -> Result<RunReport> {
    let root = config.root.clone();
    tracing::debug!(root = %root.display(), ?limit, "starting run");
    let reporter = Arc::new(ConsoleReporter::new(verbose));
    let monitor = Monitor::new(config, reporter)
        .with_context(|| format!("Failed to set up monitor at {}", root.display()))?;

    monitor.run(limit).await.context("Run aborted")
}
