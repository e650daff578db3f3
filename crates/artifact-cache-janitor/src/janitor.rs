//! One maintenance pass over the artifact cache

use crate::config::JanitorConfig;
use crate::error::Result;
use artifact_lru_cache::{ArtifactCache, CacheStats, EvictionReport};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// Summary printed at the end of a run
#[derive(Debug, Serialize)]
pub struct JanitorReport {
    pub checked_at: DateTime<Utc>,
    pub base_directory: String,
    /// Entries dropped because their files were missing
    pub dropped: Vec<u64>,
    pub eviction: Option<EvictionReport<u64>>,
    pub stats: CacheStats,
}

/// Open the cache, optionally reconcile it, enforce the budget and save.
pub async fn run(config: JanitorConfig) -> Result<JanitorReport> {
    let cache = ArtifactCache::<u64>::open(config.cache).await?;

    let dropped = if config.verify {
        let dropped = cache.verify().await;
        info!(dropped = dropped.len(), "Reconciled cache with disk");
        dropped
    } else {
        Vec::new()
    };

    let eviction = cache.enforce_budget().await;
    if let Some(report) = &eviction {
        info!(
            evicted = report.evicted.len(),
            failures = report.failures.len(),
            total_bytes = report.total_bytes,
            budget = report.budget,
            "Budget enforced"
        );
    }

    cache.save().await?;
    let stats = cache.stats().await?;

    Ok(JanitorReport {
        checked_at: Utc::now(),
        base_directory: cache.base_directory().await.display().to_string(),
        dropped,
        eviction,
        stats,
    })
}
