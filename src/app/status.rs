use super::factory::Services;
use crate::cache::{CacheStats, ResponseCache};
use anyhow::Result;
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreReport {
    pub backend: String,
    pub entries: u64,
    pub bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    pub sessions: u64,
    pub session_backend: String,
    pub narrative_cache: StoreReport,
    pub image_cache: StoreReport,
}

async fn store_report(cache: &ResponseCache) -> Result<StoreReport> {
    let CacheStats { entries, bytes } = cache.stats().await?;
    Ok(StoreReport {
        backend: cache.store().name().to_string(),
        entries,
        bytes,
    })
}

pub async fn collect_stats(services: &Services) -> Result<StatsReport> {
    let sessions = services.engine.sessions();
    Ok(StatsReport {
        sessions: sessions.count().await?,
        session_backend: sessions.name().to_string(),
        narrative_cache: store_report(services.engine.narrator().cache()).await?,
        image_cache: store_report(services.images.cache()).await?,
    })
}

#[allow(clippy::cast_precision_loss)]
fn mebibytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

pub fn render_status(report: &StatsReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Sessions:        {} ({})",
        report.sessions, report.session_backend
    );
    for (label, store) in [
        ("Continuations:", &report.narrative_cache),
        ("Images:", &report.image_cache),
    ] {
        let _ = writeln!(
            out,
            "{label:<16} {} entries, {:.2} MiB ({})",
            store.entries,
            mebibytes(store.bytes),
            store.backend
        );
    }
    out
}
