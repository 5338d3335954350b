use chrono::Utc;
use serde::Serialize;

use crate::error::Result;
use crate::events::{EventSink, PipelineEvent};
use crate::fetch::{self, PostSearch};
use crate::loader::StagingLoader;
use crate::normalize;
use crate::query;
use crate::types::HarvestRequest;

/// Per-run outcome, reported back to the invoking scheduler.
/// `rows_fetched` counts the result set before the stickied filter;
/// `stickied_dropped` is how much of it was pinned noise.
#[derive(Debug, Clone, Serialize)]
pub struct HarvestSummary {
    pub ticker: String,
    pub rows_fetched: usize,
    pub stickied_dropped: usize,
    pub rows_loaded: u64,
}

/// Runs one harvest end to end: build the search spec, fetch and filter
/// posts, normalize the batch, commit it to the staging table.
///
/// Stages run strictly in sequence and the fetch is fully materialized
/// before normalization, so the batch shares a single `saved_dt_utc`.
/// Every failure other than an empty search result aborts the run and
/// propagates to the caller; retry and alerting live outside the core.
pub async fn run_harvest(
    request: &HarvestRequest,
    search: &dyn PostSearch,
    loader: &StagingLoader,
    events: &dyn EventSink,
) -> Result<HarvestSummary> {
    let spec = query::build_search_spec(request)?;
    let batch = fetch::fetch_posts(search, &spec, events).await?;

    let saved_at = Utc::now();
    let frame = normalize::staging_frame(&batch.posts, &spec.ticker, saved_at)?;
    events.emit(PipelineEvent::BatchNormalized {
        rows: frame.height(),
    });

    let rows_loaded = loader.load(&frame, events).await?;

    Ok(HarvestSummary {
        ticker: spec.ticker,
        rows_fetched: batch.total,
        stickied_dropped: batch.stickied_dropped(),
        rows_loaded,
    })
}
