use serde::Serialize;
use tracing::info;

/// Structured events emitted at each pipeline stage. Passed into the
/// pipeline explicitly so the core stays testable without a logging
/// subscriber installed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    SearchIssued {
        ticker: String,
        query: String,
        sort_method: &'static str,
        time_range: &'static str,
        limit: u32,
    },
    EmptyResult {
        ticker: String,
    },
    PostsFetched {
        total: usize,
        stickied_dropped: usize,
    },
    BatchNormalized {
        rows: usize,
    },
    TableLoaded {
        table: &'static str,
        rows: u64,
        policy: &'static str,
    },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

/// Forwards pipeline events to the ambient `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: PipelineEvent) {
        match &event {
            PipelineEvent::SearchIssued {
                ticker,
                query,
                sort_method,
                time_range,
                limit,
            } => {
                info!(%ticker, %query, sort_method, time_range, limit, "querying content platform");
            }
            PipelineEvent::EmptyResult { ticker } => {
                info!(%ticker, "search returned no posts");
            }
            PipelineEvent::PostsFetched {
                total,
                stickied_dropped,
            } => {
                info!(total, stickied_dropped, "fetched posts");
            }
            PipelineEvent::BatchNormalized { rows } => {
                info!(rows, "assembled staging batch");
            }
            PipelineEvent::TableLoaded {
                table,
                rows,
                policy,
            } => {
                info!(table, rows, policy, "staging table written");
            }
        }
    }
}
