use async_trait::async_trait;

use crate::error::Result;
use crate::events::{EventSink, PipelineEvent};
use crate::query::SearchSpec;
use crate::types::RawPost;

/// Search capability over the unrestricted ("all communities") content
/// scope. Implementations own transport, auth, and pagination; the core
/// never touches HTTP.
#[async_trait]
pub trait PostSearch: Send + Sync {
    async fn search(&self, spec: &SearchSpec) -> Result<Vec<RawPost>>;
}

/// Outcome of the fetch stage: the retained posts plus the size of the
/// result set before the stickied filter ran.
#[derive(Debug)]
pub struct FetchedBatch {
    pub posts: Vec<RawPost>,
    pub total: usize,
}

impl FetchedBatch {
    pub fn stickied_dropped(&self) -> usize {
        self.total - self.posts.len()
    }
}

/// Issues the search and drops pinned/announcement posts.
///
/// An empty result set is not an error: absence of discussion for a
/// ticker is valid business data. It is surfaced as an [`PipelineEvent::EmptyResult`]
/// event and the run continues with zero records.
///
/// Posts whose author reference is absent are retained here; the
/// normalizer fails the batch when it reaches for the author name.
pub async fn fetch_posts(
    search: &dyn PostSearch,
    spec: &SearchSpec,
    events: &dyn EventSink,
) -> Result<FetchedBatch> {
    events.emit(PipelineEvent::SearchIssued {
        ticker: spec.ticker.clone(),
        query: spec.query.clone(),
        sort_method: spec.sort_method.as_str(),
        time_range: spec.time_range.as_str(),
        limit: spec.limit,
    });

    let results = search.search(spec).await?;
    if results.is_empty() {
        events.emit(PipelineEvent::EmptyResult {
            ticker: spec.ticker.clone(),
        });
        return Ok(FetchedBatch {
            posts: Vec::new(),
            total: 0,
        });
    }

    let total = results.len();
    let posts: Vec<RawPost> = results.into_iter().filter(|post| !post.stickied).collect();
    let batch = FetchedBatch { posts, total };

    events.emit(PipelineEvent::PostsFetched {
        total,
        stickied_dropped: batch.stickied_dropped(),
    });

    Ok(batch)
}
