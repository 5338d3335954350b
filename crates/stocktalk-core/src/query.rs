use crate::error::{HarvestError, Result};
use crate::types::{HarvestRequest, SortMethod, TimeRange};

/// Fully-resolved search parameters for one run. `query` carries the
/// `self:yes` qualifier so only self-posts (organic discussion) match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSpec {
    pub ticker: String,
    pub query: String,
    pub sort_method: SortMethod,
    pub time_range: TimeRange,
    pub limit: u32,
}

/// Resolves the scheduler's parameter bag into a [`SearchSpec`].
///
/// `ticker` and `limit` are mandatory; `sort_method` defaults to `new`
/// and `time_range` to `all`. No side effects.
pub fn build_search_spec(request: &HarvestRequest) -> Result<SearchSpec> {
    let ticker = request
        .ticker
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or(HarvestError::Configuration("ticker"))?;
    let limit = request.limit.ok_or(HarvestError::Configuration("limit"))?;

    Ok(SearchSpec {
        ticker: ticker.to_string(),
        query: format!("{ticker} self:yes"),
        sort_method: request.sort_method.unwrap_or(SortMethod::New),
        time_range: request.time_range.unwrap_or(TimeRange::All),
        limit,
    })
}
