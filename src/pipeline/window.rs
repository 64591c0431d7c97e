//! Date-window retrieval.
//!
//! Ask the index to filter by timestamp first. If that yields nothing, or the
//! filter itself fails, fetch twice as many unfiltered neighbours and filter
//! them here. Retrieval never fails: the last resort is an empty set.

use crate::error::{PipelineError, PipelineResult};
use crate::types::FeedbackRecord;
use crate::vector::{MetadataFilter, TimeRange, VectorIndex};

pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Which slice of time a query is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryWindow {
    /// Explicit caller-supplied bounds.
    Between(TimeRange),
    /// The last `n` days up to the moment of the request.
    LastDays(u32),
}

impl QueryWindow {
    /// Build a window from optional caller bounds.
    ///
    /// Both bounds give an explicit window. A start alone runs to `now`; an end
    /// alone reaches back `days_back` days. No bounds means the last `days_back`
    /// days.
    pub fn from_bounds(start: Option<i64>, end: Option<i64>, days_back: u32, now: i64) -> Self {
        let span = i64::from(days_back) * SECONDS_PER_DAY;
        match (start, end) {
            (Some(start), Some(end)) => Self::Between(TimeRange::new(start, end)),
            (Some(start), None) => Self::Between(TimeRange::new(start, now)),
            (None, Some(end)) => Self::Between(TimeRange::new(end - span, end)),
            (None, None) => Self::LastDays(days_back),
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, Self::Between(_))
    }

    /// Concrete `(start, end)` in Unix seconds.
    pub fn resolve(&self, now: i64) -> TimeRange {
        match *self {
            Self::Between(range) => range,
            Self::LastDays(days) => TimeRange::new(now - i64::from(days) * SECONDS_PER_DAY, now),
        }
    }
}

/// Up to `top_k` records near `vector` whose timestamp falls inside `range`.
///
/// Never fails: when both searches fail the error is logged and the result is
/// empty.
pub async fn retrieve_in_window(
    index: &dyn VectorIndex,
    vector: &[f32],
    top_k: usize,
    range: TimeRange,
) -> Vec<FeedbackRecord> {
    search_window(index, vector, top_k, range)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "windowed retrieval gave up, continuing with no records");
            Vec::new()
        })
}

/// Filtered search, then the unfiltered 2K fallback filtered here.
/// Errors only when the fallback search fails too.
pub async fn search_window(
    index: &dyn VectorIndex,
    vector: &[f32],
    top_k: usize,
    range: TimeRange,
) -> PipelineResult<Vec<FeedbackRecord>> {
    let filter = MetadataFilter::time_range(range);
    match index.query(vector, top_k, Some(&filter)).await {
        Ok(records) if !records.is_empty() => {
            tracing::debug!(count = records.len(), "filtered search returned results");
            return Ok(records);
        }
        Ok(_) => {
            tracing::debug!("filtered search returned nothing, retrying unfiltered");
        }
        Err(e) => {
            let e = PipelineError::VectorSearch(e);
            tracing::warn!(error = %e, "filtered search failed, retrying unfiltered");
        }
    }

    let records = index
        .query(vector, top_k.saturating_mul(2), None)
        .await
        .map_err(PipelineError::VectorSearch)?;
    let mut in_range = filter_to_range(records, range);
    in_range.truncate(top_k);
    tracing::debug!(count = in_range.len(), "client-side filtered fallback");
    Ok(in_range)
}

/// Keep only records that carry a timestamp inside `range`, preserving order.
pub fn filter_to_range(records: Vec<FeedbackRecord>, range: TimeRange) -> Vec<FeedbackRecord> {
    records
        .into_iter()
        .filter(|r| r.metadata.timestamp.is_some_and(|ts| range.contains(ts)))
        .collect()
}
