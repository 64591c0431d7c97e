//! ISO date strings at the RPC boundary.

use chrono::{DateTime, NaiveDate, Utc};

use crate::pipeline::QueryWindow;

/// Unix seconds for an RFC 3339 timestamp or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_date(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}

/// Caller bounds to a query window. Blank or unparseable dates are ignored.
pub fn window_from_strings(start: Option<&str>, end: Option<&str>, days_back: u32) -> QueryWindow {
    QueryWindow::from_bounds(
        parse_bound("startDate", start),
        parse_bound("endDate", end),
        days_back,
        Utc::now().timestamp(),
    )
}

fn parse_bound(field: &str, value: Option<&str>) -> Option<i64> {
    let value = value.filter(|v| !v.trim().is_empty())?;
    let parsed = parse_date(value);
    if parsed.is_none() {
        tracing::warn!(field, value, "ignoring unparseable date");
    }
    parsed
}
