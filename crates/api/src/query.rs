//! Shared query parameter types for API handlers.

use chrono::NaiveDate;
use serde::Deserialize;

/// Query parameters for list endpoints that support an `include_inactive` flag.
#[derive(Debug, Deserialize)]
pub struct IncludeInactiveParams {
    #[serde(default)]
    pub include_inactive: bool,
}

/// Filters for the session listing endpoint (`?room=&day=&limit=&offset=`).
#[derive(Debug, Deserialize)]
pub struct SessionFilterParams {
    pub room: Option<String>,
    pub day: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl SessionFilterParams {
    /// Effective limit, clamped to 1..=500.
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(100).clamp(1, 500)
    }

    /// Effective offset, clamped to >= 0.
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}
