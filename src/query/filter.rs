//! Query Filter Normalizer
//!
//! Turns raw query-string parameters into a typed [`AnalyticsFilter`].
//! Only present parameters are set; defaults are applied later by the
//! executor. Malformed input fails the whole request.
//!
//! | Key | Accepted form |
//! |-----|---------------|
//! | `startDate`, `endDate` | RFC 3339 date-time (`2024-01-01T00:00:00Z`) |
//! | `region`, `category`, `source` | any string, matched exactly |
//! | `page`, `limit` | ASCII digits, at least 1 |
//! | `interval` | `timestamp`, `hour` or `day` |
//!
//! Unrecognized keys are ignored.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::query::error::{QueryError, QueryResult};
use crate::storage::{BucketInterval, EventPredicate};

/// Typed filter built from request parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyticsFilter {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub region: Option<String>,
    pub category: Option<String>,
    pub source: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub interval: Option<BucketInterval>,
}

impl AnalyticsFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse raw query parameters
    pub fn from_params(params: &HashMap<String, String>) -> QueryResult<Self> {
        let mut filter = Self::default();

        if let Some(value) = params.get("startDate") {
            filter.start_date = Some(parse_datetime("startDate", value)?);
        }
        if let Some(value) = params.get("endDate") {
            filter.end_date = Some(parse_datetime("endDate", value)?);
        }

        filter.region = non_empty(params.get("region"));
        filter.category = non_empty(params.get("category"));
        filter.source = non_empty(params.get("source"));

        if let Some(value) = params.get("page") {
            filter.page = Some(parse_positive("page", value)?);
        }
        if let Some(value) = params.get("limit") {
            filter.limit = Some(parse_positive("limit", value)?);
        }
        if let Some(value) = params.get("interval") {
            filter.interval = Some(value.parse().map_err(QueryError::InvalidInterval)?);
        }

        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            if start > end {
                return Err(QueryError::InvalidRange);
            }
        }

        Ok(filter)
    }

    pub fn start_date(mut self, start: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self
    }

    pub fn end_date(mut self, end: DateTime<Utc>) -> Self {
        self.end_date = Some(end);
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn interval(mut self, interval: BucketInterval) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Storage predicate for the date range and dimension constraints
    ///
    /// Stored timestamps have millisecond precision, so a lower bound with a
    /// sub-millisecond part rounds up and an upper bound rounds down.
    pub fn predicate(&self) -> EventPredicate {
        EventPredicate {
            start: self.start_date.map(ceil_millis),
            end: self.end_date.map(|d| d.timestamp_millis()),
            region: self.region.clone(),
            category: self.category.clone(),
            source: self.source.clone(),
        }
    }
}

fn ceil_millis(dt: DateTime<Utc>) -> i64 {
    let millis = dt.timestamp_millis();
    if dt.timestamp_subsec_nanos() % 1_000_000 != 0 {
        millis + 1
    } else {
        millis
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}

fn parse_datetime(field: &'static str, value: &str) -> QueryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| QueryError::InvalidDate {
            field,
            value: value.to_string(),
        })
}

fn parse_positive(field: &'static str, value: &str) -> QueryResult<u32> {
    let invalid = || QueryError::InvalidNumber {
        field,
        value: value.to_string(),
    };

    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let parsed: u32 = value.parse().map_err(|_| invalid())?;
    if parsed == 0 {
        return Err(QueryError::NonPositive { field });
    }

    Ok(parsed)
}
