//! Analytics Query Service
//!
//! Executes a normalized [`AnalyticsFilter`] against the [`EventStore`]:
//!
//! ```text
//! AnalyticsFilter → EventPredicate → spawn_blocking(store op) → result
//! ```
//!
//! SQLite calls block, so each operation runs on tokio's blocking pool and
//! the async handlers never hold the connection lock across an await.

use crate::query::error::{QueryError, QueryResult};
use crate::query::filter::AnalyticsFilter;
use crate::storage::{
    Aggregate, AnalyticsEvent, ChartBucket, EventStore, StorageResult,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Page number used when the request gives none
pub const DEFAULT_PAGE: u32 = 1;

/// Page size used when the request gives none
pub const DEFAULT_LIMIT: u32 = 20;

/// Largest page size accepted unless configured otherwise
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

/// Paging metadata returned with a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let limit_wide = u64::from(limit.max(1));
        Self {
            page,
            limit,
            total,
            pages: total.div_ceil(limit_wide),
        }
    }

    /// Number of records skipped before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One page of records, newest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub records: Vec<AnalyticsEvent>,
    pub pagination: Pagination,
}

/// Read-side operations over the event store
#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<EventStore>,
    max_page_size: u32,
}

impl AnalyticsService {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self {
            store,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }

    /// Override the page size cap
    pub fn with_max_page_size(mut self, max_page_size: u32) -> Self {
        self.max_page_size = max_page_size.max(1);
        self
    }

    pub fn max_page_size(&self) -> u32 {
        self.max_page_size
    }

    pub fn store(&self) -> &Arc<EventStore> {
        &self.store
    }

    async fn run<T, F>(&self, op: &'static str, f: F) -> QueryResult<T>
    where
        F: FnOnce(&EventStore) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let started = Instant::now();

        let result = tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| QueryError::Execution(e.to_string()))?;

        tracing::debug!(
            op,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Query executed"
        );

        result.map_err(QueryError::from)
    }

    /// Totals, averages and distinct dimension counts for the filter
    pub async fn get_aggregates(&self, filter: &AnalyticsFilter) -> QueryResult<Aggregate> {
        let predicate = filter.predicate();
        self.run("aggregates", move |store| store.aggregate(&predicate))
            .await
    }

    /// Time-bucketed series for the filter, ascending by bucket
    pub async fn get_chart_data(&self, filter: &AnalyticsFilter) -> QueryResult<Vec<ChartBucket>> {
        let predicate = filter.predicate();
        let interval = filter.interval.unwrap_or_default();
        self.run("chart", move |store| store.chart(&predicate, interval))
            .await
    }

    /// One page of matching records, newest first
    pub async fn get_paginated(&self, filter: &AnalyticsFilter) -> QueryResult<Page> {
        let page = filter.page.unwrap_or(DEFAULT_PAGE);
        let limit = filter.limit.unwrap_or(DEFAULT_LIMIT);

        if limit > self.max_page_size {
            return Err(QueryError::LimitTooLarge {
                limit,
                max: self.max_page_size,
            });
        }

        let predicate = filter.predicate();
        let offset = Pagination::new(page, limit, 0).offset();

        let (records, total) = self
            .run("page", move |store| store.page(&predicate, offset, limit))
            .await?;

        Ok(Page {
            records,
            pagination: Pagination::new(page, limit, total),
        })
    }

    /// A single record by UUID
    pub async fn get_by_id(&self, id: &str) -> QueryResult<AnalyticsEvent> {
        let uuid = uuid::Uuid::parse_str(id).map_err(|_| QueryError::InvalidId(id.to_string()))?;
        let key = uuid.hyphenated().to_string();

        self.run("get", move |store| store.get(&key))
            .await?
            .ok_or_else(|| QueryError::NotFound(id.to_string()))
    }
}
