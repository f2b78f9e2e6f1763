//! Analytics Query Layer
//!
//! Sits between the HTTP handlers and the event store:
//!
//! - **Filter**: Normalize raw query parameters into an [`AnalyticsFilter`]
//! - **Executor**: Run aggregates, chart series, paging and lookups
//!
//! # Parameters
//!
//! ```text
//! ?startDate=2024-01-01T00:00:00Z&endDate=2024-01-31T23:59:59Z
//!  &region=Europe&category=Books&source=Email
//!  &page=2&limit=50&interval=hour
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use analytics_dashboard::query::{AnalyticsFilter, AnalyticsService};
//!
//! let filter = AnalyticsFilter::from_params(&params)?;
//! let totals = service.get_aggregates(&filter).await?;
//! let page = service.get_paginated(&filter).await?;
//! ```

mod error;
mod executor;
mod filter;

pub use error::{QueryError, QueryResult};
pub use executor::{
    AnalyticsService, Page, Pagination, DEFAULT_LIMIT, DEFAULT_MAX_PAGE_SIZE, DEFAULT_PAGE,
};
pub use filter::AnalyticsFilter;
