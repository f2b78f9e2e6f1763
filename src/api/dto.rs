//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};

use crate::query::{Page, Pagination};
use crate::storage::{AnalyticsEvent, NewEvent, MAX_REVENUE, MAX_REVENUE_CENTS};

/// Largest accepted ingest batch
pub const MAX_BATCH_SIZE: usize = 1000;

// ============================================
// RESPONSE ENVELOPES
// ============================================

/// Successful response wrapper: `{success: true, data}`
#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Listing response: records plus paging metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub success: bool,
    pub data: Vec<AnalyticsEvent>,
    pub pagination: Pagination,
}

impl From<Page> for ListResponse {
    fn from(page: Page) -> Self {
        Self {
            success: true,
            data: page.records,
            pagination: page.pagination,
        }
    }
}

// ============================================
// INGEST DTOs
// ============================================

/// Batch ingest request
#[derive(Debug, Deserialize)]
pub struct BatchIngestRequest {
    pub events: Vec<NewEvent>,
}

impl BatchIngestRequest {
    /// Check batch size and per-event fields
    ///
    /// The first offending event is reported by index.
    pub fn validate(&self) -> Result<(), String> {
        if self.events.is_empty() {
            return Err("Empty batch".to_string());
        }
        if self.events.len() > MAX_BATCH_SIZE {
            return Err(format!(
                "Batch size {} exceeds maximum of {} events",
                self.events.len(),
                MAX_BATCH_SIZE
            ));
        }

        for (index, event) in self.events.iter().enumerate() {
            validate_event(event).map_err(|e| format!("events[{}]: {}", index, e))?;
        }

        Ok(())
    }
}

fn validate_event(event: &NewEvent) -> Result<(), String> {
    for (field, value) in [
        ("region", &event.region),
        ("category", &event.category),
        ("source", &event.source),
    ] {
        if value.trim().is_empty() {
            return Err(format!("{} must not be empty", field));
        }
    }

    if event.revenue_cents < 0 {
        return Err("revenue must not be negative".to_string());
    }
    if event.revenue_cents > MAX_REVENUE_CENTS {
        return Err(format!("revenue must not exceed {}", MAX_REVENUE));
    }

    if !event.bounce_rate.is_finite() || !event.conversion.is_finite() {
        return Err("bounceRate and conversion must be finite numbers".to_string());
    }

    Ok(())
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy"
    pub status: String,
    /// "ok" or "error"
    pub database: String,
    /// Stored event count, absent when the database is unreachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<u64>,
    pub ws_connections: usize,
    pub uptime_seconds: u64,
    pub version: String,
}
