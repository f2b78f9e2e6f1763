//! Analytics Event Storage
//!
//! This module owns the single persisted entity, the analytics event:
//!
//! - **types**: Core data structures (AnalyticsEvent, EventPredicate, Aggregate)
//! - **store**: SQLite-backed event table and the SQL behind every query
//! - **seed**: Synthetic dataset generation for bulk ingest
//! - **users**: Account table behind the `UserRepository` trait
//! - **error**: Error types
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//!   NewEvent[] → assign UUIDs → single transaction → analytics_events
//!
//! Read Path:
//!   EventPredicate → WHERE clause → aggregate | chart | page | get
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use analytics_dashboard::storage::{EventPredicate, EventStore, NewEvent};
//! use chrono::Utc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = EventStore::open("./data/analytics.db")?;
//!
//!     store.insert_batch(vec![
//!         NewEvent::new(Utc::now(), "Europe", "Books", "Email").revenue(42.50),
//!     ])?;
//!
//!     let aggregate = store.aggregate(&EventPredicate::new().region("Europe"))?;
//!     println!("Revenue: {}", aggregate.total_revenue);
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod seed;
pub mod store;
pub mod types;
pub mod users;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use seed::{generate_events, seed_store, DEFAULT_SEED_COUNT, SEED_BATCH_SIZE};
pub use store::EventStore;
pub use users::{User, UserRepository};
pub use types::{
    Aggregate, AnalyticsEvent, BucketInterval, ChartBucket, EventPredicate, NewEvent,
    CATEGORIES, MAX_REVENUE, MAX_REVENUE_CENTS, REGIONS, SOURCES,
};
