//! API Routes
//!
//! Route handlers organized by functionality.

pub mod analytics;
pub mod auth;
pub mod health;
pub mod ingest;
