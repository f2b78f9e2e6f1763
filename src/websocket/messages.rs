//! WebSocket Message Types
//!
//! Defines all message types exchanged between dashboard clients and the
//! analytics server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Topic carrying dataset invalidation notices
pub const TOPIC_ANALYTICS: &str = "analytics";

/// Topic carrying server lifecycle notices
pub const TOPIC_SYSTEM: &str = "system";

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to topics for real-time updates
    Subscribe {
        /// Topics to subscribe to (`analytics`, `system`)
        topics: Vec<String>,
    },
    /// Unsubscribe from topics
    Unsubscribe { topics: Vec<String> },
    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// New events were stored; cached dashboard queries are stale
    AnalyticsUpdated {
        /// Number of events in the ingested batch
        inserted: usize,
        /// Newest event timestamp in the batch
        #[serde(skip_serializing_if = "Option::is_none")]
        latest_timestamp: Option<DateTime<Utc>>,
    },
    /// Server lifecycle notice
    System { message: String },
    /// Subscription confirmed
    Subscribed { topics: Vec<String> },
    /// Unsubscription confirmed
    Unsubscribed { topics: Vec<String> },
    /// Pong response to ping
    Pong,
    /// Error message
    Error { message: String },
    /// Connection established
    Connected {
        /// Unique connection identifier
        connection_id: String,
    },
}

impl ServerMessage {
    /// JSON text frame payload
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"serialization failed: {}"}}"#, e)
        })
    }
}

/// Internal event for broadcasting through the hub
#[derive(Debug, Clone)]
pub struct WsEvent {
    /// Topic this event belongs to
    pub topic: String,
    /// The message to send to subscribers
    pub message: ServerMessage,
}

impl WsEvent {
    /// Invalidation notice after a batch ingest
    pub fn analytics_updated(inserted: usize, latest_timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            topic: TOPIC_ANALYTICS.to_string(),
            message: ServerMessage::AnalyticsUpdated {
                inserted,
                latest_timestamp,
            },
        }
    }

    /// Create a system event
    pub fn system(message: &str) -> Self {
        Self {
            topic: TOPIC_SYSTEM.to_string(),
            message: ServerMessage::System {
                message: message.to_string(),
            },
        }
    }
}
