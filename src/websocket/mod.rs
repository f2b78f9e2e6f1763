//! WebSocket Invalidation Feed
//!
//! Pushes dataset change notices to dashboard clients so they can refetch
//! stale queries.
//!
//! ## Architecture
//!
//! - **ConnectionHub**: Manages all active connections and subscriptions
//! - **Handler**: Handles WebSocket upgrade and message processing
//! - **Messages**: Defines client and server message formats
//!
//! ## Topics
//!
//! - `analytics` - new events were ingested
//! - `system` - server lifecycle notices
//!
//! ## Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:5000/api/v1/ws');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'subscribe', topics: ['analytics']}));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.type === 'analytics_updated') refetchDashboard();
//! };
//! ```

mod handler;
mod hub;
mod messages;

pub use handler::websocket_handler;
pub use hub::{ConnectionHub, ConnectionId, HubConfig, HubError, OUTBOUND_QUEUE_CAPACITY};
pub use messages::{ClientMessage, ServerMessage, WsEvent, TOPIC_ANALYTICS, TOPIC_SYSTEM};
