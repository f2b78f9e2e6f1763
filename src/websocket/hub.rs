//! WebSocket Connection Hub
//!
//! Tracks live connections and their topic subscriptions, and fans
//! published events out to subscribers.

use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::messages::{ServerMessage, WsEvent, TOPIC_ANALYTICS, TOPIC_SYSTEM};

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

/// Outbound messages buffered per connection before new ones are dropped
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Manages all WebSocket connections and subscriptions
pub struct ConnectionHub {
    /// Active connections: ConnectionId → ConnectionHandle
    connections: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
    /// Topic subscriptions: Topic → Set of ConnectionIds
    subscriptions: RwLock<HashMap<String, HashSet<ConnectionId>>>,
    config: HubConfig,
}

/// Configuration for the connection hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    pub max_connections: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
        }
    }
}

/// Handle for sending messages to a specific connection
pub struct ConnectionHandle {
    pub sender: mpsc::Sender<ServerMessage>,
    pub subscriptions: HashSet<String>,
}

impl ConnectionHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            subscriptions: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Register a new WebSocket connection
    ///
    /// Fails once the connection limit has been reached.
    pub async fn register(
        &self,
        sender: mpsc::Sender<ServerMessage>,
    ) -> Result<ConnectionId, HubError> {
        let mut connections = self.connections.write().await;
        if connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        let id = Uuid::new_v4().to_string();
        connections.insert(
            id.clone(),
            ConnectionHandle {
                sender,
                subscriptions: HashSet::new(),
            },
        );

        tracing::info!(connection_id = %id, "WebSocket connected");
        Ok(id)
    }

    /// Unregister a connection and clean up its subscriptions
    pub async fn unregister(&self, id: &str) {
        let handle = self.connections.write().await.remove(id);

        if let Some(handle) = handle {
            let mut subs = self.subscriptions.write().await;
            for topic in handle.subscriptions {
                if let Some(subscribers) = subs.get_mut(&topic) {
                    subscribers.remove(id);
                    if subscribers.is_empty() {
                        subs.remove(&topic);
                    }
                }
            }
        }

        tracing::info!(connection_id = %id, "WebSocket disconnected");
    }

    /// Subscribe a connection to topics
    ///
    /// Unknown topics are skipped; the returned list holds the accepted ones.
    pub async fn subscribe(&self, id: &str, topics: Vec<String>) -> Result<Vec<String>, HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections
            .get_mut(id)
            .ok_or(HubError::ConnectionNotFound)?;

        let mut subs = self.subscriptions.write().await;
        let mut subscribed = Vec::new();

        for topic in topics {
            if !Self::is_valid_topic(&topic) {
                tracing::warn!(connection_id = %id, topic = %topic, "Invalid topic ignored");
                continue;
            }

            handle.subscriptions.insert(topic.clone());
            subs.entry(topic.clone())
                .or_default()
                .insert(id.to_string());
            subscribed.push(topic);
        }

        tracing::debug!(connection_id = %id, topics = ?subscribed, "Subscribed to topics");
        Ok(subscribed)
    }

    /// Unsubscribe a connection from topics
    pub async fn unsubscribe(
        &self,
        id: &str,
        topics: Vec<String>,
    ) -> Result<Vec<String>, HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections
            .get_mut(id)
            .ok_or(HubError::ConnectionNotFound)?;

        let mut subs = self.subscriptions.write().await;
        let mut unsubscribed = Vec::new();

        for topic in topics {
            if handle.subscriptions.remove(&topic) {
                if let Some(subscribers) = subs.get_mut(&topic) {
                    subscribers.remove(id);
                    if subscribers.is_empty() {
                        subs.remove(&topic);
                    }
                }
                unsubscribed.push(topic);
            }
        }

        tracing::debug!(connection_id = %id, topics = ?unsubscribed, "Unsubscribed from topics");
        Ok(unsubscribed)
    }

    /// Send an event to every subscriber of its topic
    ///
    /// Returns the number of connections the message was queued for.
    /// Subscribers whose queue is full miss this event.
    pub async fn publish(&self, event: WsEvent) -> usize {
        // Lock order elsewhere is connections then subscriptions
        let subscriber_ids = match self.subscriptions.read().await.get(&event.topic) {
            Some(ids) => ids.clone(),
            None => return 0,
        };

        let connections = self.connections.read().await;
        let sent = subscriber_ids
            .iter()
            .filter_map(|id| connections.get(id).map(|handle| (id, handle)))
            .filter(|(id, handle)| match Self::enqueue(handle, event.message.clone()) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(connection_id = %id, error = %e, "Dropped event for slow subscriber");
                    false
                }
            })
            .count();

        tracing::debug!(topic = %event.topic, subscribers = sent, "Published event");
        sent
    }

    /// Send a message directly to a specific connection
    pub async fn send_to(&self, id: &str, message: ServerMessage) -> Result<(), HubError> {
        let connections = self.connections.read().await;
        let handle = connections.get(id).ok_or(HubError::ConnectionNotFound)?;
        Self::enqueue(handle, message)
    }

    fn enqueue(handle: &ConnectionHandle, message: ServerMessage) -> Result<(), HubError> {
        handle.sender.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => HubError::QueueFull,
            TrySendError::Closed(_) => HubError::SendFailed,
        })
    }

    fn is_valid_topic(topic: &str) -> bool {
        topic == TOPIC_ANALYTICS || topic == TOPIC_SYSTEM
    }

    /// Get the current connection count
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Get subscription count for a topic
    pub async fn subscription_count(&self, topic: &str) -> usize {
        self.subscriptions
            .read()
            .await
            .get(topic)
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

/// Errors that can occur in the connection hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Failed to send message")]
    SendFailed,

    #[error("Outbound queue full")]
    QueueFull,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_topics() {
        assert!(ConnectionHub::is_valid_topic("analytics"));
        assert!(ConnectionHub::is_valid_topic("system"));

        assert!(!ConnectionHub::is_valid_topic("Analytics"));
        assert!(!ConnectionHub::is_valid_topic(""));
        assert!(!ConnectionHub::is_valid_topic("metrics.*"));
    }

    #[tokio::test]
    async fn test_register_unregister() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, _rx) = mpsc::channel(8);

        let id = hub.register(tx).await.unwrap();
        assert!(!id.is_empty());
        assert_eq!(hub.connection_count().await, 1);

        hub.unregister(&id).await;
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_subscribe_unsubscribe() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, _rx) = mpsc::channel(8);
        let id = hub.register(tx).await.unwrap();

        let subscribed = hub
            .subscribe(&id, vec!["analytics".to_string(), "bogus".to_string()])
            .await
            .unwrap();
        assert_eq!(subscribed, vec!["analytics"]);
        assert_eq!(hub.subscription_count("analytics").await, 1);

        let unsubscribed = hub
            .unsubscribe(&id, vec!["analytics".to_string(), "system".to_string()])
            .await
            .unwrap();
        assert_eq!(unsubscribed, vec!["analytics"]);
        assert_eq!(hub.subscription_count("analytics").await, 0);
    }

    #[tokio::test]
    async fn test_unknown_connection() {
        let hub = ConnectionHub::new(HubConfig::default());
        let result = hub.subscribe("nope", vec!["analytics".to_string()]).await;
        assert!(matches!(result, Err(HubError::ConnectionNotFound)));
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let hub = ConnectionHub::new(HubConfig { max_connections: 2 });

        let (tx1, _) = mpsc::channel(8);
        let (tx2, _) = mpsc::channel(8);
        let (tx3, _) = mpsc::channel(8);

        hub.register(tx1).await.unwrap();
        let id2 = hub.register(tx2).await.unwrap();
        let err = hub.register(tx3).await.unwrap_err();
        assert!(matches!(err, HubError::TooManyConnections(2)));

        hub.unregister(&id2).await;
        let (tx4, _) = mpsc::channel(8);
        assert!(hub.register(tx4).await.is_ok());
    }

    #[tokio::test]
    async fn test_publish_to_subscribers() {
        let hub = ConnectionHub::new(HubConfig::default());

        let (tx1, mut rx1) = mpsc::channel(8);
        let (tx2, mut rx2) = mpsc::channel(8);
        let id1 = hub.register(tx1).await.unwrap();
        let id2 = hub.register(tx2).await.unwrap();

        hub.subscribe(&id1, vec!["analytics".to_string()])
            .await
            .unwrap();
        hub.subscribe(&id2, vec!["system".to_string()])
            .await
            .unwrap();

        let sent = hub.publish(WsEvent::analytics_updated(2, None)).await;
        assert_eq!(sent, 1);

        assert!(matches!(
            rx1.try_recv(),
            Ok(ServerMessage::AnalyticsUpdated { inserted: 2, .. })
        ));
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unregister_clears_subscriptions() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, _rx) = mpsc::channel(8);
        let id = hub.register(tx).await.unwrap();

        hub.subscribe(&id, vec!["analytics".to_string()])
            .await
            .unwrap();
        hub.unregister(&id).await;

        assert_eq!(hub.subscription_count("analytics").await, 0);
        assert_eq!(hub.publish(WsEvent::analytics_updated(1, None)).await, 0);
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, mut rx) = mpsc::channel(1);
        let id = hub.register(tx).await.unwrap();
        hub.subscribe(&id, vec!["analytics".to_string()])
            .await
            .unwrap();

        assert_eq!(hub.publish(WsEvent::analytics_updated(1, None)).await, 1);
        assert_eq!(hub.publish(WsEvent::analytics_updated(2, None)).await, 0);
        assert!(matches!(
            hub.send_to(&id, ServerMessage::Pong).await,
            Err(HubError::QueueFull)
        ));

        assert!(matches!(
            rx.try_recv(),
            Ok(ServerMessage::AnalyticsUpdated { inserted: 1, .. })
        ));
        assert!(rx.try_recv().is_err());

        // Draining frees room again
        assert!(hub.send_to(&id, ServerMessage::Pong).await.is_ok());
    }

    #[tokio::test]
    async fn test_closed_receiver_is_send_failure() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, rx) = mpsc::channel(4);
        let id = hub.register(tx).await.unwrap();
        drop(rx);

        assert!(matches!(
            hub.send_to(&id, ServerMessage::Pong).await,
            Err(HubError::SendFailed)
        ));
    }
}
