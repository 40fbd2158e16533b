use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use redis::AsyncCommands;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use uuid::Uuid;

use agora_core::{Event, EventPayload};

use crate::config::BusConfig;
use crate::error::BusError;

/// Operating mode, fixed once at [`EventBusClient::connect`] time so behavior
/// is deterministic for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusMode {
    /// Connected (or connecting) to a real broker.
    Broker,
    /// Degraded mode: operations are accepted but never delivered.
    Noop,
}

/// Per-service handle to the platform event bus.
///
/// Cheap to clone; all clones share one broker connection manager.
#[derive(Clone)]
pub struct EventBusClient {
    inner: Arc<Inner>,
}

enum Inner {
    Broker(BrokerBackend),
    Noop,
}

struct BrokerBackend {
    client: redis::Client,
    manager: OnceCell<ConnectionManager>,
    config: BusConfig,
}

impl EventBusClient {
    /// Build a client from configuration. Never fails: a missing or invalid
    /// broker address selects no-op mode for the life of the process, logged
    /// once here rather than on every call.
    pub async fn connect(config: BusConfig) -> Self {
        let Some(url) = config.broker_url.clone() else {
            warn!("no broker address configured, event bus running in no-op mode");
            return Self {
                inner: Arc::new(Inner::Noop),
            };
        };

        let client = match redis::Client::open(url.as_str()) {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "invalid broker address, event bus running in no-op mode");
                return Self {
                    inner: Arc::new(Inner::Noop),
                };
            }
        };

        let backend = BrokerBackend {
            client,
            manager: OnceCell::new(),
            config,
        };
        // Dial eagerly so connectivity problems show up in the boot log, but
        // stay in broker mode either way: per-publish errors are isolated and
        // the manager reconnects on its own.
        match backend.manager().await {
            Ok(_) => info!(broker = %url, "event bus connected"),
            Err(e) => warn!(broker = %url, error = %e, "broker unreachable at startup, publishes will retry"),
        }

        Self {
            inner: Arc::new(Inner::Broker(backend)),
        }
    }

    /// Operating mode decided at connect time.
    #[must_use]
    pub fn mode(&self) -> BusMode {
        match self.inner.as_ref() {
            Inner::Broker(_) => BusMode::Broker,
            Inner::Noop => BusMode::Noop,
        }
    }

    /// Whether the client is in degraded no-op mode.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.mode() == BusMode::Noop
    }

    /// Fire-and-forget publish.
    ///
    /// The underlying publish returns a `Result` and this method drops its
    /// error branch on purpose, after logging: eventing is best-effort, and a
    /// broker outage must never fail the domain operation that emitted the
    /// event. Callers that need delivery feedback use [`send`](Self::send).
    pub async fn emit(&self, event: Event) {
        if let Err(e) = self.publish(&event).await {
            warn!(pattern = %event.pattern, error = %e, "event emission failed, dropping event");
        }
    }

    /// Serialize a typed payload and emit it, with the same drop-and-log
    /// contract as [`emit`](Self::emit).
    pub async fn emit_payload<P: EventPayload>(&self, payload: P) {
        match payload.try_into_event() {
            Ok(event) => self.emit(event).await,
            Err(e) => {
                warn!(pattern = P::PATTERN, error = %e, "event encoding failed, dropping event");
            }
        }
    }

    async fn publish(&self, event: &Event) -> Result<(), BusError> {
        match self.inner.as_ref() {
            Inner::Noop => Ok(()),
            Inner::Broker(backend) => backend.publish(event).await,
        }
    }

    /// Request/response over the bus.
    ///
    /// No-op mode resolves immediately with `Ok(None)` rather than hanging
    /// on a responder that cannot exist. Broker mode publishes an
    /// [`RpcRequest`] envelope and waits for the first reply on a dedicated
    /// channel, up to the configured request timeout.
    pub async fn send(
        &self,
        pattern: &str,
        payload: serde_json::Value,
    ) -> Result<Option<serde_json::Value>, BusError> {
        match self.inner.as_ref() {
            Inner::Noop => Ok(None),
            Inner::Broker(backend) => backend.request(pattern, payload).await.map(Some),
        }
    }

    /// Subscribe to one or more event patterns.
    ///
    /// Broker mode returns a live stream of decoded envelopes; undecodable
    /// messages are dropped with a warning. No-op mode returns a stream that
    /// stays pending forever: the subscription is accepted but nothing is
    /// ever delivered, which keeps subscriber loops shaped the same way in
    /// both modes.
    pub async fn subscribe(&self, patterns: &[&str]) -> Result<Subscription, BusError> {
        match self.inner.as_ref() {
            Inner::Noop => Ok(Subscription::pending()),
            Inner::Broker(backend) => backend.subscribe(patterns).await,
        }
    }
}

impl std::fmt::Debug for EventBusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBusClient")
            .field("mode", &self.mode())
            .finish()
    }
}

impl BrokerBackend {
    /// Shared connection manager, dialed on first use and reused after.
    async fn manager(&self) -> Result<ConnectionManager, BusError> {
        let manager = self
            .manager
            .get_or_try_init(|| {
                let client = self.client.clone();
                let manager_config = ConnectionManagerConfig::new()
                    .set_connection_timeout(self.config.connect_timeout())
                    .set_number_of_retries(2);
                async move { ConnectionManager::new_with_config(client, manager_config).await }
            })
            .await
            .map_err(|e| BusError::Connection(e.to_string()))?;
        Ok(manager.clone())
    }

    fn event_channel(&self, pattern: &str) -> String {
        format!("{}events:{}", self.config.channel_prefix, pattern)
    }

    fn request_channel(&self, pattern: &str) -> String {
        format!("{}rpc:{}", self.config.channel_prefix, pattern)
    }

    fn reply_channel(&self) -> String {
        format!("{}rpc:reply:{}", self.config.channel_prefix, Uuid::new_v4())
    }

    async fn publish(&self, event: &Event) -> Result<(), BusError> {
        let mut conn = self.manager().await?;
        let body = serde_json::to_string(event)?;
        let receivers: i64 = conn
            .publish(self.event_channel(&event.pattern), body)
            .await
            .map_err(|e| BusError::Publish(e.to_string()))?;
        debug!(pattern = %event.pattern, receivers, "event published");
        Ok(())
    }

    async fn request(
        &self,
        pattern: &str,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, BusError> {
        let reply_to = self.reply_channel();

        // Subscribe before publishing so the reply cannot race past us.
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| BusError::Connection(e.to_string()))?;
        pubsub
            .subscribe(&reply_to)
            .await
            .map_err(|e| BusError::Subscribe(e.to_string()))?;

        let request = RpcRequest {
            pattern: pattern.to_string(),
            payload,
            reply_to,
        };
        let body = serde_json::to_string(&request)?;
        let mut conn = self.manager().await?;
        let _: i64 = conn
            .publish(self.request_channel(pattern), body)
            .await
            .map_err(|e| BusError::Publish(e.to_string()))?;

        let mut replies = pubsub.into_on_message();
        match tokio::time::timeout(self.config.request_timeout(), replies.next()).await {
            Ok(Some(msg)) => {
                let raw: String = msg
                    .get_payload()
                    .map_err(|e| BusError::Subscribe(e.to_string()))?;
                Ok(serde_json::from_str(&raw)?)
            }
            Ok(None) => Err(BusError::Subscribe("reply channel closed".to_string())),
            Err(_) => Err(BusError::RequestTimeout {
                pattern: pattern.to_string(),
                timeout_ms: self.config.request_timeout_ms,
            }),
        }
    }

    async fn subscribe(&self, patterns: &[&str]) -> Result<Subscription, BusError> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| BusError::Connection(e.to_string()))?;
        for pattern in patterns {
            pubsub
                .subscribe(self.event_channel(pattern))
                .await
                .map_err(|e| BusError::Subscribe(e.to_string()))?;
        }

        let stream = pubsub.into_on_message().filter_map(|msg| async move {
            let raw: String = match msg.get_payload() {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(channel = msg.get_channel_name(), error = %e, "dropping non-text bus message");
                    return None;
                }
            };
            match serde_json::from_str::<Event>(&raw) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!(channel = msg.get_channel_name(), error = %e, "dropping undecodable event");
                    None
                }
            }
        });
        Ok(Subscription {
            inner: Box::pin(stream),
        })
    }
}

/// Wire envelope for [`EventBusClient::send`] requests. Responders publish
/// their JSON reply to `reply_to`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcRequest {
    pub pattern: String,
    pub payload: serde_json::Value,
    pub reply_to: String,
}

/// Stream of events delivered to a subscriber.
pub struct Subscription {
    inner: Pin<Box<dyn Stream<Item = Event> + Send>>,
}

impl Subscription {
    fn pending() -> Self {
        Self {
            inner: Box::pin(futures::stream::pending()),
        }
    }
}

impl Stream for Subscription {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Subscription")
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;

    use super::*;

    #[tokio::test]
    async fn missing_broker_address_selects_noop_mode() {
        let bus = EventBusClient::connect(BusConfig::default()).await;
        assert!(bus.is_noop());
        assert_eq!(bus.mode(), BusMode::Noop);
    }

    #[tokio::test]
    async fn invalid_broker_address_selects_noop_mode() {
        let config = BusConfig::default().with_broker_url("not a broker address");
        let bus = EventBusClient::connect(config).await;
        assert!(bus.is_noop());
    }

    #[tokio::test]
    async fn noop_emit_never_fails_and_send_resolves_empty() {
        let bus = EventBusClient::connect(BusConfig::default()).await;
        for i in 0..32 {
            bus.emit(Event::new("smoke.any.pattern", serde_json::json!({ "i": i })))
                .await;
            let reply = bus
                .send("smoke.any.pattern", serde_json::json!({ "i": i }))
                .await
                .unwrap();
            assert!(reply.is_none());
        }
    }

    #[tokio::test]
    async fn noop_subscription_stays_pending() {
        let bus = EventBusClient::connect(BusConfig::default()).await;
        let mut subscription = bus
            .subscribe(&["payment.order.confirmed", "auth.user.registered"])
            .await
            .unwrap();
        // Accepted but never delivered: the stream must not terminate.
        assert!(subscription.next().now_or_never().is_none());
    }

    #[tokio::test]
    async fn unreachable_broker_stays_in_broker_mode() {
        // Port 1 is reserved; nothing listens there.
        let config = BusConfig {
            connect_timeout_ms: 200,
            ..BusConfig::default()
        }
        .with_broker_url("redis://127.0.0.1:1");
        let bus = EventBusClient::connect(config).await;
        assert!(!bus.is_noop());

        // Emission swallows the connection failure.
        bus.emit(Event::new("noise.ping.sent", serde_json::Value::Null))
            .await;

        // send surfaces it.
        let err = bus
            .send("noise.ping.sent", serde_json::Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, BusError::Connection(_)));
    }

    #[test]
    fn rpc_request_wire_shape() {
        let request = RpcRequest {
            pattern: "auth.token.validate".into(),
            payload: serde_json::json!({"token": "t-1"}),
            reply_to: "agora:rpc:reply:5150".into(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["replyTo"], "agora:rpc:reply:5150");
        assert_eq!(json["pattern"], "auth.token.validate");
    }
}
