use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable domain event published through the platform bus.
///
/// Events are fire-and-forget: delivery is at-most-once via the broker's
/// native semantics and no persisted log exists. Payloads are versionless
/// JSON; consumers must tolerate unknown additional fields so producers can
/// evolve payloads without coordinated deploys.
///
/// Wire format uses camelCase keys; the storefront and admin frontends
/// consume these envelopes directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Namespaced topic name, `<domain>.<entity>.<action>`
    /// (e.g. `payment.order.confirmed`). Globally unique per event kind.
    pub pattern: String,

    /// Arbitrary JSON payload. See [`EventPayload`] for the typed view.
    pub payload: serde_json::Value,

    /// Propagates a causal chain across services.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    /// Multi-tenant partition key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    /// When the producer emitted the event.
    pub emitted_at: DateTime<Utc>,
}

impl Event {
    /// Create an event with the given pattern and raw payload. Sets
    /// `emitted_at` to now.
    #[must_use]
    pub fn new(pattern: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            pattern: pattern.into(),
            payload,
            correlation_id: None,
            tenant_id: None,
            emitted_at: Utc::now(),
        }
    }

    /// Set the correlation id for causal-chain propagation.
    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Start a fresh causal chain with a generated v4 correlation id.
    #[must_use]
    pub fn with_new_correlation_id(mut self) -> Self {
        self.correlation_id = Some(Uuid::new_v4().to_string());
        self
    }

    /// Set the tenant partition key.
    #[must_use]
    pub fn with_tenant_id(mut self, tenant: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant.into());
        self
    }

    /// Decode the payload into a typed [`EventPayload`], checking that the
    /// envelope's pattern matches the payload type's declared pattern.
    pub fn decode<P: EventPayload>(&self) -> Result<P, EventDecodeError> {
        if self.pattern != P::PATTERN {
            return Err(EventDecodeError::PatternMismatch {
                expected: P::PATTERN,
                actual: self.pattern.clone(),
            });
        }
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

/// A typed event payload bound to a fixed pattern.
///
/// The marketplace catalog lives in [`crate::catalog`]; services may define
/// additional payloads as long as the pattern stays globally unique.
pub trait EventPayload: Serialize + DeserializeOwned {
    /// The namespaced pattern this payload is published under.
    const PATTERN: &'static str;

    /// Wrap the payload in an [`Event`] envelope.
    fn try_into_event(self) -> Result<Event, serde_json::Error>
    where
        Self: Sized,
    {
        Ok(Event::new(Self::PATTERN, serde_json::to_value(self)?))
    }
}

/// Failure decoding a typed payload out of an [`Event`].
#[derive(Debug, thiserror::Error)]
pub enum EventDecodeError {
    /// The envelope's pattern does not match the payload type's pattern.
    #[error("pattern mismatch: expected `{expected}`, got `{actual}`")]
    PatternMismatch {
        expected: &'static str,
        actual: String,
    },

    /// The payload did not deserialize into the target type.
    #[error("payload decode failed: {0}")]
    Payload(#[from] serde_json::Error),
}
