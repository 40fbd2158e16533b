//! Typed catalog of the marketplace's cross-service events.
//!
//! Every pattern is namespaced `<domain>.<entity>.<action>`. Payloads are
//! versionless: fields may be added over time, and consumers skip fields they
//! do not know (none of these structs use `deny_unknown_fields`).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::event::{Event, EventPayload};

/// Pattern constants for the events services exchange today.
pub mod patterns {
    /// A new account completed registration (auth service).
    pub const USER_REGISTERED: &str = "auth.user.registered";
    /// A buyer's order was confirmed (payment service).
    pub const ORDER_CONFIRMED: &str = "payment.order.confirmed";
    /// A confirmed order was refunded (payment service).
    pub const ORDER_REFUNDED: &str = "payment.order.refunded";
    /// A seller submitted a product for review (seller service).
    pub const PRODUCT_SUBMITTED: &str = "seller.product.submitted";
    /// A content page went live (content service).
    pub const PAGE_PUBLISHED: &str = "content.page.published";
}

/// Published when a new account completes registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRegistered {
    pub user_id: String,
    pub email: String,
}

impl EventPayload for UserRegistered {
    const PATTERN: &'static str = patterns::USER_REGISTERED;
}

/// Published when the payment service confirms an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmed {
    pub order_id: String,
    pub buyer_id: String,
    /// Order total in minor units.
    pub amount_cents: i64,
    /// ISO 4217 code.
    pub currency: String,
}

impl EventPayload for OrderConfirmed {
    const PATTERN: &'static str = patterns::ORDER_CONFIRMED;
}

/// Published when a confirmed order is refunded, fully or partially.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRefunded {
    pub order_id: String,
    /// Refunded amount in minor units; may be less than the order total.
    pub amount_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl EventPayload for OrderRefunded {
    const PATTERN: &'static str = patterns::ORDER_REFUNDED;
}

/// Published when a seller submits a product for review.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSubmitted {
    pub product_id: String,
    pub seller_id: String,
    pub title: String,
}

impl EventPayload for ProductSubmitted {
    const PATTERN: &'static str = patterns::PRODUCT_SUBMITTED;
}

/// Published when a content page goes live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePublished {
    pub page_id: String,
    pub slug: String,
}

impl EventPayload for PagePublished {
    const PATTERN: &'static str = patterns::PAGE_PUBLISHED;
}

/// Outcome of validating a raw event against the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Pattern is registered and the payload deserializes cleanly.
    Valid,
    /// Pattern is registered but the payload does not match its schema.
    Invalid(String),
    /// Pattern is not registered. Subscribers skip these rather than erroring
    /// so new producers can ship ahead of their consumers.
    Unknown,
}

type Validator = Box<dyn Fn(&serde_json::Value) -> Result<(), String> + Send + Sync>;

/// Schema-per-pattern registry consumers validate incoming events against.
///
/// The dispatcher in `agora-bus` consults this before invoking handlers;
/// anything can also use it standalone (e.g. a producer asserting its own
/// payloads in tests).
#[derive(Default)]
pub struct SchemaRegistry {
    validators: HashMap<&'static str, Validator>,
}

impl SchemaRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with every pattern in [`patterns`].
    #[must_use]
    pub fn with_catalog() -> Self {
        let mut registry = Self::new();
        registry.register::<UserRegistered>();
        registry.register::<OrderConfirmed>();
        registry.register::<OrderRefunded>();
        registry.register::<ProductSubmitted>();
        registry.register::<PagePublished>();
        registry
    }

    /// Register a payload type under its declared pattern. Re-registering a
    /// pattern replaces the previous validator.
    pub fn register<P: EventPayload + 'static>(&mut self) {
        self.validators.insert(
            P::PATTERN,
            Box::new(|payload| {
                serde_json::from_value::<P>(payload.clone())
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            }),
        );
    }

    /// Validate an event's payload against its pattern's schema.
    #[must_use]
    pub fn validate(&self, event: &Event) -> Validation {
        match self.validators.get(event.pattern.as_str()) {
            None => Validation::Unknown,
            Some(check) => match check(&event.payload) {
                Ok(()) => Validation::Valid,
                Err(reason) => Validation::Invalid(reason),
            },
        }
    }

    /// Whether a pattern has a registered schema.
    #[must_use]
    pub fn contains(&self, pattern: &str) -> bool {
        self.validators.contains_key(pattern)
    }

    /// Registered patterns, sorted.
    #[must_use]
    pub fn patterns(&self) -> Vec<&'static str> {
        let mut patterns: Vec<_> = self.validators.keys().copied().collect();
        patterns.sort_unstable();
        patterns
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("patterns", &self.patterns())
            .finish()
    }
}
