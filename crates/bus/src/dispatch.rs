use std::collections::HashMap;
use std::future::Future;

use futures::StreamExt;
use futures::future::BoxFuture;
use tracing::{debug, error, warn};

use agora_core::{Event, EventPayload, SchemaRegistry, Validation};

use crate::client::Subscription;

/// Result type for event handlers. Handler failures are logged by the
/// dispatcher and never stop the subscription loop.
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

type Handler = Box<dyn Fn(Event) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Routes incoming events to typed handlers by pattern.
///
/// Registering a handler also registers its payload schema, so validation and
/// dispatch stay in lockstep: events failing validation are dropped with a
/// warning, events with patterns nobody registered here are ignored (a newer
/// producer may be ahead of this consumer), and handler errors are logged
/// without tearing the loop down.
#[derive(Default)]
pub struct EventDispatcher {
    schemas: SchemaRegistry,
    handlers: HashMap<&'static str, Handler>,
}

impl EventDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an async handler for a typed payload.
    #[must_use]
    pub fn on<P, F, Fut>(mut self, handler: F) -> Self
    where
        P: EventPayload + Send + 'static,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.schemas.register::<P>();
        self.handlers.insert(
            P::PATTERN,
            Box::new(move |event: Event| -> BoxFuture<'static, HandlerResult> {
                match event.decode::<P>() {
                    Ok(payload) => Box::pin(handler(payload)),
                    Err(e) => {
                        let err: Box<dyn std::error::Error + Send + Sync> = e.into();
                        Box::pin(async move { Err(err) })
                    }
                }
            }),
        );
        self
    }

    /// Patterns with registered handlers, sorted. Feed this to
    /// [`EventBusClient::subscribe`](crate::EventBusClient::subscribe).
    #[must_use]
    pub fn patterns(&self) -> Vec<&'static str> {
        self.schemas.patterns()
    }

    /// Validate and route one event. Never fails; problems are logged.
    pub async fn dispatch(&self, event: Event) {
        match self.schemas.validate(&event) {
            Validation::Unknown => {
                debug!(pattern = %event.pattern, "ignoring event with no registered handler");
            }
            Validation::Invalid(reason) => {
                warn!(pattern = %event.pattern, %reason, "dropping event that failed schema validation");
            }
            Validation::Valid => {
                let Some(handler) = self.handlers.get(event.pattern.as_str()) else {
                    debug!(pattern = %event.pattern, "no handler bound for validated pattern");
                    return;
                };
                let pattern = event.pattern.clone();
                if let Err(e) = handler(event).await {
                    error!(pattern = %pattern, error = %e, "event handler failed");
                }
            }
        }
    }

    /// Drain a subscription, dispatching each event, until the stream ends.
    pub async fn run(&self, mut subscription: Subscription) {
        while let Some(event) = subscription.next().await {
            self.dispatch(event).await;
        }
        debug!("event subscription stream ended");
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("patterns", &self.patterns())
            .finish()
    }
}
