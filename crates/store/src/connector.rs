use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use serde::Serialize;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use crate::config::StoreConfig;
use crate::error::StoreError;

// Lifecycle phases. The connector moves strictly forward except for the
// exhaustion path, which returns to DISCONNECTED so a supervisor may retry.
const DISCONNECTED: u8 = 0;
const CONNECTING: u8 = 1;
const CONNECTED: u8 = 2;
const CLOSED: u8 = 3;

/// Snapshot of the connector's lifecycle, for health detail and diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionState {
    /// Whether a pool is currently established.
    pub connected: bool,
    /// Most recent connection attempt number (1-based; 0 before any attempt).
    pub attempt: u32,
    /// Error message from the most recent failed attempt, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Owns a service's Postgres pool lifecycle: bounded-backoff startup,
/// health probing, and exactly-once shutdown.
///
/// Startup races against dependent infrastructure (database containers,
/// managed instances) that may not be ready yet; the bounded exponential
/// backoff balances fast recovery against hammering a cold dependency.
pub struct StoreConnector {
    config: StoreConfig,
    phase: AtomicU8,
    pool: OnceCell<PgPool>,
    status: Mutex<ConnectionState>,
}

impl StoreConnector {
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            phase: AtomicU8::new(DISCONNECTED),
            pool: OnceCell::new(),
            status: Mutex::new(ConnectionState::default()),
        }
    }

    /// Establish the connection pool, retrying with exponential backoff.
    ///
    /// After attempt N of `max_retries` fails, the connector sleeps
    /// `initial_delay_ms * 2^(N-1)` (1s, 2s, 4s, 8s, ... by default) and
    /// tries again; there is no sleep after the final attempt. Exhausting
    /// every attempt returns [`StoreError::RetriesExhausted`], which callers
    /// treat as fatal at startup.
    ///
    /// Only one connect sequence runs per connector: a second call while a
    /// sequence is connecting (or already connected) returns `Ok(())`
    /// immediately. The backoff sleeps hold no lock.
    pub async fn connect(&self) -> Result<(), StoreError> {
        if let Err(current) =
            self.phase
                .compare_exchange(DISCONNECTED, CONNECTING, Ordering::AcqRel, Ordering::Acquire)
        {
            return match current {
                CONNECTING | CONNECTED => Ok(()),
                _ => Err(StoreError::NotConnected),
            };
        }

        // An unparseable URL is not something a retry can fix.
        let options: PgConnectOptions = match self.config.url.parse() {
            Ok(options) => options,
            Err(e) => {
                let message = e.to_string();
                error!(error = %message, "store URL rejected");
                self.note_failure(&message);
                self.phase.store(DISCONNECTED, Ordering::Release);
                return Err(StoreError::Connection(message));
            }
        };

        let max_retries = self.config.max_retries.max(1);
        let mut last_error = String::new();
        for attempt in 1..=max_retries {
            self.note_attempt(attempt);
            match PgPoolOptions::new()
                .max_connections(self.config.pool_size)
                .acquire_timeout(self.config.connect_timeout())
                .connect_with(options.clone())
                .await
            {
                Ok(pool) => {
                    info!(attempt, "store connection established");
                    self.note_connected(attempt);
                    let _ = self.pool.set(pool.clone());
                    if self
                        .phase
                        .compare_exchange(CONNECTING, CONNECTED, Ordering::AcqRel, Ordering::Acquire)
                        .is_err()
                    {
                        // Shutdown raced the tail of the connect sequence.
                        pool.close().await;
                        self.note_disconnected();
                        return Err(StoreError::NotConnected);
                    }
                    return Ok(());
                }
                Err(e) => {
                    last_error = e.to_string();
                    self.note_failure(&last_error);
                    if attempt < max_retries {
                        let delay_ms = backoff_delay_ms(self.config.initial_delay_ms, attempt);
                        warn!(
                            attempt,
                            delay_ms,
                            error = %last_error,
                            "store connection attempt failed, retrying"
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    }
                }
            }
        }

        error!(attempts = max_retries, error = %last_error, "store connection attempts exhausted");
        self.phase.store(DISCONNECTED, Ordering::Release);
        Err(StoreError::RetriesExhausted {
            attempts: max_retries,
            last_error,
        })
    }

    /// Lightweight round-trip probe. Never errors; any failure, including a
    /// response slower than the configured budget, reads as `false`.
    pub async fn is_healthy(&self) -> bool {
        let Some(pool) = self.live_pool() else {
            return false;
        };
        matches!(
            tokio::time::timeout(self.config.health_timeout(), sqlx::query("SELECT 1").execute(&pool)).await,
            Ok(Ok(_))
        )
    }

    /// Release the pool. Safe to call from multiple shutdown paths
    /// concurrently; exactly one caller performs the close.
    pub async fn disconnect(&self) {
        if self
            .phase
            .compare_exchange(CONNECTED, CLOSED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            if let Some(pool) = self.pool.get() {
                pool.close().await;
            }
            self.note_disconnected();
            info!("store connection closed");
            return;
        }
        // Never connected (or still connecting): terminal all the same, with
        // nothing to release here. A connect sequence losing this race closes
        // its own fresh pool.
        let _ = self
            .phase
            .compare_exchange(DISCONNECTED, CLOSED, Ordering::AcqRel, Ordering::Acquire);
        let _ = self
            .phase
            .compare_exchange(CONNECTING, CLOSED, Ordering::AcqRel, Ordering::Acquire);
    }

    /// Handle to the live pool for running queries.
    pub fn pool(&self) -> Result<PgPool, StoreError> {
        self.live_pool().ok_or(StoreError::NotConnected)
    }

    /// Current lifecycle snapshot.
    pub fn state(&self) -> ConnectionState {
        self.status
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn live_pool(&self) -> Option<PgPool> {
        if self.phase.load(Ordering::Acquire) == CONNECTED {
            self.pool.get().cloned()
        } else {
            None
        }
    }

    fn note_attempt(&self, attempt: u32) {
        let mut status = self
            .status
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        status.attempt = attempt;
    }

    fn note_failure(&self, message: &str) {
        let mut status = self
            .status
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        status.connected = false;
        status.last_error = Some(message.to_string());
    }

    fn note_connected(&self, attempt: u32) {
        let mut status = self
            .status
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        status.connected = true;
        status.attempt = attempt;
        status.last_error = None;
    }

    fn note_disconnected(&self) {
        let mut status = self
            .status
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        status.connected = false;
    }
}

impl std::fmt::Debug for StoreConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConnector")
            .field("state", &self.state())
            .finish()
    }
}

/// Milliseconds to wait after attempt `attempt` (1-based) fails.
fn backoff_delay_ms(initial_delay_ms: u64, attempt: u32) -> u64 {
    initial_delay_ms.saturating_mul(2_u64.saturating_pow(attempt.saturating_sub(1)))
}
