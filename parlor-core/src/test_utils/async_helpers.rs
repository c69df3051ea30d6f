//! Async test helpers
//!
//! Timeout wrappers for subscriptions, channels and arbitrary futures so
//! tests fail fast instead of hanging.

use std::future::Future;

use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use crate::core_bus::{ChatEvent, Subscription};

/// Default timeout duration for tests (5 seconds)
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Short timeout for tests asserting that nothing happens (100ms)
pub const SHORT_TEST_TIMEOUT: Duration = Duration::from_millis(100);

/// Next event from a subscription, panicking if none arrives in time.
pub async fn next_event(subscription: &mut Subscription, duration: Duration) -> ChatEvent {
    match timeout(duration, subscription.recv()).await {
        Ok(Some(event)) => event,
        Ok(None) => panic!("subscription closed while waiting for an event"),
        Err(_) => panic!("no event within {:?}", duration),
    }
}

/// Asserts the subscription delivers nothing for the whole duration.
/// End-of-stream counts as silence.
pub async fn assert_no_event(subscription: &mut Subscription, duration: Duration) {
    if let Ok(Some(event)) = timeout(duration, subscription.recv()).await {
        panic!("expected silence, got {:?}", event);
    }
}

/// Helper for receiving from a channel with a timeout
pub async fn recv_timeout<T>(
    rx: &mut mpsc::Receiver<T>,
    duration: Duration,
) -> Result<T, RecvTimeoutError> {
    timeout(duration, rx.recv())
        .await
        .map_err(|_| RecvTimeoutError::Timeout)?
        .ok_or(RecvTimeoutError::Closed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvTimeoutError {
    Timeout,
    Closed,
}

impl std::fmt::Display for RecvTimeoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecvTimeoutError::Timeout => write!(f, "receive operation timed out"),
            RecvTimeoutError::Closed => write!(f, "channel closed"),
        }
    }
}

impl std::error::Error for RecvTimeoutError {}

/// Helper to assert a future completes within duration
pub async fn assert_completes_within<F, T>(duration: Duration, future: F) -> T
where
    F: Future<Output = T>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => panic!("Future did not complete within {:?}", duration),
    }
}
