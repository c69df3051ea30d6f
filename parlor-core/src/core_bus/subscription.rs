//! Live subscriptions
//!
//! A Subscription is the receiving half of a join: a bus receiver plus the
//! subscriber's identity, with the delivery filter applied on this side of
//! the channel. Dropping the subscription unregisters the receiver.

use super::bus::EventBus;
use super::events::ChatEvent;
use super::filter::{should_deliver, SubscriberContext};
use metrics::counter;
use tokio::sync::broadcast;
use tracing::warn;

/// One subscriber's filtered view of the event bus.
///
/// A subscription that failed resolution never touches the bus: it yields
/// its targeted `SubscriptionError` exactly once and is then exhausted, so
/// an errored subscriber cannot observe later traffic.
pub struct Subscription {
    rx: Option<broadcast::Receiver<ChatEvent>>,
    ctx: SubscriberContext,
    rejection: Option<ChatEvent>,
}

impl Subscription {
    /// Open a live subscription registered on the bus.
    ///
    /// The receiver is registered before this returns, so events published
    /// afterwards are guaranteed to be observed.
    pub fn attached(bus: &EventBus, ctx: SubscriberContext) -> Self {
        Subscription {
            rx: Some(bus.subscribe()),
            ctx,
            rejection: None,
        }
    }

    /// A subscription that failed resolution.
    ///
    /// Carries the targeted error instead of a bus registration.
    pub fn rejected(ctx: SubscriberContext, error: String) -> Self {
        let rejection = ChatEvent::SubscriptionError {
            target: ctx.user_id.clone(),
            error,
        };
        Subscription {
            rx: None,
            ctx,
            rejection: Some(rejection),
        }
    }

    /// The subscriber this stream belongs to
    pub fn context(&self) -> &SubscriberContext {
        &self.ctx
    }

    /// Whether this subscription failed resolution
    pub fn is_rejected(&self) -> bool {
        self.rx.is_none()
    }

    /// Next event for this subscriber, or None once the stream is over.
    ///
    /// Events failing the delivery filter are skipped. A lagged receiver
    /// (buffer overflow on a slow consumer) drops the overwritten events,
    /// logs, and keeps going; other subscribers are unaffected.
    pub async fn recv(&mut self) -> Option<ChatEvent> {
        if let Some(rejection) = self.rejection.take() {
            counter!("bus.events.delivered", "kind" => rejection.kind()).increment(1);
            return Some(rejection);
        }

        let rx = self.rx.as_mut()?;

        loop {
            match rx.recv().await {
                Ok(event) => {
                    if should_deliver(&event, &self.ctx) {
                        counter!("bus.events.delivered", "kind" => event.kind()).increment(1);
                        return Some(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        user_id = %self.ctx.user_id,
                        channel = %self.ctx.channel_name,
                        skipped,
                        "Subscription lagged, dropping missed events"
                    );
                    counter!("bus.events.lagged").increment(skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
