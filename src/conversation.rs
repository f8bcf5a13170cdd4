//! Correlation tracking: associates outgoing requests with their eventual
//! responses so the coordinator can await a specific reply among many
//! in-flight exchanges.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::protocol::Envelope;

#[derive(Debug)]
enum Slot {
    /// Response arrived, not yet handed to a waiter.
    Ready(Envelope),
    /// Response handed out, or the wait was abandoned after a timeout.
    /// Anything arriving for this id from now on is discarded.
    Consumed,
}

/// Per-correlation-id response store with notify-based wakeup.
///
/// Waits suspend on a [`Notify`] rather than polling; `resolve` files the
/// response and wakes every outstanding waiter, each of which re-checks its
/// own ids. Each response is handed out exactly once: the first await after
/// resolution gets the cached envelope, later awaits fail `AlreadyConsumed`.
#[derive(Debug, Default)]
pub struct Conversation {
    slots: Mutex<HashMap<String, Slot>>,
    notify: Notify,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// File a response envelope under its correlation id and wake waiters.
    ///
    /// Uncorrelated envelopes, duplicates and responses for consumed ids are
    /// logged and dropped; a reply that arrives after its wait timed out must
    /// never be applied to an already-synthesized plan.
    pub fn resolve(&self, envelope: Envelope) {
        let Some(key) = envelope.correlation_id.clone() else {
            tracing::debug!(
                "Dropping uncorrelated {} envelope from '{}'",
                envelope.kind,
                envelope.sender
            );
            return;
        };

        let mut slots = self.slots.lock().unwrap();
        match slots.get(&key) {
            Some(Slot::Consumed) => {
                tracing::info!(
                    "Late {} response from '{}' for {} discarded",
                    envelope.kind,
                    envelope.sender,
                    key
                );
            }
            Some(Slot::Ready(_)) => {
                tracing::warn!(
                    "Duplicate response from '{}' for {} ignored, keeping first",
                    envelope.sender,
                    key
                );
            }
            None => {
                slots.insert(key, Slot::Ready(envelope));
                self.notify.notify_waiters();
            }
        }
    }

    /// Suspend until the response for `correlation_id` arrives or `timeout`
    /// elapses.
    pub async fn await_response(
        &self,
        correlation_id: &str,
        timeout: Duration,
    ) -> Result<Envelope> {
        let ids = [correlation_id.to_string()];
        let (_, envelope) = self.await_any(&ids, timeout).await?;
        Ok(envelope)
    }

    /// Suspend until the first of several correlation ids resolves.
    ///
    /// Returns the winning id with its envelope. The other ids stay
    /// outstanding and can be awaited again. Fails `Timeout` when the
    /// deadline passes with nothing resolved, and `AlreadyConsumed` when
    /// every given id has already been handed out.
    pub async fn await_any(
        &self,
        correlation_ids: &[String],
        timeout: Duration,
    ) -> Result<(String, Envelope)> {
        let deadline = Instant::now() + timeout;

        loop {
            // Arm the notification before inspecting the slots so a resolve
            // between the check and the await cannot be missed.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut slots = self.slots.lock().unwrap();
                let mut all_consumed = !correlation_ids.is_empty();
                for id in correlation_ids {
                    match slots.get(id) {
                        Some(Slot::Ready(_)) => {
                            let Some(Slot::Ready(envelope)) = slots.remove(id) else {
                                unreachable!("slot checked as ready");
                            };
                            slots.insert(id.clone(), Slot::Consumed);
                            return Ok((id.clone(), envelope));
                        }
                        Some(Slot::Consumed) => {}
                        None => all_consumed = false,
                    }
                }
                if all_consumed {
                    return Err(Error::AlreadyConsumed(correlation_ids.join(",")));
                }
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Err(Error::Timeout {
                    correlation_id: correlation_ids.join(","),
                });
            }
        }
    }

    /// Give up on a correlation id after a timeout. A response arriving later
    /// is discarded by `resolve` instead of lingering unread.
    pub fn abandon(&self, correlation_id: &str) {
        let mut slots = self.slots.lock().unwrap();
        slots.insert(correlation_id.to_string(), Slot::Consumed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{MessageKind, Payload};

    fn response_for(request_id: &str) -> Envelope {
        let mut env = Envelope::new("market", "coordinator", MessageKind::Card, Payload::Empty);
        env.correlation_id = Some(request_id.to_string());
        env
    }

    #[tokio::test]
    async fn test_resolve_then_await_replays_cached() {
        let convo = Conversation::new();
        convo.resolve(response_for("req-1"));

        let env = convo
            .await_response("req-1", Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(env.correlation_id.as_deref(), Some("req-1"));
    }

    #[tokio::test]
    async fn test_await_then_resolve_wakes_waiter() {
        let convo = std::sync::Arc::new(Conversation::new());

        let waiter = {
            let convo = convo.clone();
            tokio::spawn(async move {
                convo
                    .await_response("req-1", Duration::from_secs(1))
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        convo.resolve(response_for("req-1"));

        let env = waiter.await.unwrap().unwrap();
        assert!(env.answers("req-1"));
    }

    #[tokio::test]
    async fn test_second_await_fails_already_consumed() {
        let convo = Conversation::new();
        convo.resolve(response_for("req-1"));

        convo
            .await_response("req-1", Duration::from_millis(50))
            .await
            .unwrap();

        let err = convo
            .await_response("req-1", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyConsumed(_)));
    }

    #[tokio::test]
    async fn test_timeout() {
        let convo = Conversation::new();

        let err = convo
            .await_response("req-1", Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_abandon_discards_late_response() {
        let convo = Conversation::new();
        convo.abandon("req-1");
        convo.resolve(response_for("req-1"));

        // The late response must not be handed out.
        let err = convo
            .await_response("req-1", Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyConsumed(_)));
    }

    #[tokio::test]
    async fn test_await_any_resolves_first_match() {
        let convo = Conversation::new();
        let ids = vec!["req-1".to_string(), "req-2".to_string()];

        convo.resolve(response_for("req-2"));
        let (key, env) = convo
            .await_any(&ids, Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(key, "req-2");
        assert!(env.answers("req-2"));

        // req-1 is still outstanding.
        convo.resolve(response_for("req-1"));
        let (key, _) = convo
            .await_any(&ids, Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(key, "req-1");
    }

    #[tokio::test]
    async fn test_duplicate_response_keeps_first() {
        let convo = Conversation::new();
        let mut first = response_for("req-1");
        first.sender = "market".to_string();
        let mut second = response_for("req-1");
        second.sender = "impostor".to_string();

        convo.resolve(first);
        convo.resolve(second);

        let env = convo
            .await_response("req-1", Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(env.sender, "market");
    }
}
