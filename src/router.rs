//! Envelope routing: the sole point of message transit between participants.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::protocol::{Envelope, MessageKind, Payload};

/// Delivers envelopes to registered inboxes and keeps an append-only audit
/// log of everything sent.
///
/// Constructed once per run and passed by reference to every component that
/// needs it; the router owns no domain data.
#[derive(Debug, Default)]
pub struct Router {
    inner: Mutex<RouterInner>,
}

#[derive(Debug, Default)]
struct RouterInner {
    routes: HashMap<String, mpsc::UnboundedSender<Envelope>>,
    log: Vec<Envelope>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an inbox for a worker id. A later registration for the same
    /// id replaces the earlier one.
    pub fn register(&self, worker_id: impl Into<String>, inbox: mpsc::UnboundedSender<Envelope>) {
        let mut inner = self.inner.lock().unwrap();
        inner.routes.insert(worker_id.into(), inbox);
    }

    /// Deliver an envelope to its recipient's inbox.
    ///
    /// Every envelope is appended to the audit log, including ones that fail
    /// delivery. A missing or closed inbox yields `UnknownRecipient`.
    pub fn send(&self, envelope: Envelope) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.log.push(envelope.clone());

        let recipient = envelope.recipient.clone();
        let sender = inner
            .routes
            .get(&recipient)
            .ok_or_else(|| Error::UnknownRecipient(recipient.clone()))?;
        sender
            .send(envelope)
            .map_err(|_| Error::UnknownRecipient(recipient))
    }

    /// Send the same logical request to multiple recipients.
    ///
    /// Each recipient gets a fresh envelope with its own id, so the replies
    /// stay distinguishable; the per-recipient envelope id is the correlation
    /// key to await on. Returns the delivered `(worker_id, correlation_id)`
    /// pairs and the worker ids that could not be reached.
    pub fn broadcast(
        &self,
        sender: &str,
        recipients: &[String],
        kind: MessageKind,
        payload: &Payload,
    ) -> (Vec<(String, String)>, Vec<String>) {
        let mut delivered = Vec::new();
        let mut failed = Vec::new();

        for recipient in recipients {
            let envelope = Envelope::new(sender, recipient.clone(), kind, payload.clone());
            let correlation_id = envelope.id.clone();
            match self.send(envelope) {
                Ok(()) => delivered.push((recipient.clone(), correlation_id)),
                Err(e) => {
                    tracing::warn!("Broadcast of {} to '{}' failed: {}", kind, recipient, e);
                    failed.push(recipient.clone());
                }
            }
        }

        (delivered, failed)
    }

    /// Ordered snapshot of every envelope that passed through this router.
    pub fn audit_log(&self) -> Vec<Envelope> {
        self.inner.lock().unwrap().log.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_delivers_to_inbox() {
        let router = Router::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        router.register("market", tx);

        let env = Envelope::new("coordinator", "market", MessageKind::Discover, Payload::Empty);
        let id = env.id.clone();
        router.send(env).unwrap();

        let received = rx.try_recv().unwrap();
        assert_eq!(received.id, id);
        assert_eq!(router.audit_log().len(), 1);
    }

    #[test]
    fn test_unknown_recipient() {
        let router = Router::new();
        let env = Envelope::new("coordinator", "ghost", MessageKind::Discover, Payload::Empty);

        let err = router.send(env).unwrap_err();
        assert!(matches!(err, Error::UnknownRecipient(id) if id == "ghost"));
        // Failed sends are still audited.
        assert_eq!(router.audit_log().len(), 1);
    }

    #[test]
    fn test_broadcast_uses_distinct_correlation_ids() {
        let router = Router::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        router.register("market", tx_a);
        router.register("customer", tx_b);

        let recipients = vec![
            "market".to_string(),
            "customer".to_string(),
            "ghost".to_string(),
        ];
        let (delivered, failed) =
            router.broadcast("coordinator", &recipients, MessageKind::Discover, &Payload::Empty);

        assert_eq!(delivered.len(), 2);
        assert_eq!(failed, vec!["ghost".to_string()]);
        assert_ne!(delivered[0].1, delivered[1].1);

        let env_a = rx_a.try_recv().unwrap();
        let env_b = rx_b.try_recv().unwrap();
        assert_eq!(env_a.id, delivered[0].1);
        assert_eq!(env_b.id, delivered[1].1);
    }

    #[test]
    fn test_audit_log_preserves_send_order() {
        let router = Router::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        router.register("market", tx);

        for _ in 0..3 {
            let env = Envelope::new("coordinator", "market", MessageKind::Info, Payload::Empty);
            router.send(env).unwrap();
        }

        let log = router.audit_log();
        assert_eq!(log.len(), 3);
        assert!(log.windows(2).all(|w| w[0].sent_at <= w[1].sent_at));
    }
}
