//! Broadcast dispatcher: fan-out of one payload to every registered session.

use std::sync::Arc;

use crate::registry::SessionRegistry;

/// Delivers payloads to every session in a registry snapshot.
///
/// Cloned into each connection handler; all clones share one registry.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    registry: Arc<SessionRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Send `payload` to every currently registered session, including the
    /// one that originated it (deliberate echo-back).
    ///
    /// Enqueueing to a session whose pusher task has exited fails; such
    /// failures are logged and skipped so the remaining recipients still
    /// receive the payload. The failing session's own handler detects the
    /// disconnect through its read loop and unregisters it.
    pub fn publish(&self, payload: &str) {
        let recipients = self.registry.snapshot();
        tracing::debug!(
            "Broadcasting {} bytes to {} session(s)",
            payload.len(),
            recipients.len()
        );

        for session in &recipients {
            if session.send(payload).is_err() {
                tracing::warn!("Failed to deliver to session {}, skipping", session.id());
            }
        }
    }
}
