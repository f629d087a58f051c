//! Session registry: the concurrency-safe set of connected clients.
//!
//! The registry is the only shared mutable state in the server. Every
//! connection handler registers its session on upgrade and unregisters it on
//! exit; broadcast iterates over a point-in-time snapshot so that fan-out
//! never holds the lock while sending.

use std::{
    collections::HashMap,
    fmt,
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::sync::mpsc;

/// Process-internal session key. Never appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// One connected client's outbound half: an identity plus the channel its
/// pusher task drains into the WebSocket sink.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    outbound: mpsc::UnboundedSender<String>,
}

impl Session {
    /// Create a session around the outbound channel of a freshly upgraded
    /// connection. Each call assigns a fresh identity.
    pub fn new(outbound: mpsc::UnboundedSender<String>) -> Self {
        Self {
            id: SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed)),
            outbound,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Enqueue a payload for delivery to this client. Fails only when the
    /// client's pusher task has already exited.
    pub fn send(&self, payload: &str) -> Result<(), mpsc::error::SendError<String>> {
        self.outbound.send(payload.to_string())
    }
}

/// Concurrency-safe set of live sessions.
///
/// All three operations take the lock for a few map operations only; the
/// lock is never held across an `.await` or while sending.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionId, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, Session>> {
        // A poisoned lock only means another handler panicked mid-update;
        // the map itself is still a valid set of sessions.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a session to the set. Registering an already-present session has
    /// no additional effect.
    pub fn register(&self, session: Session) {
        let online = {
            let mut sessions = self.lock();
            if sessions.contains_key(&session.id()) {
                return;
            }
            sessions.insert(session.id(), session);
            sessions.len()
        };
        tracing::info!("Session joined, {} online", online);
    }

    /// Remove a session if present. Idempotent: absent ids are a no-op.
    pub fn unregister(&self, id: SessionId) {
        let online = {
            let mut sessions = self.lock();
            if sessions.remove(&id).is_none() {
                return;
            }
            sessions.len()
        };
        tracing::info!("Session left, {} online", online);
    }

    /// Point-in-time copy of the current membership. The returned sessions
    /// are independent of later register/unregister calls.
    pub fn snapshot(&self) -> Vec<Session> {
        self.lock().values().cloned().collect()
    }

    /// Number of currently registered sessions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// RAII guard that unregisters a session when dropped.
///
/// Held by the connection handler for the lifetime of its socket tasks, so
/// unregistration runs on every exit path: normal close, read error, panic
/// unwind, or task cancellation.
pub struct RegistrationGuard<'a> {
    registry: &'a SessionRegistry,
    id: SessionId,
}

impl<'a> RegistrationGuard<'a> {
    pub fn new(registry: &'a SessionRegistry, id: SessionId) -> Self {
        Self { registry, id }
    }
}

impl Drop for RegistrationGuard<'_> {
    fn drop(&mut self) {
        self.registry.unregister(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_session() -> (Session, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Session::new(tx), rx)
    }

    #[test]
    fn test_register_adds_session_to_membership() {
        // テスト項目: register でセッションがレジストリに追加される
        // given (前提条件):
        let registry = SessionRegistry::new();
        let (session, _rx) = make_session();

        // when (操作):
        registry.register(session);

        // then (期待する結果):
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_is_idempotent() {
        // テスト項目: 同一セッションを二重登録しても追加の効果がない
        // given (前提条件):
        let registry = SessionRegistry::new();
        let (session, _rx) = make_session();

        // when (操作):
        registry.register(session.clone());
        registry.register(session);

        // then (期待する結果):
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        // テスト項目: unregister は二重呼び出しでも未登録 ID でもエラーにならない
        // given (前提条件):
        let registry = SessionRegistry::new();
        let (session, _rx) = make_session();
        let (never_registered, _rx2) = make_session();
        let id = session.id();
        registry.register(session);

        // when (操作):
        registry.unregister(id);
        registry.unregister(id);
        registry.unregister(never_registered.id());

        // then (期待する結果):
        assert!(registry.is_empty());
    }

    #[test]
    fn test_session_ids_are_unique() {
        // テスト項目: セッション ID は生成のたびに一意
        // given (前提条件):
        let (a, _rx_a) = make_session();
        let (b, _rx_b) = make_session();

        // when (操作):
        // (生成のみ)

        // then (期待する結果):
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_snapshot_does_not_reflect_later_mutations() {
        // テスト項目: snapshot は取得後の register/unregister を反映しない
        // given (前提条件):
        let registry = SessionRegistry::new();
        let (first, _rx_a) = make_session();
        let first_id = first.id();
        registry.register(first);

        // when (操作):
        let snapshot = registry.snapshot();
        let (second, _rx_b) = make_session();
        registry.register(second);
        registry.unregister(first_id);

        // then (期待する結果):
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id(), first_id);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registration_guard_unregisters_on_drop() {
        // テスト項目: RegistrationGuard の drop でセッションが削除される
        // given (前提条件):
        let registry = SessionRegistry::new();
        let (session, _rx) = make_session();
        let id = session.id();
        registry.register(session);

        // when (操作):
        {
            let _guard = RegistrationGuard::new(&registry, id);
        }

        // then (期待する結果):
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registration_guard_unregisters_on_panic() {
        // テスト項目: ハンドラがパニックしてもガードが unregister を実行する
        // given (前提条件):
        let registry = std::sync::Arc::new(SessionRegistry::new());
        let (session, _rx) = make_session();
        let id = session.id();
        registry.register(session);

        // when (操作):
        let registry_clone = registry.clone();
        let result = std::panic::catch_unwind(move || {
            let _guard = RegistrationGuard::new(&registry_clone, id);
            panic!("handler blew up");
        });

        // then (期待する結果):
        assert!(result.is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_register_unregister_snapshot_do_not_corrupt_state() {
        // テスト項目: 並行な register/unregister/snapshot でも状態が壊れない
        // given (前提条件):
        let registry = std::sync::Arc::new(SessionRegistry::new());
        let threads = 8;
        let iterations = 200;

        // when (操作):
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for _ in 0..iterations {
                        let (tx, _rx) = mpsc::unbounded_channel();
                        let session = Session::new(tx);
                        let id = session.id();
                        registry.register(session);
                        let snapshot = registry.snapshot();
                        assert!(snapshot.iter().any(|s| s.id() == id));
                        registry.unregister(id);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker thread should not panic");
        }

        // then (期待する結果):
        assert!(registry.is_empty());
    }
}
