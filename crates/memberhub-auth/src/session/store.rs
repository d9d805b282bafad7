//! Holder of the single current authentication session.

use std::sync::RwLock;

use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use memberhub_entity::session::Session;

/// Outcome of a session update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTransition {
    /// Same identity as before (e.g. a credential refresh). Downstream
    /// role state stays valid; no recomputation is triggered.
    Unchanged,
    /// A different principal, or a transition to/from the signed-out state.
    IdentityChanged {
        /// Identity held before the update.
        previous: Option<Uuid>,
        /// Identity held after the update.
        current: Option<Uuid>,
    },
}

/// Holds the single current session (or none).
///
/// Infallible by construction: a pure data holder mutated only by the
/// dispatcher and the session guard. Subscribers are notified of
/// *identity* changes only, never of same-identity re-emits, so a token
/// refresh does not ripple into role recomputation.
#[derive(Debug)]
pub struct SessionStore {
    /// The session currently held, if any.
    current: RwLock<Option<Session>>,
    /// Notifies downstream components of identity changes.
    identity_tx: watch::Sender<Option<Uuid>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (identity_tx, _) = watch::channel(None);
        Self {
            current: RwLock::new(None),
            identity_tx,
        }
    }

    /// The currently held session, if any.
    pub fn current(&self) -> Option<Session> {
        self.current.read().expect("session store lock poisoned").clone()
    }

    /// The identity of the currently held session, if any.
    pub fn identity(&self) -> Option<Uuid> {
        self.current
            .read()
            .expect("session store lock poisoned")
            .as_ref()
            .map(|s| s.identity_id)
    }

    /// Replace the held session.
    ///
    /// Compares identities (by identity id) against the previously held
    /// session. An unchanged identity updates in place silently; a changed
    /// identity emits an identity-change notification consumed by the
    /// role-resolution side.
    pub fn update(&self, next: Option<Session>) -> SessionTransition {
        let (previous, current) = {
            let mut guard = self.current.write().expect("session store lock poisoned");
            let previous = guard.as_ref().map(|s| s.identity_id);
            let current = next.as_ref().map(|s| s.identity_id);
            *guard = next;
            (previous, current)
        };

        if previous == current {
            debug!(identity = ?current, "Session updated in place");
            return SessionTransition::Unchanged;
        }

        debug!(?previous, ?current, "Session identity changed");
        self.identity_tx.send_replace(current);
        SessionTransition::IdentityChanged { previous, current }
    }

    /// Drop the held session.
    pub fn clear(&self) -> SessionTransition {
        self.update(None)
    }

    /// Observe identity changes.
    pub fn subscribe_identity(&self) -> watch::Receiver<Option<Uuid>> {
        self.identity_tx.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_for(identity_id: Uuid) -> Session {
        Session::new(identity_id, "token", 3600)
    }

    #[test]
    fn test_update_from_empty_changes_identity() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();

        let transition = store.update(Some(session_for(id)));
        assert_eq!(
            transition,
            SessionTransition::IdentityChanged {
                previous: None,
                current: Some(id),
            }
        );
        assert_eq!(store.identity(), Some(id));
    }

    #[test]
    fn test_refresh_same_identity_is_unchanged() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();
        store.update(Some(session_for(id)));

        let refreshed = session_for(id).with_refresh_token("r2");
        assert_eq!(store.update(Some(refreshed)), SessionTransition::Unchanged);
        assert_eq!(
            store.current().unwrap().refresh_token.as_deref(),
            Some("r2")
        );
    }

    #[test]
    fn test_clear_changes_identity() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();
        store.update(Some(session_for(id)));

        assert_eq!(
            store.clear(),
            SessionTransition::IdentityChanged {
                previous: Some(id),
                current: None,
            }
        );
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn test_subscriber_sees_identity_changes_only() {
        let store = SessionStore::new();
        let mut rx = store.subscribe_identity();
        let id = Uuid::new_v4();

        store.update(Some(session_for(id)));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Some(id));

        // Same-identity refresh must not notify.
        store.update(Some(session_for(id)));
        assert!(!rx.has_changed().unwrap());
    }
}
