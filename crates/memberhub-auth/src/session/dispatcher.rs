//! Finite state machine over normalized identity provider events.
//!
//! The provider's callback stream is funneled into a single queue and
//! processed by one task, strictly in arrival order. No two transitions
//! ever run concurrently; events that report an already-reached terminal
//! state coalesce into no-ops.

use std::sync::Arc;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

use memberhub_cache::role_cache::RoleCache;
use memberhub_core::events::{DomainEvent, EventPayload, SessionEvent};
use memberhub_entity::session::Session;

use crate::provider::AuthEvent;

use super::guard::{ErrorDisposition, SessionGuard};
use super::store::{SessionStore, SessionTransition};

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// No session is held.
    Unauthenticated,
    /// An existing session is being looked up or a sign-in is in flight.
    Authenticating,
    /// A session is held and usable.
    Authenticated,
    /// A fatal credential error was detected; teardown is about to start.
    Expiring,
    /// Teardown is running.
    SignOutInProgress,
}

/// Single subscription point for provider events, driving the state machine.
pub struct AuthEventDispatcher {
    /// The current-session holder.
    session_store: Arc<SessionStore>,
    /// Role cache, invalidated on every identity-changing transition.
    role_cache: RoleCache,
    /// Classifies errors and performs teardown.
    guard: Arc<SessionGuard>,
    /// Domain event sink.
    events: broadcast::Sender<DomainEvent>,
    /// Current state, observable by consumers.
    state_tx: watch::Sender<AuthState>,
    /// Queue head; events are processed strictly in arrival order.
    queue_tx: mpsc::UnboundedSender<AuthEvent>,
    /// Queue tail, taken once by [`AuthEventDispatcher::run`].
    queue_rx: Mutex<Option<mpsc::UnboundedReceiver<AuthEvent>>>,
}

impl std::fmt::Debug for AuthEventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthEventDispatcher")
            .field("state", &*self.state_tx.borrow())
            .finish()
    }
}

impl AuthEventDispatcher {
    /// Create a new dispatcher in the `Unauthenticated` state.
    pub fn new(
        session_store: Arc<SessionStore>,
        role_cache: RoleCache,
        guard: Arc<SessionGuard>,
        events: broadcast::Sender<DomainEvent>,
    ) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(AuthState::Unauthenticated);
        Self {
            session_store,
            role_cache,
            guard,
            events,
            state_tx,
            queue_tx,
            queue_rx: Mutex::new(Some(queue_rx)),
        }
    }

    /// Enqueue a provider event. Events are processed in arrival order.
    pub fn dispatch(&self, event: AuthEvent) {
        // The receiver lives as long as the dispatcher; a send failure
        // only happens during shutdown.
        if self.queue_tx.send(event).is_err() {
            warn!("Dispatcher queue closed; dropping event");
        }
    }

    /// The current state.
    pub fn state(&self) -> AuthState {
        *self.state_tx.borrow()
    }

    /// Observe state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    /// Enter `Authenticating` while the initial session lookup runs.
    pub fn mark_authenticating(&self) {
        self.state_tx.send_replace(AuthState::Authenticating);
    }

    /// Return to `Unauthenticated` after an initial lookup found nothing.
    pub fn mark_unauthenticated(&self) {
        // Only valid while no transition has landed in the meantime.
        if self.state() == AuthState::Authenticating {
            self.state_tx.send_replace(AuthState::Unauthenticated);
        }
    }

    /// Drive the state machine until the queue closes.
    ///
    /// Must be called exactly once. While a transition is in flight,
    /// further events stay queued; nothing is reordered.
    pub async fn run(self: Arc<Self>) {
        let mut queue_rx = self
            .queue_rx
            .lock()
            .expect("dispatcher queue lock poisoned")
            .take()
            .expect("AuthEventDispatcher::run called twice");

        while let Some(event) = queue_rx.recv().await {
            self.process(event).await;
        }
        debug!("Dispatcher queue closed, stopping");
    }

    /// Apply a single event to the state machine.
    pub(crate) async fn process(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(session) => self.on_session(session, true).await,
            AuthEvent::TokenRefreshed(session) => self.on_session(session, false).await,
            AuthEvent::SignedOut => self.on_sign_out("Signed out").await,
            AuthEvent::CredentialError(error) => self.on_credential_error(error).await,
        }
    }

    async fn on_session(&self, session: Session, signed_in: bool) {
        let identity_id = session.identity_id;
        let previous = self.session_store.identity();

        // The store update wakes the resolution side, so no role computed
        // for the previous identity may survive past this point.
        if previous != Some(identity_id) {
            info!(%identity_id, ?previous, "Authenticated identity changed");
            if let Err(e) = self.role_cache.invalidate_all().await {
                warn!(error = %e, "Failed to invalidate role cache on identity change");
            }
        }

        let transition = self.session_store.update(Some(session));

        if transition == SessionTransition::Unchanged {
            debug!(%identity_id, signed_in, "Session replaced for unchanged identity");
        }

        self.state_tx.send_replace(AuthState::Authenticated);

        let event = if signed_in && transition != SessionTransition::Unchanged {
            SessionEvent::Established { identity_id }
        } else {
            SessionEvent::Refreshed { identity_id }
        };
        let _ = self
            .events
            .send(DomainEvent::new(EventPayload::Session(event)));
    }

    async fn on_sign_out(&self, reason: &str) {
        match self.state() {
            AuthState::Unauthenticated | AuthState::SignOutInProgress => {
                debug!(reason, "Already signed out or signing out, coalescing");
                return;
            }
            _ => {}
        }

        self.state_tx.send_replace(AuthState::SignOutInProgress);
        self.guard.force_sign_out(reason).await;
        self.state_tx.send_replace(AuthState::Unauthenticated);
    }

    async fn on_credential_error(&self, error: memberhub_core::AppError) {
        match self.guard.classify(&error) {
            ErrorDisposition::Transient => {
                warn!(error = %error, "Transient auth error; session left intact");
            }
            ErrorDisposition::ForceSignOut => {
                warn!(error = %error, "Fatal credential error; tearing session down");
                if self.state() != AuthState::SignOutInProgress {
                    self.state_tx.send_replace(AuthState::Expiring);
                }
                self.on_sign_out(&format!("Credential error: {error}")).await;
            }
        }
    }
}
