//! In-memory identity provider.

use std::collections::VecDeque;
use std::sync::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::broadcast;

use memberhub_core::error::AppError;
use memberhub_core::result::AppResult;
use memberhub_entity::session::Session;

use crate::provider::{AuthEvent, IdentityProvider};

/// In-memory identity provider with scripted event emission.
///
/// Mirrors the remote provider's contract: it persists the current
/// session, broadcasts ordered auth events, and clears the session on
/// sign-out. Test hooks allow failing the sign-out call, scripting
/// session-lookup failures, and emitting arbitrary events.
pub struct MemoryIdentityProvider {
    /// The session the provider would return from `get_session`.
    current: RwLock<Option<Session>>,
    /// Ordered event stream.
    events: broadcast::Sender<AuthEvent>,
    /// When set, `sign_out` fails with a transient error.
    fail_sign_out: AtomicBool,
    /// How many times `sign_out` was called.
    sign_out_calls: AtomicUsize,
    /// Scripted errors consumed by `get_session`, one per call.
    lookup_failures: Mutex<VecDeque<AppError>>,
    /// How many times `get_session` was called.
    lookup_calls: AtomicUsize,
}

impl std::fmt::Debug for MemoryIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryIdentityProvider")
            .field("sign_out_calls", &self.sign_out_calls.load(Ordering::SeqCst))
            .finish()
    }
}

impl MemoryIdentityProvider {
    /// Create a provider with no session.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            current: RwLock::new(None),
            events,
            fail_sign_out: AtomicBool::new(false),
            sign_out_calls: AtomicUsize::new(0),
            lookup_failures: Mutex::new(VecDeque::new()),
            lookup_calls: AtomicUsize::new(0),
        }
    }

    /// Persist a session and broadcast a sign-in event.
    pub fn sign_in(&self, session: Session) {
        *self.current.write().expect("provider lock poisoned") = Some(session.clone());
        let _ = self.events.send(AuthEvent::SignedIn(session));
    }

    /// Replace the session and broadcast a token-refresh event.
    pub fn refresh(&self, session: Session) {
        *self.current.write().expect("provider lock poisoned") = Some(session.clone());
        let _ = self.events.send(AuthEvent::TokenRefreshed(session));
    }

    /// Broadcast a credential error.
    pub fn emit_credential_error(&self, error: AppError) {
        let _ = self.events.send(AuthEvent::CredentialError(error));
    }

    /// Seed a session without emitting an event (pre-existing session).
    pub fn set_session(&self, session: Option<Session>) {
        *self.current.write().expect("provider lock poisoned") = session;
    }

    /// Make the next `sign_out` calls fail with a transient error.
    pub fn set_fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    /// How many times `sign_out` was called.
    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    /// Queue an error for the next `get_session` call to return.
    pub fn push_lookup_failure(&self, error: AppError) {
        self.lookup_failures
            .lock()
            .expect("provider lock poisoned")
            .push_back(error);
    }

    /// How many times `get_session` was called.
    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn get_session(&self) -> AppResult<Option<Session>> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self
            .lookup_failures
            .lock()
            .expect("provider lock poisoned")
            .pop_front()
        {
            return Err(error);
        }

        Ok(self.current.read().expect("provider lock poisoned").clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn sign_out(&self) -> AppResult<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(AppError::transient("Provider sign-out unreachable"));
        }

        *self.current.write().expect("provider lock poisoned") = None;
        let _ = self.events.send(AuthEvent::SignedOut);
        Ok(())
    }
}
