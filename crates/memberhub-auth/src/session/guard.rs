//! Error classification and forced sign-out teardown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use memberhub_cache::role_cache::RoleCache;
use memberhub_core::error::{AppError, ErrorKind};
use memberhub_core::events::{DomainEvent, EventPayload, SessionEvent};
use memberhub_core::traits::local_state::LocalStateStore;

use crate::provider::IdentityProvider;

use super::store::SessionStore;

/// What to do with a provider/backend error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDisposition {
    /// Retryable; the session stays intact and the caller applies its
    /// own retry policy.
    Transient,
    /// The credential is unusable; the session must be torn down.
    ForceSignOut,
}

/// Provider error strings that indicate an unusable credential.
///
/// These arrive untyped from the provider boundary, so classification
/// falls back to message markers when the error kind is not conclusive.
const FORCE_SIGN_OUT_MARKERS: &[&str] = &[
    "Invalid Refresh Token",
    "refresh_token_not_found",
    "session_not_found",
    "JWT expired",
];

/// Classifies session-level errors and performs forced sign-out teardown.
pub struct SessionGuard {
    /// Role cache to wipe during teardown.
    role_cache: RoleCache,
    /// The current-session holder.
    session_store: Arc<SessionStore>,
    /// Identity provider for the remote sign-out call.
    provider: Arc<dyn IdentityProvider>,
    /// Local persisted state wiped during teardown.
    local_state: Arc<dyn LocalStateStore>,
    /// Domain event sink.
    events: broadcast::Sender<DomainEvent>,
    /// Signals the presentation layer where to navigate after teardown.
    navigation_tx: watch::Sender<Option<String>>,
    /// Path of the unauthenticated entry point.
    sign_in_path: String,
    /// Set while a teardown is running; makes repeat calls no-ops.
    teardown_in_progress: AtomicBool,
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("sign_in_path", &self.sign_in_path)
            .finish()
    }
}

impl SessionGuard {
    /// Create a new session guard.
    pub fn new(
        role_cache: RoleCache,
        session_store: Arc<SessionStore>,
        provider: Arc<dyn IdentityProvider>,
        local_state: Arc<dyn LocalStateStore>,
        events: broadcast::Sender<DomainEvent>,
        sign_in_path: impl Into<String>,
    ) -> Self {
        let (navigation_tx, _) = watch::channel(None);
        Self {
            role_cache,
            session_store,
            provider,
            local_state,
            events,
            navigation_tx,
            sign_in_path: sign_in_path.into(),
            teardown_in_progress: AtomicBool::new(false),
        }
    }

    /// Decide whether an error tears the session down or is left to the
    /// caller's retry policy.
    ///
    /// Invalid, expired, or not-found refresh credentials and not-found
    /// sessions force sign-out; network-transport failures are transient.
    pub fn classify(&self, error: &AppError) -> ErrorDisposition {
        match error.kind {
            ErrorKind::TransientNetwork => ErrorDisposition::Transient,
            ErrorKind::InvalidCredential | ErrorKind::Session => ErrorDisposition::ForceSignOut,
            _ => {
                if FORCE_SIGN_OUT_MARKERS
                    .iter()
                    .any(|marker| error.message.contains(marker))
                {
                    ErrorDisposition::ForceSignOut
                } else {
                    ErrorDisposition::Transient
                }
            }
        }
    }

    /// Tear the session down.
    ///
    /// Idempotent: repeated calls while a teardown is already running are
    /// no-ops. Every step is best-effort; a failing provider call is logged
    /// and local clearing still completes, so local state never remains
    /// authenticated after a forced sign-out decision.
    pub async fn force_sign_out(&self, reason: &str) {
        if self.teardown_in_progress.swap(true, Ordering::SeqCst) {
            debug!(reason, "Teardown already in progress, ignoring");
            return;
        }

        let identity_id = self.session_store.identity();
        info!(identity = ?identity_id, reason, "Forcing sign-out");

        // 1. No cached role may outlive the session it was computed for.
        if let Err(e) = self.role_cache.invalidate_all().await {
            warn!(error = %e, "Failed to invalidate role cache during teardown");
        }

        // 2. Drop the session.
        self.session_store.clear();

        // 3. Remote sign-out, best effort.
        if let Err(e) = self.provider.sign_out().await {
            warn!(error = %e, "Provider sign-out failed; completing local teardown");
        }

        // 4. Wipe local persisted state.
        if let Err(e) = self.local_state.clear().await {
            warn!(error = %e, "Failed to clear local state during teardown");
        }

        // 5. Send the user to the unauthenticated entry point.
        self.navigation_tx
            .send_replace(Some(self.sign_in_path.clone()));
        let _ = self
            .events
            .send(DomainEvent::new(EventPayload::Session(
                SessionEvent::Destroyed {
                    identity_id,
                    reason: reason.to_string(),
                },
            )));

        self.teardown_in_progress.store(false, Ordering::SeqCst);
        info!(identity = ?identity_id, "Teardown complete");
    }

    /// Observe navigation requests emitted by teardown.
    pub fn subscribe_navigation(&self) -> watch::Receiver<Option<String>> {
        self.navigation_tx.subscribe()
    }
}
