//! Presentation-facing authentication surface.
//!
//! Consumers read `role` / `is_resolving` / `can_access_tab` and request
//! sign-out; everything else happens inside the lifecycle components.
//! Role state is recomputed only on identity changes, published through a
//! watch channel, and always fails closed: an indeterminate or errored
//! resolution is exposed as no role at all.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use memberhub_entity::role::Role;
use memberhub_entity::session::Session;

use crate::provider::{AuthEvent, IdentityProvider};
use crate::role::policy::TabPolicy;
use crate::role::resolver::RoleResolver;
use crate::session::dispatcher::{AuthEventDispatcher, AuthState};
use crate::session::guard::{ErrorDisposition, SessionGuard};
use crate::session::store::SessionStore;

/// Wires the lifecycle components together and exposes resolved state.
pub struct AuthContext {
    /// Identity provider boundary.
    provider: Arc<dyn IdentityProvider>,
    /// The current-session holder.
    session_store: Arc<SessionStore>,
    /// The event state machine.
    dispatcher: Arc<AuthEventDispatcher>,
    /// Session guard, queried for navigation subscriptions.
    guard: Arc<SessionGuard>,
    /// Tab access policy.
    policy: TabPolicy,
    /// The currently effective role, `None` while undetermined.
    role_tx: watch::Sender<Option<Role>>,
    /// Whether a resolution is in flight.
    resolving_tx: watch::Sender<bool>,
    /// Total attempts for the startup session lookup, at least 1.
    lookup_retry_attempts: u32,
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("role", &*self.role_tx.borrow())
            .field("state", &self.dispatcher.state())
            .finish()
    }
}

impl AuthContext {
    /// Wire the components and spawn the background tasks: the dispatcher
    /// loop, the provider event pump, and the role resolution watcher.
    pub fn start(
        provider: Arc<dyn IdentityProvider>,
        session_store: Arc<SessionStore>,
        dispatcher: Arc<AuthEventDispatcher>,
        resolver: Arc<RoleResolver>,
        guard: Arc<SessionGuard>,
        lookup_retry_attempts: u32,
    ) -> Arc<Self> {
        let (role_tx, _) = watch::channel(None);
        let (resolving_tx, _) = watch::channel(false);

        let context = Arc::new(Self {
            provider,
            session_store,
            dispatcher,
            guard,
            policy: TabPolicy::new(),
            role_tx,
            resolving_tx,
            lookup_retry_attempts: lookup_retry_attempts.max(1),
        });

        tokio::spawn(context.dispatcher.clone().run());
        tokio::spawn(Self::pump_provider_events(
            context.provider.subscribe(),
            context.dispatcher.clone(),
        ));
        tokio::spawn(context.clone().watch_identity(resolver));

        context
    }

    /// Seed the state machine from any session the provider already holds.
    ///
    /// Transient lookup failures are retried within the configured budget;
    /// once exhausted the state machine settles as unauthenticated instead
    /// of staying stuck mid-bootstrap. Fatal credential errors go through
    /// the guard's forced sign-out path.
    pub async fn initialize(&self) {
        self.dispatcher.mark_authenticating();

        let mut attempt = 0;
        let lookup = loop {
            attempt += 1;
            match self.provider.get_session().await {
                Ok(session) => break Ok(session),
                Err(e) if e.is_transient() && attempt < self.lookup_retry_attempts => {
                    warn!(attempt, error = %e, "Transient startup session lookup failure");
                }
                Err(e) => break Err(e),
            }
        };

        match lookup {
            Ok(Some(session)) if !session.is_expired() => {
                debug!(identity = %session.identity_id, "Found existing session");
                self.dispatcher.dispatch(AuthEvent::SignedIn(session));
            }
            Ok(_) => {
                debug!("No usable existing session");
                self.dispatcher.mark_unauthenticated();
            }
            Err(e) => match self.guard.classify(&e) {
                ErrorDisposition::ForceSignOut => {
                    warn!(error = %e, "Fatal credential error during initialization");
                    self.dispatcher.dispatch(AuthEvent::CredentialError(e));
                }
                ErrorDisposition::Transient => {
                    warn!(error = %e, "Session lookup failed during initialization, starting signed out");
                    self.dispatcher.mark_unauthenticated();
                }
            },
        }
    }

    /// The currently effective role. `None` means undetermined or denied.
    pub fn role(&self) -> Option<Role> {
        *self.role_tx.borrow()
    }

    /// Whether a role resolution is currently in flight.
    pub fn is_resolving(&self) -> bool {
        *self.resolving_tx.borrow()
    }

    /// Whether the effective role may open the given tab.
    pub fn can_access_tab(&self, tab: &str) -> bool {
        self.policy.can_access(self.role(), tab)
    }

    /// The currently held session, if any.
    pub fn session(&self) -> Option<Session> {
        self.session_store.current()
    }

    /// The lifecycle state.
    pub fn state(&self) -> AuthState {
        self.dispatcher.state()
    }

    /// Queue a sign-out. Teardown runs in event order on the dispatcher.
    pub fn request_sign_out(&self) {
        self.dispatcher.dispatch(AuthEvent::SignedOut);
    }

    /// Observe role changes.
    pub fn subscribe_role(&self) -> watch::Receiver<Option<Role>> {
        self.role_tx.subscribe()
    }

    /// Observe resolution activity.
    pub fn subscribe_resolving(&self) -> watch::Receiver<bool> {
        self.resolving_tx.subscribe()
    }

    /// Observe lifecycle state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<AuthState> {
        self.dispatcher.subscribe_state()
    }

    /// Observe navigation requests (forced sign-out redirects).
    pub fn subscribe_navigation(&self) -> watch::Receiver<Option<String>> {
        self.guard.subscribe_navigation()
    }

    /// Forward provider events into the ordered dispatcher queue.
    async fn pump_provider_events(
        mut events: broadcast::Receiver<AuthEvent>,
        dispatcher: Arc<AuthEventDispatcher>,
    ) {
        loop {
            match events.recv().await {
                Ok(event) => dispatcher.dispatch(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Provider event stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// React to identity changes: resolve the new identity's role, or
    /// clear role state on sign-out. Results for identities that are no
    /// longer current are discarded.
    async fn watch_identity(self: Arc<Self>, resolver: Arc<RoleResolver>) {
        let mut identity_rx = self.session_store.subscribe_identity();

        loop {
            let identity = *identity_rx.borrow_and_update();

            match identity {
                None => {
                    self.role_tx.send_replace(None);
                    self.resolving_tx.send_replace(false);
                }
                Some(identity_id) => {
                    self.resolving_tx.send_replace(true);

                    let role = match self
                        .session_store
                        .current()
                        .filter(|s| s.identity_id == identity_id)
                    {
                        Some(session) => match resolver.resolve(&session).await {
                            Ok(role) => Some(role),
                            Err(e) => {
                                // Fail closed: an errored determination is
                                // unauthorized, never a default grant.
                                warn!(%identity_id, error = %e, "Role resolution failed");
                                None
                            }
                        },
                        None => None,
                    };

                    // Apply only if this identity is still the current one.
                    if self.session_store.identity() == Some(identity_id) {
                        self.role_tx.send_replace(role);
                    }
                    self.resolving_tx.send_replace(false);
                }
            }

            if identity_rx.changed().await.is_err() {
                break;
            }
        }
    }
}
