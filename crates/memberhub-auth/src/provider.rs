//! Identity provider boundary.
//!
//! The provider's callback-based event stream is normalized into the small
//! [`AuthEvent`] alphabet consumed by the dispatcher state machine.

use async_trait::async_trait;
use tokio::sync::broadcast;

use memberhub_core::error::AppError;
use memberhub_core::result::AppResult;
use memberhub_entity::session::Session;

/// Normalized identity provider events.
///
/// Raw provider callbacks are mapped onto this alphabet before they reach
/// the state machine; anything the provider emits that does not fit one of
/// these variants is not a session transition and is dropped at the edge.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    /// A sign-in completed and produced a session.
    SignedIn(Session),
    /// The access credential was renewed for the current identity.
    TokenRefreshed(Session),
    /// The principal signed out (locally or from another device).
    SignedOut,
    /// The provider or a backend reported a credential problem.
    CredentialError(AppError),
}

/// External identity provider consumed by the session lifecycle.
#[async_trait]
pub trait IdentityProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Fetch the currently persisted session, if any.
    async fn get_session(&self) -> AppResult<Option<Session>>;

    /// Subscribe to the provider's asynchronous event stream.
    ///
    /// Events must be delivered in the order the provider produced them.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;

    /// Request a provider-side sign-out.
    async fn sign_out(&self) -> AppResult<()>;
}
