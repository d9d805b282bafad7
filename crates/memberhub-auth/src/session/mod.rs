//! Session lifecycle: the current-session store, the auth-event state
//! machine, and forced sign-out teardown.

pub mod dispatcher;
pub mod guard;
pub mod store;

pub use dispatcher::{AuthEventDispatcher, AuthState};
pub use guard::{ErrorDisposition, SessionGuard};
pub use store::{SessionStore, SessionTransition};
