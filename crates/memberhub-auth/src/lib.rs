//! # memberhub-auth
//!
//! Role resolution and session lifecycle management for the Memberhub
//! platform.
//!
//! ## Modules
//!
//! - `session` — the current-session store, the auth-event state machine,
//!   and the session guard that performs forced sign-out teardown
//! - `role` — tiered role resolution with lazy provisioning, and the tab
//!   access policy
//! - `provider` — the identity provider boundary and its event alphabet
//! - `stores` — role store and membership directory boundaries
//! - `context` — the presentation-facing surface (`role`, `is_resolving`,
//!   `can_access_tab`, `request_sign_out`)
//! - `memory` — in-memory collaborator implementations

pub mod context;
pub mod memory;
pub mod provider;
pub mod role;
pub mod session;
pub mod stores;

pub use context::AuthContext;
pub use provider::{AuthEvent, IdentityProvider};
pub use role::{RoleResolver, TabPolicy};
pub use session::{
    AuthEventDispatcher, AuthState, ErrorDisposition, SessionGuard, SessionStore,
    SessionTransition,
};
pub use stores::{MembershipDirectory, RoleStore};
