//! # memberhub-entity
//!
//! Domain entities for Memberhub.
//!
//! ## Modules
//!
//! - `session` — the time-bounded credential bundle issued by the identity provider
//! - `role` — the role enumeration and durable role-assignment records

pub mod role;
pub mod session;

pub use role::{Role, RoleRecord, RoleSource};
pub use session::{Session, SessionClaims};
