//! In-memory collaborator implementations.
//!
//! Single-process stand-ins for the external identity provider, role
//! store, membership directory, and local state. Used by the test suite
//! and by deployments that run without external backends.

pub mod directory;
pub mod identity;
pub mod local;
pub mod roles;

pub use directory::MemoryMembershipDirectory;
pub use identity::MemoryIdentityProvider;
pub use local::MemoryLocalState;
pub use roles::MemoryRoleStore;
