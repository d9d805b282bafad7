//! Core traits defined in `memberhub-core` and implemented by other crates.

pub mod cache;
pub mod local_state;

pub use cache::CacheProvider;
pub use local_state::LocalStateStore;
