//! # memberhub-cache
//!
//! Cache provider implementations for Memberhub.
//!
//! - **memory**: In-process cache using [moka](https://crates.io/crates/moka)
//! - `RoleCache`: typed facade over the provider that memoizes resolved
//!   roles per session identity with per-entry TTL
//!
//! The provider is selected at runtime based on configuration.

pub mod keys;
pub mod memory;
pub mod provider;
pub mod role_cache;

pub use provider::CacheManager;
pub use role_cache::{CacheEntry, RoleCache};
