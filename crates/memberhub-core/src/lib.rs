//! # memberhub-core
//!
//! Core crate for Memberhub. Contains configuration schemas, the unified
//! error system, cache and local-state traits, and domain events.
//!
//! This crate has **no** internal dependencies on other Memberhub crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
