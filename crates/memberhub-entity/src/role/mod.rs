//! Role enumeration and durable role-assignment records.

pub mod model;

pub use model::{Role, RoleRecord, RoleSource};
