//! Role resolution and tab access policy.

pub mod policy;
pub mod resolver;

pub use policy::TabPolicy;
pub use resolver::RoleResolver;
