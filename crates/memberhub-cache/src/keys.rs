//! Cache key builders for all Memberhub cache entries.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses.

use uuid::Uuid;

/// Prefix applied to all Memberhub cache keys.
const PREFIX: &str = "memberhub";

// ── Role keys ──────────────────────────────────────────────

/// Cache key for the resolved role of an identity.
pub fn role_by_identity(identity_id: Uuid) -> String {
    format!("{PREFIX}:role:{identity_id}")
}

/// Pattern matching every resolved-role entry.
pub fn role_pattern() -> String {
    format!("{PREFIX}:role:*")
}
