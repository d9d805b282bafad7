//! Authentication and role-resolution configuration.

use serde::{Deserialize, Serialize};

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// TTL for cached role resolutions in seconds.
    #[serde(default = "default_role_ttl")]
    pub role_ttl_seconds: u64,
    /// Total attempts allowed for a single role-store lookup before the
    /// resolution fails closed (initial attempt included).
    #[serde(default = "default_lookup_attempts")]
    pub lookup_retry_attempts: u32,
    /// Path presented to unauthenticated users after a forced sign-out.
    #[serde(default = "default_sign_in_path")]
    pub sign_in_path: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            role_ttl_seconds: default_role_ttl(),
            lookup_retry_attempts: default_lookup_attempts(),
            sign_in_path: default_sign_in_path(),
        }
    }
}

fn default_role_ttl() -> u64 {
    300
}

fn default_lookup_attempts() -> u32 {
    2
}

fn default_sign_in_path() -> String {
    "/login".to_string()
}
