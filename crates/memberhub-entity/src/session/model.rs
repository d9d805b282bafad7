//! Session entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::Role;

/// The current authentication session issued by the identity provider.
///
/// A session is an immutable value: it is created on sign-in, replaced
/// wholesale on token refresh, and dropped entirely on sign-out or a
/// fatal credential error. The `identity_id` is stable across credential
/// renewals for the same principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Stable identifier of the authenticated principal.
    pub identity_id: Uuid,
    /// Opaque access credential presented to backend services.
    pub access_token: String,
    /// Credential used to obtain a replacement session.
    pub refresh_token: Option<String>,
    /// When the access credential expires.
    pub expires_at: DateTime<Utc>,
    /// Claim metadata embedded by the identity provider.
    #[serde(default)]
    pub claims: SessionClaims,
}

/// Claim metadata carried inside the session.
///
/// The role claim is a provider-side hint only. It is consulted during
/// role resolution when no durable role record exists, but it is never
/// authoritative storage and never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Optional role hint assigned at the provider.
    pub role: Option<Role>,
    /// E-mail address of the principal, if disclosed.
    pub email: Option<String>,
}

impl Session {
    /// Build a session expiring `ttl_seconds` from now.
    pub fn new(identity_id: Uuid, access_token: impl Into<String>, ttl_seconds: i64) -> Self {
        Self {
            identity_id,
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: Utc::now() + Duration::seconds(ttl_seconds),
            claims: SessionClaims::default(),
        }
    }

    /// Attach a refresh credential.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Attach claim metadata.
    pub fn with_claims(mut self, claims: SessionClaims) -> Self {
        self.claims = claims;
        self
    }

    /// Check whether the access credential has expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}
