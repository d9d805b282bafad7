//! Typed cache for resolved roles, keyed by session identity.
//!
//! A cache entry is valid only while bound to the exact identity that
//! produced it. Identity transitions invalidate eagerly (the dispatcher
//! and session guard call [`RoleCache::invalidate_all`]); expiry is
//! additionally enforced strictly on read so a stale grant can never be
//! observed past its TTL.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use memberhub_core::result::AppResult;
use memberhub_core::traits::cache::CacheProvider;
use memberhub_entity::role::Role;

use crate::keys;
use crate::provider::CacheManager;

/// A memoized role resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The identity the role was resolved for.
    pub identity_id: Uuid,
    /// The resolved role.
    pub role: Role,
    /// When the resolution completed.
    pub resolved_at: DateTime<Utc>,
    /// When the entry stops being valid.
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Whether the entry is past its TTL.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Memoizes resolved roles per session identity with a TTL.
#[derive(Debug, Clone)]
pub struct RoleCache {
    /// Backing cache provider.
    cache: Arc<CacheManager>,
    /// TTL applied by [`RoleCache::put_default`].
    default_ttl: Duration,
}

impl RoleCache {
    /// Create a role cache over the given provider.
    pub fn new(cache: Arc<CacheManager>, default_ttl: Duration) -> Self {
        Self { cache, default_ttl }
    }

    /// Look up the cached role for an identity.
    ///
    /// An expired entry is treated as absent and evicted, which forces
    /// the caller into re-resolution.
    pub async fn get(&self, identity_id: Uuid) -> AppResult<Option<Role>> {
        let key = keys::role_by_identity(identity_id);
        let Some(entry) = self.cache.get_json::<CacheEntry>(&key).await? else {
            return Ok(None);
        };

        if entry.identity_id != identity_id || entry.is_expired() {
            debug!(%identity_id, "Evicting expired role cache entry");
            self.cache.delete(&key).await?;
            return Ok(None);
        }

        Ok(Some(entry.role))
    }

    /// Store a resolved role for an identity with an explicit TTL.
    pub async fn put(&self, identity_id: Uuid, role: Role, ttl: Duration) -> AppResult<()> {
        let now = Utc::now();
        let entry = CacheEntry {
            identity_id,
            role,
            resolved_at: now,
            expires_at: now
                + chrono::Duration::from_std(ttl)
                    .map_err(|e| memberhub_core::AppError::cache(format!("Invalid TTL: {e}")))?,
        };

        let key = keys::role_by_identity(identity_id);
        self.cache.set_json(&key, &entry, ttl).await?;
        debug!(%identity_id, %role, ttl_seconds = ttl.as_secs(), "Cached resolved role");
        Ok(())
    }

    /// Store a resolved role with the configured default TTL.
    pub async fn put_default(&self, identity_id: Uuid, role: Role) -> AppResult<()> {
        self.put(identity_id, role, self.default_ttl).await
    }

    /// Drop the entry for a single identity.
    pub async fn invalidate(&self, identity_id: Uuid) -> AppResult<()> {
        self.cache.delete(&keys::role_by_identity(identity_id)).await
    }

    /// Drop every resolved-role entry.
    ///
    /// Called on forced sign-out and on every identity-changing session
    /// transition, so no role ever outlives the session it was computed for.
    pub async fn invalidate_all(&self) -> AppResult<u64> {
        self.cache.delete_pattern(&keys::role_pattern()).await
    }
}
