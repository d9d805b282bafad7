//! Tiered role resolution with lazy provisioning.
//!
//! Resolution order, first match wins:
//! 1. Durable role records — highest priority role wins (admin >
//!    collector > member) to cover legacy multi-record data.
//! 2. Claim-metadata role hint from the session (never persisted).
//! 3. Collector link in the membership directory.
//! 4. Provision a `member` record (write-once) and return `member`.
//!
//! Resolution is keyed by identity: concurrent callers for the same
//! identity share one pending resolution instead of issuing duplicate
//! backend writes. A completion whose identity is no longer current is
//! discarded, never committed to the cache.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use memberhub_cache::role_cache::RoleCache;
use memberhub_core::error::{AppError, ErrorKind};
use memberhub_core::result::AppResult;
use memberhub_entity::role::{Role, RoleRecord, RoleSource};
use memberhub_entity::session::Session;

use crate::session::store::SessionStore;
use crate::stores::{MembershipDirectory, RoleStore};

/// Resolves the effective role for a session identity.
pub struct RoleResolver {
    /// Durable role assignments.
    role_store: Arc<dyn RoleStore>,
    /// Collector-link lookups.
    directory: Arc<dyn MembershipDirectory>,
    /// Memoized resolutions.
    role_cache: RoleCache,
    /// Current-session holder, consulted by the staleness guard.
    session_store: Arc<SessionStore>,
    /// Total attempts allowed per transient-failing lookup.
    retry_attempts: u32,
    /// Per-identity exclusion: concurrent resolves for one identity
    /// serialize here and re-read the cache instead of double-writing.
    inflight: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl std::fmt::Debug for RoleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleResolver")
            .field("retry_attempts", &self.retry_attempts)
            .finish()
    }
}

impl RoleResolver {
    /// Create a new resolver.
    pub fn new(
        role_store: Arc<dyn RoleStore>,
        directory: Arc<dyn MembershipDirectory>,
        role_cache: RoleCache,
        session_store: Arc<SessionStore>,
        retry_attempts: u32,
    ) -> Self {
        Self {
            role_store,
            directory,
            role_cache,
            session_store,
            retry_attempts: retry_attempts.max(1),
            inflight: DashMap::new(),
        }
    }

    /// Resolve the effective role for the session's identity.
    ///
    /// Idempotent per identity. Backend failures surface as
    /// `ErrorKind::RoleLookup`; the resolver never falls through to a
    /// default role on error, so the caller lands in a fail-closed
    /// unauthorized state.
    pub async fn resolve(&self, session: &Session) -> AppResult<Role> {
        let identity_id = session.identity_id;

        if let Some(role) = self.role_cache.get(identity_id).await? {
            debug!(%identity_id, %role, "Role cache hit");
            return Ok(role);
        }

        let lock = self
            .inflight
            .entry(identity_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let result = self.resolve_serialized(session, &lock).await;

        // Release the per-identity slot once no other caller holds it
        // (one reference in the map plus our clone).
        self.inflight
            .remove_if(&identity_id, |_, slot| Arc::strong_count(slot) <= 2);

        result
    }

    /// The serialized section: at most one caller per identity runs the
    /// fallback chain and commits the result to the cache.
    async fn resolve_serialized(&self, session: &Session, lock: &Mutex<()>) -> AppResult<Role> {
        let identity_id = session.identity_id;
        let _guard = lock.lock().await;

        // A caller we waited behind may have resolved and cached already.
        if let Some(role) = self.role_cache.get(identity_id).await? {
            debug!(%identity_id, %role, "Attached to completed resolution");
            return Ok(role);
        }

        let role = self.resolve_uncached(session).await?;

        // Staleness guard: the session identity may have changed while
        // lookups were in flight. A stale result is discarded, never
        // committed to the cache.
        if self.session_store.identity() != Some(identity_id) {
            debug!(%identity_id, "Discarding stale role resolution");
            return Err(AppError::role_lookup(
                "Session identity changed during resolution",
            ));
        }

        self.role_cache.put_default(identity_id, role).await?;

        // The identity can still change between the check above and the
        // commit. An entry written after that change's invalidation sweep
        // would survive it, so re-check and roll the write back.
        if self.session_store.identity() != Some(identity_id) {
            debug!(%identity_id, "Rolling back role cached for a superseded identity");
            self.role_cache.invalidate(identity_id).await?;
            return Err(AppError::role_lookup(
                "Session identity changed during resolution",
            ));
        }

        Ok(role)
    }

    /// Run the tiered fallback chain without consulting the cache.
    async fn resolve_uncached(&self, session: &Session) -> AppResult<Role> {
        let identity_id = session.identity_id;

        // 1. Durable role records.
        let records = self.select_roles_with_retry(identity_id).await?;
        if let Some(role) = Role::highest(&records) {
            debug!(%identity_id, %role, count = records.len(), "Role from durable records");
            return Ok(role);
        }

        // 2. Claim-metadata hint. Claims are not authoritative storage,
        // so nothing is persisted.
        if let Some(role) = session.claims.role {
            debug!(%identity_id, %role, "Role from claim metadata");
            return Ok(role);
        }

        // 3. Collector link.
        if self.collector_link_with_retry(identity_id).await? {
            debug!(%identity_id, "Role from collector link");
            return Ok(Role::Collector);
        }

        // 4. Provision a member record.
        self.provision_member(identity_id).await
    }

    /// Write-once provisioning of the default `member` role.
    async fn provision_member(&self, identity_id: Uuid) -> AppResult<Role> {
        match self
            .role_store
            .insert_role(identity_id, Role::Member, RoleSource::Provisioned)
            .await
        {
            Ok(_) => {
                info!(%identity_id, "Provisioned member role record");
                Ok(Role::Member)
            }
            Err(e) if e.kind == ErrorKind::ProvisioningConflict => {
                // Another writer provisioned concurrently; the record is
                // the source of truth, so re-read instead of erroring.
                debug!(%identity_id, "Provisioning conflict, re-reading records");
                let records = self.select_roles_with_retry(identity_id).await?;
                Role::highest(&records).ok_or_else(|| {
                    AppError::role_lookup("Provisioning conflict but no record readable")
                })
            }
            Err(e) => Err(AppError::with_source(
                ErrorKind::RoleLookup,
                format!("Failed to provision member role for {identity_id}"),
                e,
            )),
        }
    }

    async fn select_roles_with_retry(&self, identity_id: Uuid) -> AppResult<Vec<RoleRecord>> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.role_store.select_roles(identity_id).await {
                Ok(records) => return Ok(records),
                Err(e) if e.is_transient() && attempt < self.retry_attempts => {
                    warn!(%identity_id, attempt, error = %e, "Transient role lookup failure, retrying");
                }
                Err(e) => {
                    return Err(AppError::with_source(
                        ErrorKind::RoleLookup,
                        format!("Role record lookup failed after {attempt} attempt(s)"),
                        e,
                    ));
                }
            }
        }
    }

    async fn collector_link_with_retry(&self, identity_id: Uuid) -> AppResult<bool> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.directory.collector_link(identity_id).await {
                Ok(linked) => return Ok(linked),
                Err(e) if e.is_transient() && attempt < self.retry_attempts => {
                    warn!(%identity_id, attempt, error = %e, "Transient directory lookup failure, retrying");
                }
                Err(e) => {
                    return Err(AppError::with_source(
                        ErrorKind::RoleLookup,
                        format!("Collector link lookup failed after {attempt} attempt(s)"),
                        e,
                    ));
                }
            }
        }
    }
}
