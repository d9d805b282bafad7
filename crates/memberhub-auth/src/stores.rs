//! Role store and membership directory boundaries.

use async_trait::async_trait;
use uuid::Uuid;

use memberhub_core::result::AppResult;
use memberhub_entity::role::{Role, RoleRecord, RoleSource};

/// Durable store of role assignments.
///
/// Multiple records may exist per identity (legacy data); the resolver
/// applies the priority rule. This subsystem only ever inserts the lazily
/// provisioned `member` record and never deletes anything.
#[async_trait]
pub trait RoleStore: Send + Sync + std::fmt::Debug + 'static {
    /// All role records belonging to an identity.
    async fn select_roles(&self, identity_id: Uuid) -> AppResult<Vec<RoleRecord>>;

    /// Persist a new role record.
    ///
    /// Implementations must reject a duplicate (identity, role) pair with
    /// `ErrorKind::ProvisioningConflict` so concurrent provisioning can be
    /// resolved by re-reading instead of double-writing.
    async fn insert_role(
        &self,
        identity_id: Uuid,
        role: Role,
        source: RoleSource,
    ) -> AppResult<RoleRecord>;
}

/// Domain relationship lookup used as a resolution fallback.
#[async_trait]
pub trait MembershipDirectory: Send + Sync + std::fmt::Debug + 'static {
    /// Whether the identity is linked to a collector entity.
    async fn collector_link(&self, identity_id: Uuid) -> AppResult<bool>;
}
