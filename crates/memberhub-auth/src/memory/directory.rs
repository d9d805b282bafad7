//! In-memory membership directory.

use async_trait::async_trait;
use dashmap::DashSet;
use uuid::Uuid;

use memberhub_core::result::AppResult;

use crate::stores::MembershipDirectory;

/// In-memory collector-link registry.
#[derive(Debug, Default)]
pub struct MemoryMembershipDirectory {
    /// Identities linked to a collector entity.
    linked: DashSet<Uuid>,
}

impl MemoryMembershipDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Link an identity to a collector entity.
    pub fn link(&self, identity_id: Uuid) {
        self.linked.insert(identity_id);
    }

    /// Remove a collector link.
    pub fn unlink(&self, identity_id: Uuid) {
        self.linked.remove(&identity_id);
    }
}

#[async_trait]
impl MembershipDirectory for MemoryMembershipDirectory {
    async fn collector_link(&self, identity_id: Uuid) -> AppResult<bool> {
        Ok(self.linked.contains(&identity_id))
    }
}
