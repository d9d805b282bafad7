//! In-memory role store.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use memberhub_core::error::AppError;
use memberhub_core::result::AppResult;
use memberhub_entity::role::{Role, RoleRecord, RoleSource};

use crate::stores::RoleStore;

/// In-memory role store with scripted failure injection.
///
/// Enforces the write-once provisioning contract: a duplicate
/// (identity, role) insert fails with a provisioning conflict.
#[derive(Debug)]
pub struct MemoryRoleStore {
    /// Records per identity.
    records: DashMap<Uuid, Vec<RoleRecord>>,
    /// Number of successful inserts.
    insert_count: AtomicUsize,
    /// Scripted failures, consumed one per `select_roles` call.
    failures: Mutex<VecDeque<AppError>>,
    /// When armed, the next insert loses a simulated race: the record
    /// appears (written by the "other" writer) and the insert conflicts.
    conflict_next: AtomicBool,
}

impl MemoryRoleStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            insert_count: AtomicUsize::new(0),
            failures: Mutex::new(VecDeque::new()),
            conflict_next: AtomicBool::new(false),
        }
    }

    /// Seed a record directly, bypassing the conflict check.
    pub fn seed(&self, identity_id: Uuid, role: Role, source: RoleSource) {
        self.records
            .entry(identity_id)
            .or_default()
            .push(RoleRecord::new(identity_id, role, source));
    }

    /// Number of successful inserts since construction.
    pub fn insert_count(&self) -> usize {
        self.insert_count.load(Ordering::SeqCst)
    }

    /// Queue an error to be returned by the next `select_roles` call.
    pub fn push_failure(&self, error: AppError) {
        self.failures
            .lock()
            .expect("failure queue poisoned")
            .push_back(error);
    }

    /// How many scripted failures remain unconsumed.
    pub fn pending_failures(&self) -> usize {
        self.failures.lock().expect("failure queue poisoned").len()
    }

    /// Make the next insert lose a simulated provisioning race.
    pub fn conflict_next_insert(&self) {
        self.conflict_next.store(true, Ordering::SeqCst);
    }
}

impl Default for MemoryRoleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoleStore for MemoryRoleStore {
    async fn select_roles(&self, identity_id: Uuid) -> AppResult<Vec<RoleRecord>> {
        if let Some(error) = self
            .failures
            .lock()
            .expect("failure queue poisoned")
            .pop_front()
        {
            return Err(error);
        }

        Ok(self
            .records
            .get(&identity_id)
            .map(|r| r.value().clone())
            .unwrap_or_default())
    }

    async fn insert_role(
        &self,
        identity_id: Uuid,
        role: Role,
        source: RoleSource,
    ) -> AppResult<RoleRecord> {
        let record = RoleRecord::new(identity_id, role, source);

        if self.conflict_next.swap(false, Ordering::SeqCst) {
            // The simulated concurrent writer wins the race.
            self.records
                .entry(identity_id)
                .or_default()
                .push(record);
            return Err(AppError::provisioning_conflict(format!(
                "Role record ({identity_id}, {role}) already exists"
            )));
        }

        let mut entry = self.records.entry(identity_id).or_default();
        if entry.iter().any(|r| r.role == role) {
            return Err(AppError::provisioning_conflict(format!(
                "Role record ({identity_id}, {role}) already exists"
            )));
        }

        entry.push(record.clone());
        self.insert_count.fetch_add(1, Ordering::SeqCst);
        Ok(record)
    }
}
