//! Role enumeration and role-record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Roles granted to authenticated principals.
///
/// Roles are ordered by privilege level: Admin > Collector > Member.
/// An undetermined or failed determination is represented as
/// `Option<Role>::None` by callers and is never persisted or cached —
/// it is not an authenticated low-privilege state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access.
    Admin,
    /// Collects payments from members; limited management access.
    Collector,
    /// Regular member with read access to their own data.
    Member,
}

impl Role {
    /// Return the privilege level (higher = more privileged).
    pub fn priority_level(&self) -> u8 {
        match self {
            Self::Admin => 3,
            Self::Collector => 2,
            Self::Member => 1,
        }
    }

    /// Check if this role has at least the given role's privileges.
    pub fn has_at_least(&self, other: &Role) -> bool {
        self.priority_level() >= other.priority_level()
    }

    /// Check if this role is an admin.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Collector => "collector",
            Self::Member => "member",
        }
    }

    /// Pick the highest-priority role from a set of records.
    ///
    /// Legacy data may hold several records per identity; the effective
    /// role is the most privileged one regardless of record order.
    pub fn highest<'a, I>(records: I) -> Option<Role>
    where
        I: IntoIterator<Item = &'a RoleRecord>,
    {
        records
            .into_iter()
            .map(|r| r.role)
            .max_by_key(Role::priority_level)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = memberhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "collector" => Ok(Self::Collector),
            "member" => Ok(Self::Member),
            _ => Err(memberhub_core::AppError::validation(format!(
                "Invalid role: '{s}'. Expected one of: admin, collector, member"
            ))),
        }
    }
}

/// Where a role record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleSource {
    /// Written explicitly by an administrator.
    Assigned,
    /// Written lazily by the resolver for an identity with no record.
    Provisioned,
}

/// A durable (identity, role) assignment persisted by the role store.
///
/// Records are write-once from this subsystem's point of view: the
/// resolver provisions at most one `member` record per identity and
/// never deletes anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleRecord {
    /// Unique record identifier.
    pub id: Uuid,
    /// The identity this assignment belongs to.
    pub identity_id: Uuid,
    /// The granted role.
    pub role: Role,
    /// How the record was created.
    pub source: RoleSource,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl RoleRecord {
    /// Build a new record for an identity.
    pub fn new(identity_id: Uuid, role: Role, source: RoleSource) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity_id,
            role,
            source,
            created_at: Utc::now(),
        }
    }
}
