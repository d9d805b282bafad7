//! Tab access policy.
//!
//! An undetermined role (`None`) grants nothing: it is not an
//! authenticated low-privilege state but "determination pending or
//! failed", rendered as unauthorized.

use memberhub_entity::role::Role;

/// Tabs visible to collectors.
const COLLECTOR_TABS: &[&str] = &["dashboard", "users"];

/// Tabs visible to members.
const MEMBER_TABS: &[&str] = &["dashboard"];

/// Maps resolved roles to the tabs they may open.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabPolicy;

impl TabPolicy {
    /// Create the default policy.
    pub fn new() -> Self {
        Self
    }

    /// Whether the given role may open the given tab.
    ///
    /// Admins see every tab; collectors see dashboard and users; members
    /// see the dashboard only. No role, no tabs.
    pub fn can_access(&self, role: Option<Role>, tab: &str) -> bool {
        match role {
            None => false,
            Some(Role::Admin) => true,
            Some(Role::Collector) => COLLECTOR_TABS.contains(&tab),
            Some(Role::Member) => MEMBER_TABS.contains(&tab),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_sees_everything() {
        let policy = TabPolicy::new();
        for tab in ["dashboard", "users", "collectors", "settings"] {
            assert!(policy.can_access(Some(Role::Admin), tab));
        }
    }

    #[test]
    fn test_collectors_tab_is_admin_only() {
        let policy = TabPolicy::new();
        assert!(policy.can_access(Some(Role::Admin), "collectors"));
        assert!(!policy.can_access(Some(Role::Collector), "collectors"));
        assert!(!policy.can_access(Some(Role::Member), "collectors"));
        assert!(!policy.can_access(None, "collectors"));
    }

    #[test]
    fn test_collector_tabs() {
        let policy = TabPolicy::new();
        assert!(policy.can_access(Some(Role::Collector), "dashboard"));
        assert!(policy.can_access(Some(Role::Collector), "users"));
        assert!(!policy.can_access(Some(Role::Collector), "settings"));
    }

    #[test]
    fn test_member_sees_dashboard_only() {
        let policy = TabPolicy::new();
        assert!(policy.can_access(Some(Role::Member), "dashboard"));
        assert!(!policy.can_access(Some(Role::Member), "users"));
    }

    #[test]
    fn test_no_role_sees_nothing() {
        let policy = TabPolicy::new();
        assert!(!policy.can_access(None, "dashboard"));
    }
}
