//! Integration tests for tab access through the resolved role.

use uuid::Uuid;

use memberhub::{Role, RoleSource};

use crate::helpers::TestApp;

#[tokio::test]
async fn test_admin_sees_every_tab() {
    let app = TestApp::new().await;
    let id = Uuid::new_v4();
    app.roles.seed(id, Role::Admin, RoleSource::Assigned);
    app.sign_in(id);
    app.wait_for_role(Some(Role::Admin)).await;

    for tab in ["dashboard", "users", "collectors", "settings"] {
        assert!(app.context.can_access_tab(tab), "admin denied '{tab}'");
    }
}

#[tokio::test]
async fn test_collectors_tab_is_admin_only() {
    let app = TestApp::new().await;
    let id = Uuid::new_v4();
    app.directory.link(id);
    app.sign_in(id);
    app.wait_for_role(Some(Role::Collector)).await;

    assert!(app.context.can_access_tab("dashboard"));
    assert!(app.context.can_access_tab("users"));
    assert!(!app.context.can_access_tab("collectors"));
}

#[tokio::test]
async fn test_member_sees_dashboard_only() {
    let app = TestApp::new().await;
    let id = Uuid::new_v4();
    app.sign_in(id);
    app.wait_for_role(Some(Role::Member)).await;

    assert!(app.context.can_access_tab("dashboard"));
    assert!(!app.context.can_access_tab("users"));
    assert!(!app.context.can_access_tab("collectors"));
}

#[tokio::test]
async fn test_no_session_means_no_tabs() {
    let app = TestApp::new().await;

    assert_eq!(app.context.role(), None);
    assert!(!app.context.can_access_tab("dashboard"));
}
