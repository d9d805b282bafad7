//! Integration tests for tiered role resolution: record precedence, claim
//! hints, collector links, lazy provisioning, and fail-closed errors.

use uuid::Uuid;

use memberhub::{AppError, AuthState, Role, RoleSource, SessionClaims};

use crate::helpers::{TestApp, test_session};

#[tokio::test]
async fn test_admin_wins_over_lower_roles() {
    let app = TestApp::new().await;
    let id = Uuid::new_v4();
    app.roles.seed(id, Role::Member, RoleSource::Assigned);
    app.roles.seed(id, Role::Admin, RoleSource::Assigned);
    app.roles.seed(id, Role::Collector, RoleSource::Assigned);

    app.sign_in(id);

    app.wait_for_role(Some(Role::Admin)).await;
}

#[tokio::test]
async fn test_claim_hint_resolves_without_directory_or_writes() {
    let app = TestApp::new().await;
    let id = Uuid::new_v4();
    let session = test_session(id).with_claims(SessionClaims {
        role: Some(Role::Collector),
        email: None,
    });

    app.provider.sign_in(session);

    app.wait_for_role(Some(Role::Collector)).await;
    assert_eq!(app.roles.insert_count(), 0);
}

#[tokio::test]
async fn test_collector_link_grants_collector() {
    let app = TestApp::new().await;
    let id = Uuid::new_v4();
    app.directory.link(id);

    app.sign_in(id);

    app.wait_for_role(Some(Role::Collector)).await;
    assert_eq!(app.roles.insert_count(), 0);
}

#[tokio::test]
async fn test_unknown_identity_is_provisioned_as_member() {
    let app = TestApp::new().await;
    let id = Uuid::new_v4();

    app.sign_in(id);

    app.wait_for_role(Some(Role::Member)).await;
    assert_eq!(app.roles.insert_count(), 1);
}

#[tokio::test]
async fn test_member_not_reprovisioned_across_sessions() {
    let app = TestApp::new().await;
    let id = Uuid::new_v4();

    app.sign_in(id);
    app.wait_for_role(Some(Role::Member)).await;

    app.context.request_sign_out();
    app.wait_for_state(AuthState::Unauthenticated).await;
    app.wait_for_role(None).await;

    // Second session: the provisioned record is found, no new insert.
    app.sign_in(id);
    app.wait_for_role(Some(Role::Member)).await;
    assert_eq!(app.roles.insert_count(), 1);
}

#[tokio::test]
async fn test_collector_round_trip_never_provisions() {
    let app = TestApp::new().await;
    let id = Uuid::new_v4();
    app.directory.link(id);

    app.sign_in(id);
    app.wait_for_role(Some(Role::Collector)).await;

    app.context.request_sign_out();
    app.wait_for_state(AuthState::Unauthenticated).await;
    app.wait_for_role(None).await;

    app.sign_in(id);
    app.wait_for_role(Some(Role::Collector)).await;
    assert_eq!(app.roles.insert_count(), 0);
}

#[tokio::test]
async fn test_exhausted_lookup_fails_closed_and_is_not_cached() {
    let app = TestApp::new().await;
    let id = Uuid::new_v4();
    app.roles.push_failure(AppError::transient("timeout"));
    app.roles.push_failure(AppError::transient("timeout"));

    app.sign_in(id);

    // Both attempts of the retry budget fail; no role is granted but the
    // session itself stays usable.
    app.wait_until("lookup failures to be consumed", || {
        app.roles.pending_failures() == 0
    })
    .await;
    app.wait_for_idle().await;
    assert_eq!(app.context.role(), None);
    assert!(!app.context.can_access_tab("dashboard"));
    assert_eq!(app.context.state(), AuthState::Authenticated);

    // The failure was not memoized: the next resolution succeeds.
    app.context.request_sign_out();
    app.wait_for_state(AuthState::Unauthenticated).await;
    app.sign_in(id);
    app.wait_for_role(Some(Role::Member)).await;
}
