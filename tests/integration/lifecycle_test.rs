//! Integration tests for the session lifecycle: sign-in, startup
//! restoration, credential errors, and forced sign-out teardown.

use std::time::Duration;

use uuid::Uuid;

use memberhub::config::AppConfig;
use memberhub::{AppError, AuthState, Role, RoleSource, Session};
use memberhub_core::events::{EventPayload, SessionEvent};
use memberhub_core::traits::LocalStateStore;

use crate::helpers::{TestApp, test_session};

#[tokio::test]
async fn test_sign_in_authenticates_and_resolves_role() {
    let app = TestApp::new().await;
    let id = Uuid::new_v4();
    app.roles.seed(id, Role::Admin, RoleSource::Assigned);

    app.sign_in(id);

    app.wait_for_state(AuthState::Authenticated).await;
    app.wait_for_role(Some(Role::Admin)).await;
    assert_eq!(app.context.session().map(|s| s.identity_id), Some(id));
}

#[tokio::test]
async fn test_existing_session_restored_at_startup() {
    let id = Uuid::new_v4();
    let app = TestApp::with_setup(AppConfig::default(), |provider, roles, _| {
        roles.seed(id, Role::Member, RoleSource::Assigned);
        provider.set_session(Some(test_session(id)));
    })
    .await;

    app.wait_for_state(AuthState::Authenticated).await;
    app.wait_for_role(Some(Role::Member)).await;
}

#[tokio::test]
async fn test_expired_existing_session_is_ignored() {
    let id = Uuid::new_v4();
    let app = TestApp::with_setup(AppConfig::default(), |provider, _, _| {
        provider.set_session(Some(Session::new(id, "stale-token", -10)));
    })
    .await;

    app.wait_for_state(AuthState::Unauthenticated).await;
    assert_eq!(app.context.role(), None);
    assert!(app.context.session().is_none());
}

#[tokio::test]
async fn test_startup_lookup_retry_recovers_existing_session() {
    let id = Uuid::new_v4();
    let app = TestApp::with_setup(AppConfig::default(), |provider, roles, _| {
        roles.seed(id, Role::Collector, RoleSource::Assigned);
        provider.set_session(Some(test_session(id)));
        // One failure leaves one attempt in the default budget of two.
        provider.push_lookup_failure(AppError::transient("connection reset"));
    })
    .await;

    app.wait_for_state(AuthState::Authenticated).await;
    app.wait_for_role(Some(Role::Collector)).await;
    assert_eq!(app.provider.lookup_calls(), 2);
}

#[tokio::test]
async fn test_exhausted_startup_lookup_starts_signed_out() {
    let id = Uuid::new_v4();
    let app = TestApp::with_setup(AppConfig::default(), |provider, _, _| {
        provider.set_session(Some(test_session(id)));
        provider.push_lookup_failure(AppError::transient("connection reset"));
        provider.push_lookup_failure(AppError::transient("connection reset"));
    })
    .await;

    // The state machine must settle as signed out, never stay stuck
    // mid-bootstrap behind an unreachable provider.
    app.wait_for_state(AuthState::Unauthenticated).await;
    assert_eq!(app.context.role(), None);
    assert!(app.context.session().is_none());
    assert_eq!(app.provider.lookup_calls(), 2);
}

#[tokio::test]
async fn test_sign_out_tears_everything_down() {
    let app = TestApp::new().await;
    let id = Uuid::new_v4();
    app.sign_in(id);
    app.wait_for_role(Some(Role::Member)).await;
    app.local_state.put("draft", "unsaved").await.unwrap();

    app.context.request_sign_out();

    app.wait_for_state(AuthState::Unauthenticated).await;
    app.wait_for_role(None).await;
    assert!(app.context.session().is_none());
    assert!(app.local_state.is_empty());
    assert_eq!(app.provider.sign_out_calls(), 1);
    assert_eq!(
        *app.context.subscribe_navigation().borrow(),
        Some("/login".to_string())
    );
}

#[tokio::test]
async fn test_fatal_credential_error_redirects_to_sign_in() {
    let app = TestApp::new().await;
    let id = Uuid::new_v4();
    app.sign_in(id);
    app.wait_for_role(Some(Role::Member)).await;

    // Marker-based detection: the kind alone does not mark this fatal.
    app.provider
        .emit_credential_error(AppError::internal("JWT expired"));

    app.wait_for_state(AuthState::Unauthenticated).await;
    app.wait_for_role(None).await;
    assert!(app.context.session().is_none());
    assert_eq!(
        *app.context.subscribe_navigation().borrow(),
        Some("/login".to_string())
    );
}

#[tokio::test]
async fn test_token_refresh_does_not_re_resolve() {
    let app = TestApp::new().await;
    let id = Uuid::new_v4();
    app.sign_in(id);
    app.wait_for_role(Some(Role::Member)).await;
    assert_eq!(app.roles.insert_count(), 1);

    app.provider
        .refresh(test_session(id).with_refresh_token("rotated"));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(app.context.state(), AuthState::Authenticated);
    assert_eq!(app.context.role(), Some(Role::Member));
    // Same identity: the refreshed credential replaced the session
    // without another resolution pass.
    assert_eq!(app.roles.insert_count(), 1);
    assert_eq!(
        app.context.session().unwrap().refresh_token.as_deref(),
        Some("rotated")
    );
}

#[tokio::test]
async fn test_transient_error_preserves_session() {
    let app = TestApp::new().await;
    let id = Uuid::new_v4();
    app.sign_in(id);
    app.wait_for_role(Some(Role::Member)).await;

    app.provider
        .emit_credential_error(AppError::transient("Failed to fetch"));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(app.context.state(), AuthState::Authenticated);
    assert_eq!(app.context.role(), Some(Role::Member));
    assert_eq!(app.provider.sign_out_calls(), 0);
}

#[tokio::test]
async fn test_sign_out_racing_resolution_leaves_no_access() {
    let app = TestApp::new().await;
    let id = Uuid::new_v4();
    app.roles.seed(id, Role::Admin, RoleSource::Assigned);

    // Sign out immediately, without waiting for the resolution to land.
    app.sign_in(id);
    app.context.request_sign_out();

    app.wait_for_state(AuthState::Unauthenticated).await;
    app.wait_for_role(None).await;
    app.wait_for_idle().await;
    assert!(!app.context.can_access_tab("dashboard"));
    assert!(app.context.session().is_none());
}

#[tokio::test]
async fn test_domain_events_cover_the_session_lifetime() {
    let app = TestApp::new().await;
    let mut events = app.runtime.subscribe_events();
    let id = Uuid::new_v4();

    app.sign_in(id);
    app.wait_for_state(AuthState::Authenticated).await;
    app.context.request_sign_out();
    app.wait_for_state(AuthState::Unauthenticated).await;

    let first = tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("an event should arrive")
        .unwrap();
    let EventPayload::Session(SessionEvent::Established { identity_id }) = first.payload else {
        panic!("Expected an established event, got {:?}", first.payload);
    };
    assert_eq!(identity_id, id);

    let second = tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("an event should arrive")
        .unwrap();
    let EventPayload::Session(SessionEvent::Destroyed { identity_id, .. }) = second.payload else {
        panic!("Expected a destroyed event, got {:?}", second.payload);
    };
    assert_eq!(identity_id, Some(id));
}
