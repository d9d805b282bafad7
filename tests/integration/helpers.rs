//! Shared test helpers for integration tests.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use memberhub::config::AppConfig;
use memberhub::{AuthContext, AuthRuntime, AuthState, Collaborators, Role, Session, bootstrap};
use memberhub_auth::memory::{
    MemoryIdentityProvider, MemoryLocalState, MemoryMembershipDirectory, MemoryRoleStore,
};

/// Test application context: the wired lifecycle core plus handles to the
/// in-memory collaborators it was built from.
pub struct TestApp {
    pub context: Arc<AuthContext>,
    pub runtime: AuthRuntime,
    pub provider: Arc<MemoryIdentityProvider>,
    pub roles: Arc<MemoryRoleStore>,
    pub directory: Arc<MemoryMembershipDirectory>,
    pub local_state: Arc<MemoryLocalState>,
}

impl TestApp {
    /// Create a test application with the default configuration.
    pub async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    /// Create a test application with a custom configuration.
    pub async fn with_config(config: AppConfig) -> Self {
        Self::with_setup(config, |_, _, _| {}).await
    }

    /// Create a test application, seeding the collaborators before the
    /// lifecycle core boots. Used to model state that exists at startup,
    /// such as a persisted session.
    pub async fn with_setup(
        config: AppConfig,
        setup: impl FnOnce(&MemoryIdentityProvider, &MemoryRoleStore, &MemoryMembershipDirectory),
    ) -> Self {
        let provider = Arc::new(MemoryIdentityProvider::new());
        let roles = Arc::new(MemoryRoleStore::new());
        let directory = Arc::new(MemoryMembershipDirectory::new());
        let local_state = Arc::new(MemoryLocalState::new());

        setup(&provider, &roles, &directory);

        let runtime = bootstrap(
            &config,
            Collaborators {
                provider: provider.clone(),
                role_store: roles.clone(),
                directory: directory.clone(),
                local_state: local_state.clone(),
            },
        )
        .await
        .expect("Failed to bootstrap lifecycle core");

        let context = runtime.context();

        Self {
            context,
            runtime,
            provider,
            roles,
            directory,
            local_state,
        }
    }

    /// Sign in a fresh identity and return its session.
    pub fn sign_in(&self, identity_id: Uuid) -> Session {
        let session = test_session(identity_id);
        self.provider.sign_in(session.clone());
        session
    }

    /// Poll until the condition holds, panicking after two seconds.
    pub async fn wait_until(&self, what: &str, condition: impl Fn() -> bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while !condition() {
            if tokio::time::Instant::now() >= deadline {
                panic!("Timed out waiting for {what}");
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Poll until the effective role matches.
    pub async fn wait_for_role(&self, expected: Option<Role>) {
        self.wait_until("role to settle", || self.context.role() == expected)
            .await;
    }

    /// Poll until the lifecycle state matches.
    pub async fn wait_for_state(&self, expected: AuthState) {
        self.wait_until("state to settle", || self.context.state() == expected)
            .await;
    }

    /// Poll until no resolution is in flight.
    pub async fn wait_for_idle(&self) {
        self.wait_until("resolution to finish", || !self.context.is_resolving())
            .await;
    }
}

/// A one-hour session for the given identity.
pub fn test_session(identity_id: Uuid) -> Session {
    Session::new(identity_id, format!("token-{identity_id}"), 3600)
}
