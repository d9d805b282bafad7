//! Memberhub — role resolution and session lifecycle core.
//!
//! Facade crate that wires the member crates together: construct the
//! collaborator implementations (identity provider, role store, membership
//! directory, local-state store), hand them to [`bootstrap`], and read
//! authentication state through the returned [`AuthContext`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing_subscriber::{EnvFilter, fmt};

use memberhub_core::config::AppConfig;
use memberhub_core::config::LoggingConfig;
use memberhub_core::events::DomainEvent;
use memberhub_core::traits::LocalStateStore;

pub use memberhub_auth::{
    AuthContext, AuthEvent, AuthEventDispatcher, AuthState, ErrorDisposition, IdentityProvider,
    MembershipDirectory, RoleResolver, RoleStore, SessionGuard, SessionStore, SessionTransition,
    TabPolicy,
};
pub use memberhub_cache::provider::CacheManager;
pub use memberhub_cache::role_cache::RoleCache;
pub use memberhub_core::{AppError, AppResult, ErrorKind};
pub use memberhub_entity::role::{Role, RoleRecord, RoleSource};
pub use memberhub_entity::session::{Session, SessionClaims};

pub use memberhub_core::config;

/// The external collaborators the lifecycle core is built around.
///
/// Production deployments supply adapters over the real identity provider
/// and membership directory; tests use the `memberhub_auth::memory`
/// implementations.
pub struct Collaborators {
    pub provider: Arc<dyn IdentityProvider>,
    pub role_store: Arc<dyn RoleStore>,
    pub directory: Arc<dyn MembershipDirectory>,
    pub local_state: Arc<dyn LocalStateStore>,
}

/// A running lifecycle core.
pub struct AuthRuntime {
    context: Arc<AuthContext>,
    events: broadcast::Sender<DomainEvent>,
}

impl AuthRuntime {
    /// The presentation-facing surface.
    pub fn context(&self) -> Arc<AuthContext> {
        Arc::clone(&self.context)
    }

    /// Observe domain events (session established / refreshed / destroyed).
    pub fn subscribe_events(&self) -> broadcast::Receiver<DomainEvent> {
        self.events.subscribe()
    }
}

/// Build the lifecycle core from configuration and collaborators.
///
/// Constructs the cache, session store, guard, dispatcher, and resolver,
/// spawns the background tasks, and seeds state from any session the
/// provider already holds.
pub async fn bootstrap(config: &AppConfig, collaborators: Collaborators) -> AppResult<AuthRuntime> {
    let cache = Arc::new(CacheManager::new(&config.cache)?);
    let role_cache = RoleCache::new(
        Arc::clone(&cache),
        Duration::from_secs(config.auth.role_ttl_seconds),
    );

    let session_store = Arc::new(SessionStore::new());
    let (events, _) = broadcast::channel(256);

    let guard = Arc::new(SessionGuard::new(
        role_cache.clone(),
        Arc::clone(&session_store),
        Arc::clone(&collaborators.provider),
        Arc::clone(&collaborators.local_state),
        events.clone(),
        config.auth.sign_in_path.clone(),
    ));

    let dispatcher = Arc::new(AuthEventDispatcher::new(
        Arc::clone(&session_store),
        role_cache.clone(),
        Arc::clone(&guard),
        events.clone(),
    ));

    let resolver = Arc::new(RoleResolver::new(
        Arc::clone(&collaborators.role_store),
        Arc::clone(&collaborators.directory),
        role_cache,
        Arc::clone(&session_store),
        config.auth.lookup_retry_attempts,
    ));

    let context = AuthContext::start(
        collaborators.provider,
        session_store,
        dispatcher,
        resolver,
        guard,
        config.auth.lookup_retry_attempts,
    );
    context.initialize().await;

    Ok(AuthRuntime { context, events })
}

/// Initialize tracing from the logging configuration.
///
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}
