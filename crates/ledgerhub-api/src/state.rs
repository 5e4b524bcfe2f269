//! Application state shared across all handlers via Axum's `State` extractor.

use std::sync::Arc;

use ledgerhub_auth::{
    AccessResolver, BruteForceGuard, LockoutPolicy, PasswordHasher, PasswordValidator,
    RbacPolicies, SessionCleanup, SessionManager, SessionStore, SubscriptionGate, TenantLifecycle,
    TokenService,
};
use ledgerhub_core::config::AppConfig;
use ledgerhub_database::repositories::{
    IdentityRepository, LoginAttemptRepository, MembershipRepository, RefreshTokenRepository,
    SubscriptionRepository, TenantRepository,
};
use ledgerhub_database::{BypassPurpose, Database};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Database entry point; handlers only take scoped handles from it.
    pub db: Database,
    /// Login, refresh, switching and password flows.
    pub session_manager: Arc<SessionManager>,
    /// Access and refresh token minting and validation.
    pub tokens: Arc<TokenService>,
    /// Subscription gate for tenant-scoped routes.
    pub gate: Arc<SubscriptionGate>,
    /// Tenant provisioning and lifecycle transitions.
    pub lifecycle: Arc<TenantLifecycle>,
    /// Role to permission table.
    pub policies: Arc<RbacPolicies>,
    /// Periodic session and lifecycle sweep.
    pub cleanup: Arc<SessionCleanup>,
}

impl AppState {
    /// Wire every repository and service from configuration.
    pub fn new(config: Arc<AppConfig>, db: Database) -> Self {
        let credentials = db.unscoped(BypassPurpose::CredentialLookup);
        let identities = Arc::new(IdentityRepository::new(credentials.clone()));
        let refresh_tokens = Arc::new(RefreshTokenRepository::new(credentials.clone()));
        let attempts = Arc::new(LoginAttemptRepository::new(credentials.clone()));

        let memberships = Arc::new(MembershipRepository::new(
            db.unscoped(BypassPurpose::AccessResolution),
        ));

        let billing = db.unscoped(BypassPurpose::SubscriptionCheck);
        let tenants = Arc::new(TenantRepository::new(billing.clone()));
        let subscriptions = Arc::new(SubscriptionRepository::new(billing));

        let maintenance = db.unscoped(BypassPurpose::Maintenance);

        let tokens = Arc::new(TokenService::new(&config.auth, refresh_tokens.clone()));
        let resolver = Arc::new(AccessResolver::new(db.clone(), memberships.clone()));
        let gate = Arc::new(SubscriptionGate::new(tenants.clone(), subscriptions.clone()));
        let guard = Arc::new(BruteForceGuard::new(
            attempts,
            LockoutPolicy::new(&config.lockout),
        ));

        let store = Arc::new(SessionStore::new(
            credentials.clone(),
            identities.clone(),
            refresh_tokens.clone(),
            resolver.clone(),
            gate.clone(),
            tokens.clone(),
            config.session.max_active_refresh_tokens,
        ));

        let session_manager = Arc::new(SessionManager::new(
            credentials,
            identities,
            tenants.clone(),
            Arc::new(PasswordHasher::new()),
            PasswordValidator::new(&config.auth),
            guard,
            resolver,
            gate.clone(),
            store,
        ));

        let lifecycle = Arc::new(TenantLifecycle::new(
            maintenance,
            tenants.clone(),
            subscriptions,
            memberships,
            &config.subscription,
        ));
        let cleanup = Arc::new(SessionCleanup::new(
            refresh_tokens,
            tenants,
            lifecycle.clone(),
            &config.session,
        ));

        Self {
            config,
            db,
            session_manager,
            tokens,
            gate,
            lifecycle,
            policies: Arc::new(RbacPolicies::new()),
            cleanup,
        }
    }
}
