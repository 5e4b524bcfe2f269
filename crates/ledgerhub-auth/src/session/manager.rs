//! Login, refresh, logout, tenant and company switching, and password
//! change.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use ledgerhub_core::error::{AppError, ErrorKind};
use ledgerhub_core::result::AppResult;
use ledgerhub_database::UnscopedDb;
use ledgerhub_database::repositories::{IdentityRepository, TenantRepository};
use ledgerhub_entity::identity::{Identity, IdentitySummary};
use ledgerhub_entity::login_attempt::FailureReason;
use ledgerhub_entity::membership::Role;
use ledgerhub_entity::session::RevocationReason;
use ledgerhub_entity::tenant::TenantStatus;

use crate::access::{AccessResolver, ResolvedAccess};
use crate::identity::RequestIdentity;
use crate::jwt::MintedAccessToken;
use crate::lockout::{AttemptOutcome, BruteForceGuard};
use crate::password::{PasswordHasher, PasswordValidator};
use crate::subscription::{GateOutcome, SubscriptionGate};

use super::ClientInfo;
use super::store::{IssuedSession, RotatedSession, SessionContext, SessionStore};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub session: IssuedSession,
    pub identity: IdentitySummary,
    pub gate: GateOutcome,
}

/// Result of a tenant or company switch.
#[derive(Debug, Clone)]
pub struct SwitchResult {
    pub access: MintedAccessToken,
    pub context: SessionContext,
    pub gate: GateOutcome,
}

/// A tenant the identity may switch to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantChoice {
    pub tenant_id: Uuid,
    pub name: String,
    pub status: TenantStatus,
    pub role: Role,
}

/// Lower-cased, trimmed email used as the lockout key and lookup value.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Orchestrates the credential and session flows.
#[derive(Debug, Clone)]
pub struct SessionManager {
    db: UnscopedDb,
    identities: Arc<IdentityRepository>,
    tenants: Arc<TenantRepository>,
    hasher: Arc<PasswordHasher>,
    validator: PasswordValidator,
    guard: Arc<BruteForceGuard>,
    resolver: Arc<AccessResolver>,
    gate: Arc<SubscriptionGate>,
    store: Arc<SessionStore>,
}

impl SessionManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: UnscopedDb,
        identities: Arc<IdentityRepository>,
        tenants: Arc<TenantRepository>,
        hasher: Arc<PasswordHasher>,
        validator: PasswordValidator,
        guard: Arc<BruteForceGuard>,
        resolver: Arc<AccessResolver>,
        gate: Arc<SubscriptionGate>,
        store: Arc<SessionStore>,
    ) -> Self {
        Self {
            db,
            identities,
            tenants,
            hasher,
            validator,
            guard,
            resolver,
            gate,
            store,
        }
    }

    /// Performs the complete login flow:
    ///
    /// 1. Reject if the email or client IP is locked
    /// 2. Verify credentials, recording the attempt either way
    /// 3. Pick the first accessible tenant the subscription gate admits
    /// 4. Resolve company access and issue a token pair
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client: &ClientInfo,
        now: DateTime<Utc>,
    ) -> AppResult<LoginResult> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AppError::validation("Email and password are required"));
        }
        let ip = client.ip_address.as_deref();

        let status = self.guard.check_lock(&email, ip, now).await?;
        if status.locked {
            return Err(status.to_error());
        }

        let identity = match self.identities.find_by_email(&email).await? {
            Some(identity) => identity,
            None => {
                self.hasher.verify_against_dummy(password);
                return Err(self.reject(&email, ip, FailureReason::UnknownEmail, now).await);
            }
        };
        if !self.hasher.verify_password(password, &identity.password_hash)? {
            return Err(self.reject(&email, ip, FailureReason::InvalidPassword, now).await);
        }
        if !identity.is_active {
            return Err(self.reject(&email, ip, FailureReason::AccountInactive, now).await);
        }
        self.guard
            .record_attempt(&email, ip, AttemptOutcome::Success, now)
            .await;

        let (access, gate) = self.select_login_tenant(identity.id, now).await?;
        let company_id = access.default_company();
        let session = self
            .store
            .issue(
                SessionContext {
                    identity_id: identity.id,
                    email: identity.email.clone(),
                    access,
                    company_id,
                },
                client,
                now,
            )
            .await?;

        info!(
            identity_id = %identity.id,
            tenant_id = %session.context.access.tenant_id,
            session_id = %session.session_id,
            "Login successful"
        );
        Ok(LoginResult {
            session,
            identity: identity.summary(),
            gate,
        })
    }

    /// Record a failed attempt and build the response error. A failure
    /// that crosses a threshold reports the new lock.
    async fn reject(
        &self,
        email: &str,
        ip: Option<&str>,
        reason: FailureReason,
        now: DateTime<Utc>,
    ) -> AppError {
        self.guard
            .record_attempt(email, ip, AttemptOutcome::Failure(reason), now)
            .await;
        debug!(email = %email, reason = ?reason, "Login rejected");

        match self.guard.check_lock(email, ip, now).await {
            Ok(status) if status.locked => status.to_error(),
            _ => AppError::authentication(INVALID_CREDENTIALS),
        }
    }

    /// Accessible tenants are tried in order; the first the gate admits
    /// wins. When every tenant is blocked, the first block is returned.
    async fn select_login_tenant(
        &self,
        identity_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<(ResolvedAccess, GateOutcome)> {
        let grants = self.resolver.accessible_tenants(identity_id).await?;
        let mut first_block: Option<AppError> = None;

        for grant in grants {
            match self.gate.check(grant.tenant_id, now).await {
                Ok(gate) => {
                    let access = self
                        .resolver
                        .resolve_for_tenant(identity_id, grant.tenant_id)
                        .await?;
                    return Ok((access, gate));
                }
                Err(e) if e.kind == ErrorKind::Subscription => {
                    debug!(tenant_id = %grant.tenant_id, "Skipping blocked tenant at login");
                    first_block.get_or_insert(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(first_block.unwrap_or_else(|| AppError::authorization("Identity has no tenant access")))
    }

    /// Rotate a refresh token.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        client: &ClientInfo,
        now: DateTime<Utc>,
    ) -> AppResult<RotatedSession> {
        if refresh_token.trim().is_empty() {
            return Err(AppError::validation("Refresh token is required"));
        }
        self.store.refresh(refresh_token, client, now).await
    }

    /// Revoke a refresh token. Idempotent.
    pub async fn logout(&self, refresh_token: &str, now: DateTime<Utc>) -> AppResult<()> {
        if refresh_token.trim().is_empty() {
            return Err(AppError::validation("Refresh token is required"));
        }
        self.store
            .revoke(refresh_token, RevocationReason::Logout, now)
            .await?;
        Ok(())
    }

    /// Re-mint an access token for another tenant the identity can access.
    pub async fn switch_tenant(
        &self,
        caller: &RequestIdentity,
        tenant_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<SwitchResult> {
        let identity = self.active_identity(caller.identity_id()).await?;
        let access = self
            .resolver
            .resolve_for_tenant(identity.id, tenant_id)
            .await?;
        let gate = self.gate.check(tenant_id, now).await?;
        let company_id = access.default_company();

        let context = SessionContext {
            identity_id: identity.id,
            email: identity.email,
            access,
            company_id,
        };
        let result = self.remint(caller, context, gate, now).await?;
        info!(identity_id = %caller.identity_id(), from = %caller.tenant_id(), to = %tenant_id, "Switched tenant");
        Ok(result)
    }

    /// Re-mint an access token with another active company. Authorized
    /// from the presented token's company list.
    pub async fn switch_company(
        &self,
        caller: &RequestIdentity,
        company_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<SwitchResult> {
        if !caller.can_access_company(company_id) {
            warn!(identity_id = %caller.identity_id(), company_id = %company_id, "Company switch denied");
            return Err(AppError::authorization("No access to the requested company"));
        }
        let gate = self.gate.check(caller.tenant_id(), now).await?;

        let context = SessionContext {
            identity_id: caller.identity_id(),
            email: caller.email().to_string(),
            access: ResolvedAccess {
                tenant_id: caller.tenant_id(),
                role: caller.role(),
                companies: caller.companies().to_vec(),
            },
            company_id: Some(company_id),
        };
        let result = self.remint(caller, context, gate, now).await?;
        debug!(identity_id = %caller.identity_id(), company_id = %company_id, "Switched company");
        Ok(result)
    }

    async fn remint(
        &self,
        caller: &RequestIdentity,
        context: SessionContext,
        gate: GateOutcome,
        now: DateTime<Utc>,
    ) -> AppResult<SwitchResult> {
        self.store
            .update_context(caller.session_id(), context.access.tenant_id, context.company_id)
            .await?;
        let access = self
            .store
            .tokens()
            .mint_access_token(&context.subject(caller.session_id()), now)?;
        Ok(SwitchResult {
            access,
            context,
            gate,
        })
    }

    /// Change the caller's password and revoke every refresh token in the
    /// same transaction. Returns the number of revoked tokens.
    pub async fn change_password(
        &self,
        identity_id: Uuid,
        current_password: &str,
        new_password: &str,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut uow = self.db.begin().await?;
        let identity = self
            .identities
            .lock_by_id(&mut uow, identity_id)
            .await?
            .filter(|i| i.is_active)
            .ok_or_else(|| AppError::authentication("Account is inactive"))?;

        if !self
            .hasher
            .verify_password(current_password, &identity.password_hash)?
        {
            return Err(AppError::authentication("Current password is incorrect"));
        }
        self.validator
            .validate_not_same(current_password, new_password)?;
        let mut inputs = vec![identity.email.as_str()];
        inputs.extend(identity.display_name.as_deref());
        self.validator.validate(new_password, &inputs)?;

        let hash = self.hasher.hash_password(new_password)?;
        self.identities
            .update_password_hash(&mut uow, identity_id, &hash, now)
            .await?;
        let revoked = self
            .store
            .revoke_all_in(&mut uow, identity_id, RevocationReason::PasswordChanged, now)
            .await?;
        uow.commit().await?;

        info!(identity_id = %identity_id, revoked = revoked, "Password changed");
        Ok(revoked)
    }

    /// Clear failed attempts for an email and/or IP. System admins only.
    pub async fn unlock_login_attempts(
        &self,
        caller: &RequestIdentity,
        email: Option<&str>,
        ip_address: Option<&str>,
        reason: &str,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let admin = self.require_system_admin(caller).await?;
        let email = email.map(normalize_email).filter(|e| !e.is_empty());
        let ip_address = ip_address.map(str::trim).filter(|ip| !ip.is_empty());
        if email.is_none() && ip_address.is_none() {
            return Err(AppError::validation("An email or an IP address is required"));
        }
        self.guard
            .unlock(email.as_deref(), ip_address, admin.id, reason, now)
            .await
    }

    /// Load the caller and fail unless they are a platform operator.
    pub async fn require_system_admin(&self, caller: &RequestIdentity) -> AppResult<Identity> {
        let identity = self.active_identity(caller.identity_id()).await?;
        if !identity.is_system_admin {
            warn!(identity_id = %identity.id, "System admin operation denied");
            return Err(AppError::authorization("System administrator access required"));
        }
        Ok(identity)
    }

    pub async fn current_identity(&self, identity_id: Uuid) -> AppResult<IdentitySummary> {
        Ok(self.active_identity(identity_id).await?.summary())
    }

    /// Tenants the identity may switch to, in resolution order.
    pub async fn list_tenants(&self, identity_id: Uuid) -> AppResult<Vec<TenantChoice>> {
        let grants = self.resolver.accessible_tenants(identity_id).await?;
        let ids: Vec<Uuid> = grants.iter().map(|g| g.tenant_id).collect();
        let tenants = self.tenants.find_by_ids(&ids).await?;

        Ok(grants
            .iter()
            .filter_map(|grant| {
                tenants
                    .iter()
                    .find(|t| t.id == grant.tenant_id)
                    .map(|t| TenantChoice {
                        tenant_id: t.id,
                        name: t.name.clone(),
                        status: t.status,
                        role: grant.role,
                    })
            })
            .collect())
    }

    async fn active_identity(&self, identity_id: Uuid) -> AppResult<Identity> {
        self.identities
            .find_by_id(identity_id)
            .await?
            .filter(|i| i.is_active)
            .ok_or_else(|| AppError::authentication("Account is inactive"))
    }
}
