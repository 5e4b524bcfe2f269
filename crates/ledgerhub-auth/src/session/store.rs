//! Refresh token persistence and rotation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use ledgerhub_core::error::{AppError, ErrorKind};
use ledgerhub_core::result::AppResult;
use ledgerhub_database::repositories::{IdentityRepository, RefreshTokenRepository};
use ledgerhub_database::{UnitOfWork, UnscopedDb};
use ledgerhub_entity::identity::Identity;
use ledgerhub_entity::session::{NewRefreshToken, RefreshToken, RevocationReason};

use crate::access::{AccessResolver, ResolvedAccess};
use crate::jwt::{AccessSubject, MintedAccessToken};
use crate::subscription::{GateOutcome, SubscriptionGate};
use crate::token::{MintedRefreshToken, TokenService, hash_refresh_token};

use super::ClientInfo;

/// Everything an access token is minted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub identity_id: Uuid,
    pub email: String,
    /// Resolved access in the session's tenant.
    pub access: ResolvedAccess,
    /// Active company, always one of `access.companies` when set.
    pub company_id: Option<Uuid>,
}

impl SessionContext {
    pub fn subject(&self, session_id: Uuid) -> AccessSubject {
        AccessSubject {
            identity_id: self.identity_id,
            email: self.email.clone(),
            tenant_id: self.access.tenant_id,
            role: self.access.role,
            company_id: self.company_id,
            companies: self.access.companies.clone(),
            session_id,
        }
    }
}

/// A new access and refresh token pair.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// ID of the stored refresh token row.
    pub session_id: Uuid,
    pub access: MintedAccessToken,
    pub refresh: MintedRefreshToken,
    pub context: SessionContext,
}

/// Result of a successful rotation.
#[derive(Debug, Clone)]
pub struct RotatedSession {
    pub session: IssuedSession,
    pub identity: Identity,
    pub gate: GateOutcome,
}

/// IDs to revoke so that, after one more insert, at most `cap` tokens stay
/// active. `active` must be ordered newest first; the oldest go.
pub fn select_evictions(active: &[RefreshToken], cap: usize) -> Vec<Uuid> {
    active
        .iter()
        .skip(cap.saturating_sub(1))
        .map(|t| t.id)
        .collect()
}

fn not_found_or_revoked() -> AppError {
    AppError::authentication("Refresh token not found or revoked")
}

/// Lock contention during rotation surfaces as an authentication failure.
fn contention(err: AppError) -> AppError {
    if err.kind == ErrorKind::Conflict {
        info!(error = %err, "Refresh rotation lost a concurrent race");
        AppError::authentication("Refresh token is being rotated by another request")
    } else {
        err
    }
}

/// Stores hashed refresh tokens and rotates them atomically.
#[derive(Debug, Clone)]
pub struct SessionStore {
    db: UnscopedDb,
    identities: Arc<IdentityRepository>,
    refresh_tokens: Arc<RefreshTokenRepository>,
    resolver: Arc<AccessResolver>,
    gate: Arc<SubscriptionGate>,
    tokens: Arc<TokenService>,
    max_active: usize,
}

impl SessionStore {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: UnscopedDb,
        identities: Arc<IdentityRepository>,
        refresh_tokens: Arc<RefreshTokenRepository>,
        resolver: Arc<AccessResolver>,
        gate: Arc<SubscriptionGate>,
        tokens: Arc<TokenService>,
        max_active: usize,
    ) -> Self {
        Self {
            db,
            identities,
            refresh_tokens,
            resolver,
            gate,
            tokens,
            max_active: max_active.max(1),
        }
    }

    /// Open a session for an identity whose credentials were just verified.
    pub async fn issue(
        &self,
        context: SessionContext,
        client: &ClientInfo,
        now: DateTime<Utc>,
    ) -> AppResult<IssuedSession> {
        let mut uow = self.db.begin().await?;
        self.identities
            .lock_by_id(&mut uow, context.identity_id)
            .await
            .map_err(contention)?
            .filter(|i| i.is_active)
            .ok_or_else(|| AppError::authentication("Account is inactive"))?;
        let issued = self.issue_in(&mut uow, context, client, now).await?;
        uow.commit().await.map_err(contention)?;
        Ok(issued)
    }

    /// Insert a new token inside `uow`, first revoking the identity's
    /// expired tokens and then evicting the oldest active ones beyond the
    /// cap. The caller must hold the identity row lock.
    pub async fn issue_in(
        &self,
        uow: &mut UnitOfWork,
        context: SessionContext,
        client: &ClientInfo,
        now: DateTime<Utc>,
    ) -> AppResult<IssuedSession> {
        let identity_id = context.identity_id;

        let expired = self
            .refresh_tokens
            .revoke_expired_for_identity(uow, identity_id, now)
            .await?;

        let active = self
            .refresh_tokens
            .lock_active_for_identity(uow, identity_id, now)
            .await?;
        let evict = select_evictions(&active, self.max_active);
        let evicted = self
            .refresh_tokens
            .revoke_many(uow, &evict, RevocationReason::CapExceeded, now)
            .await?;

        let session_id = Uuid::now_v7();
        let refresh = self.tokens.mint_refresh_token(now);
        let access = self
            .tokens
            .mint_access_token(&context.subject(session_id), now)?;

        self.refresh_tokens
            .insert(
                uow,
                &NewRefreshToken {
                    id: session_id,
                    identity_id,
                    tenant_id: context.access.tenant_id,
                    company_id: context.company_id,
                    token_hash: refresh.token_hash.clone(),
                    device_name: client.device_name.clone(),
                    ip_address: client.ip_address.clone(),
                    user_agent: client.user_agent.clone(),
                    expires_at: refresh.expires_at,
                    created_at: now,
                },
            )
            .await?;

        debug!(
            identity_id = %identity_id,
            session_id = %session_id,
            expired = expired,
            evicted = evicted,
            "Refresh token issued"
        );
        Ok(IssuedSession {
            session_id,
            access,
            refresh,
            context,
        })
    }

    /// Rotate a refresh token.
    ///
    /// Tenant, subscription and membership reads happen before the
    /// transaction opens, so a rotation holds a single pooled connection
    /// while it owns row locks. Inside the transaction the identity row and
    /// then the presented token row are locked; a concurrent rotation of the
    /// same token waits and then finds the row revoked. Any failure rolls
    /// the whole rotation back.
    pub async fn refresh(
        &self,
        presented: &str,
        client: &ClientInfo,
        now: DateTime<Utc>,
    ) -> AppResult<RotatedSession> {
        let seen = self.tokens.validate_refresh_token(presented, now).await?;
        let gate = self.gate.check(seen.tenant_id, now).await?;
        let access = self
            .resolver
            .resolve_for_tenant(seen.identity_id, seen.tenant_id)
            .await?;

        self.rotate(&seen, gate, access, client, now)
            .await
            .map_err(contention)
    }

    async fn rotate(
        &self,
        seen: &RefreshToken,
        gate: GateOutcome,
        access: ResolvedAccess,
        client: &ClientInfo,
        now: DateTime<Utc>,
    ) -> AppResult<RotatedSession> {
        let mut uow = self.db.begin().await?;

        let identity = self
            .identities
            .lock_by_id(&mut uow, seen.identity_id)
            .await?
            .ok_or_else(not_found_or_revoked)?;
        let current = self
            .refresh_tokens
            .lock_unrevoked_by_hash(&mut uow, &seen.token_hash)
            .await?
            .ok_or_else(not_found_or_revoked)?;
        if current.is_expired_at(now) {
            return Err(AppError::authentication("Refresh token has expired"));
        }
        if !identity.is_active {
            return Err(AppError::authentication("Account is inactive"));
        }
        // A tenant switch landed between the read and the lock.
        if current.tenant_id != seen.tenant_id {
            return Err(AppError::conflict("Session tenant changed during rotation"));
        }

        let company_id = access.pick_company(current.company_id);

        self.refresh_tokens
            .revoke_many(&mut uow, &[current.id], RevocationReason::Rotated, now)
            .await?;

        let client = ClientInfo {
            ip_address: client.ip_address.clone().or(current.ip_address),
            user_agent: client.user_agent.clone().or(current.user_agent),
            device_name: client.device_name.clone().or(current.device_name),
        };
        let context = SessionContext {
            identity_id: identity.id,
            email: identity.email.clone(),
            access,
            company_id,
        };
        let session = self.issue_in(&mut uow, context, &client, now).await?;
        uow.commit().await?;

        info!(
            identity_id = %identity.id,
            old_session = %current.id,
            new_session = %session.session_id,
            "Refresh token rotated"
        );
        Ok(RotatedSession {
            session,
            identity,
            gate,
        })
    }

    /// Revoke a presented token. Unknown and already revoked tokens are
    /// not an error; returns whether a row changed.
    pub async fn revoke(
        &self,
        presented: &str,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let revoked = self
            .refresh_tokens
            .revoke_by_hash(&hash_refresh_token(presented), reason, now)
            .await?;
        debug!(revoked = revoked, reason = %reason, "Refresh token revocation");
        Ok(revoked > 0)
    }

    /// Revoke every unrevoked token of the identity inside `uow`.
    pub async fn revoke_all_in(
        &self,
        uow: &mut UnitOfWork,
        identity_id: Uuid,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let revoked = self
            .refresh_tokens
            .revoke_all_for_identity(uow, identity_id, reason, now)
            .await?;
        info!(identity_id = %identity_id, revoked = revoked, reason = %reason, "Revoked all refresh tokens");
        Ok(revoked)
    }

    /// Point a live session at a new tenant and company so the next
    /// rotation keeps them.
    pub async fn update_context(
        &self,
        session_id: Uuid,
        tenant_id: Uuid,
        company_id: Option<Uuid>,
    ) -> AppResult<()> {
        if self
            .refresh_tokens
            .update_context(session_id, tenant_id, company_id)
            .await?
        {
            Ok(())
        } else {
            Err(AppError::authentication("Session has been revoked"))
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}
