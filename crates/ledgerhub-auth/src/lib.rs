//! # ledgerhub-auth
//!
//! Authentication and session core for LedgerHub:
//!
//! - [`password`]: Argon2id credential verification and password policy
//! - [`lockout`]: escalating brute-force lockout per email and per IP
//! - [`access`]: two-tier tenant and company access resolution
//! - [`jwt`] and [`token`]: access token minting and opaque refresh tokens
//! - [`session`]: refresh rotation, login and switching flows, maintenance
//! - [`subscription`]: the per-request subscription gate and tenant lifecycle
//! - [`rbac`]: the role-to-permission map checked through [`RequestIdentity`]

pub mod access;
pub mod identity;
pub mod jwt;
pub mod lockout;
pub mod password;
pub mod rbac;
pub mod session;
pub mod subscription;
pub mod token;

pub use access::{AccessResolver, ResolvedAccess, TenantGrant};
pub use identity::RequestIdentity;
pub use jwt::{AccessClaims, JwtDecoder, JwtEncoder};
pub use lockout::{BruteForceGuard, LockoutPolicy};
pub use password::{PasswordHasher, PasswordValidator};
pub use rbac::{Permission, RbacPolicies};
pub use session::{ClientInfo, SessionCleanup, SessionManager, SessionStore};
pub use subscription::{GateOutcome, SubscriptionGate, TenantLifecycle};
pub use token::TokenService;
