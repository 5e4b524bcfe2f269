//! Repositories for the tables that sit outside tenant scoping.
//!
//! Each repository is constructed from an [`UnscopedDb`](crate::UnscopedDb),
//! so every use is tied to a declared bypass purpose.

pub mod identity;
pub mod login_attempt;
pub mod membership;
pub mod refresh_token;
pub mod subscription;
pub mod tenant;

pub use identity::IdentityRepository;
pub use login_attempt::LoginAttemptRepository;
pub use membership::MembershipRepository;
pub use refresh_token::RefreshTokenRepository;
pub use subscription::SubscriptionRepository;
pub use tenant::TenantRepository;
