//! Refresh-token sessions: issuance, rotation, revocation and the flows
//! built on them.

pub mod cleanup;
pub mod manager;
pub mod store;

pub use cleanup::{CleanupReport, SessionCleanup};
pub use manager::{LoginResult, SessionManager, SwitchResult, TenantChoice, normalize_email};
pub use store::{IssuedSession, RotatedSession, SessionContext, SessionStore, select_evictions};

/// Client metadata recorded with each refresh token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    /// Client IP address as seen by the server.
    pub ip_address: Option<String>,
    /// `User-Agent` header.
    pub user_agent: Option<String>,
    /// Client-supplied device label.
    pub device_name: Option<String>,
}
