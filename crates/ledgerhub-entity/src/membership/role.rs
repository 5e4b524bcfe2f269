//! Tenant and company role enumerations.
//!
//! The database stores each tier in its own closed enum. [`Role`] is the
//! canonical union that travels in access tokens and request identities.

use std::fmt;
use std::str::FromStr;

use ledgerhub_core::AppError;
use serde::{Deserialize, Serialize};

/// Which access tier a role string belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipTier {
    /// Tenant-wide membership.
    Tenant,
    /// Per-company grant.
    Company,
}

/// Tier 1 roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "tenant_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenantRole {
    /// Owns the tenant, including billing.
    Owner,
    /// Administers the whole tenant.
    TenantAdmin,
    /// Plain member; access comes from company grants.
    Member,
}

impl TenantRole {
    /// Elevated roles expand to every company in the tenant.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Self::Owner | Self::TenantAdmin)
    }

    /// Return the role as its database string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "OWNER",
            Self::TenantAdmin => "TENANT_ADMIN",
            Self::Member => "MEMBER",
        }
    }
}

impl fmt::Display for TenantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TenantRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "OWNER" => Ok(Self::Owner),
            "TENANT_ADMIN" => Ok(Self::TenantAdmin),
            "MEMBER" => Ok(Self::Member),
            _ => Err(AppError::validation(format!(
                "Invalid tenant role: '{s}'. Expected one of: OWNER, TENANT_ADMIN, MEMBER"
            ))),
        }
    }
}

/// Tier 2 roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "company_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompanyRole {
    /// Administers one company.
    CompanyAdmin,
    /// Sales operations.
    Sales,
    /// Finance operations.
    Finance,
    /// Inventory operations.
    Warehouse,
    /// Read-only.
    Viewer,
}

impl CompanyRole {
    /// Return the role as its database string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CompanyAdmin => "COMPANY_ADMIN",
            Self::Sales => "SALES",
            Self::Finance => "FINANCE",
            Self::Warehouse => "WAREHOUSE",
            Self::Viewer => "VIEWER",
        }
    }
}

impl fmt::Display for CompanyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CompanyRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "COMPANY_ADMIN" => Ok(Self::CompanyAdmin),
            "SALES" => Ok(Self::Sales),
            "FINANCE" => Ok(Self::Finance),
            "WAREHOUSE" => Ok(Self::Warehouse),
            "VIEWER" => Ok(Self::Viewer),
            _ => Err(AppError::validation(format!(
                "Invalid company role: '{s}'. Expected one of: COMPANY_ADMIN, SALES, FINANCE, WAREHOUSE, VIEWER"
            ))),
        }
    }
}

/// Canonical role carried in tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Owner,
    TenantAdmin,
    Member,
    CompanyAdmin,
    Sales,
    Finance,
    Warehouse,
    Viewer,
}

impl Role {
    /// Parse a raw role string for the given tier.
    ///
    /// A string valid in one tier is rejected in the other.
    pub fn parse(tier: MembershipTier, raw: &str) -> Result<Self, AppError> {
        match tier {
            MembershipTier::Tenant => raw.parse::<TenantRole>().map(Self::from),
            MembershipTier::Company => raw.parse::<CompanyRole>().map(Self::from),
        }
    }

    /// Return the tier this role belongs to.
    pub fn tier(&self) -> MembershipTier {
        match self {
            Self::Owner | Self::TenantAdmin | Self::Member => MembershipTier::Tenant,
            _ => MembershipTier::Company,
        }
    }

    /// Whether this is an elevated Tier 1 role.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Self::Owner | Self::TenantAdmin)
    }

    /// Return the role as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "OWNER",
            Self::TenantAdmin => "TENANT_ADMIN",
            Self::Member => "MEMBER",
            Self::CompanyAdmin => "COMPANY_ADMIN",
            Self::Sales => "SALES",
            Self::Finance => "FINANCE",
            Self::Warehouse => "WAREHOUSE",
            Self::Viewer => "VIEWER",
        }
    }
}

impl From<TenantRole> for Role {
    fn from(role: TenantRole) -> Self {
        match role {
            TenantRole::Owner => Self::Owner,
            TenantRole::TenantAdmin => Self::TenantAdmin,
            TenantRole::Member => Self::Member,
        }
    }
}

impl From<CompanyRole> for Role {
    fn from(role: CompanyRole) -> Self {
        match role {
            CompanyRole::CompanyAdmin => Self::CompanyAdmin,
            CompanyRole::Sales => Self::Sales,
            CompanyRole::Finance => Self::Finance,
            CompanyRole::Warehouse => Self::Warehouse,
            CompanyRole::Viewer => Self::Viewer,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
