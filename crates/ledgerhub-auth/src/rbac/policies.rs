//! Role-to-permission mapping definitions.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use ledgerhub_entity::membership::Role;

/// An action a role may be allowed to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    // Tenant administration
    /// Change tenant settings.
    ManageTenant,
    /// Manage subscription and payment.
    ManageBilling,
    /// Invite members and assign roles.
    ManageMembers,
    /// Create and deactivate companies; see every company.
    ManageCompanies,

    // Company operations
    SalesRead,
    SalesWrite,
    FinanceRead,
    FinanceWrite,
    InventoryRead,
    InventoryWrite,
}

/// Static role-to-permission mapping.
#[derive(Debug, Clone)]
pub struct RbacPolicies {
    role_permissions: HashMap<Role, HashSet<Permission>>,
}

impl RbacPolicies {
    /// Build the default mapping.
    pub fn new() -> Self {
        use Permission::*;

        let company_ops = [
            SalesRead,
            SalesWrite,
            FinanceRead,
            FinanceWrite,
            InventoryRead,
            InventoryWrite,
        ];

        let owner: HashSet<Permission> = [ManageTenant, ManageBilling, ManageMembers, ManageCompanies]
            .into_iter()
            .chain(company_ops)
            .collect();
        let tenant_admin: HashSet<Permission> = owner
            .iter()
            .copied()
            .filter(|p| *p != ManageBilling)
            .collect();
        let company_admin: HashSet<Permission> =
            std::iter::once(ManageMembers).chain(company_ops).collect();

        let mut role_permissions = HashMap::new();
        role_permissions.insert(Role::Owner, owner);
        role_permissions.insert(Role::TenantAdmin, tenant_admin);
        role_permissions.insert(Role::Member, HashSet::new());
        role_permissions.insert(Role::CompanyAdmin, company_admin);
        role_permissions.insert(Role::Sales, [SalesRead, SalesWrite, InventoryRead].into());
        role_permissions.insert(Role::Finance, [FinanceRead, FinanceWrite, SalesRead].into());
        role_permissions.insert(Role::Warehouse, [InventoryRead, InventoryWrite].into());
        role_permissions.insert(Role::Viewer, [SalesRead, FinanceRead, InventoryRead].into());

        Self { role_permissions }
    }

    /// Whether `role` grants `permission`.
    pub fn allows(&self, role: Role, permission: Permission) -> bool {
        self.role_permissions
            .get(&role)
            .is_some_and(|set| set.contains(&permission))
    }
}

impl Default for RbacPolicies {
    fn default() -> Self {
        Self::new()
    }
}
