//! Role → ability mapping.
//!
//! The gate behind every form request's `authorize()` check. The built-in table
//! covers the standard back-office roles; deployments can extend it.

use std::collections::HashMap;

use crate::{JwtClaims, Permission, Principal, Role, TenantMembership};

#[derive(Debug, Clone)]
pub struct RolePolicy {
    grants: HashMap<String, Vec<Permission>>,
}

impl RolePolicy {
    /// Empty policy: no role grants anything.
    pub fn empty() -> Self {
        Self {
            grants: HashMap::new(),
        }
    }

    /// Standard back-office roles.
    pub fn standard() -> Self {
        Self::empty()
            .with_role(&Role::ADMIN, &["*"])
            .with_role(
                &Role::CATALOG_MANAGER,
                &["products.*", "brands.*", "categories.*", "attributes.*"],
            )
            .with_role(
                &Role::ORDER_MANAGER,
                &["orders.*", "customers.view", "products.view"],
            )
            .with_role(&Role::CUSTOMER_MANAGER, &["customers.*", "subscriptions.*"])
            .with_role(&Role::HR_MANAGER, &["employees.*"])
            .with_role(&Role::PROVIDER_MANAGER, &["providers.*"])
            .with_role(
                &Role::SUPPORT,
                &[
                    "products.view",
                    "orders.view",
                    "customers.view",
                    "customers.communicate",
                    "providers.view",
                ],
            )
            .with_role(
                &Role::CUSTOMER,
                &["orders.create", "reviews.create", "subscriptions.create"],
            )
    }

    pub fn with_role(mut self, role: &Role, abilities: &[&'static str]) -> Self {
        let entry = self.grants.entry(role.as_str().to_string()).or_default();
        for ability in abilities {
            let perm = Permission::new(*ability);
            if !entry.contains(&perm) {
                entry.push(perm);
            }
        }
        self
    }

    /// Effective abilities for a set of roles (deduplicated, first-seen order).
    pub fn permissions_for(&self, roles: &[Role]) -> Vec<Permission> {
        let mut out: Vec<Permission> = Vec::new();
        for role in roles {
            let Some(perms) = self.grants.get(role.as_str()) else {
                continue;
            };
            for perm in perms {
                if !out.contains(perm) {
                    out.push(perm.clone());
                }
            }
        }
        out
    }

    /// Resolve verified claims into a principal acting in the claimed tenant.
    pub fn principal_for(&self, claims: &JwtClaims) -> Principal {
        Principal {
            principal_id: claims.sub,
            active_tenant_id: claims.tenant_id,
            membership: TenantMembership {
                tenant_id: claims.tenant_id,
                roles: claims.roles.clone(),
                permissions: self.permissions_for(&claims.roles),
            },
            user_id: claims.user_id,
        }
    }
}

impl Default for RolePolicy {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tradeerp_core::TenantId;

    use crate::PrincipalId;

    fn claims(roles: Vec<Role>) -> JwtClaims {
        let now = Utc::now();
        JwtClaims {
            sub: PrincipalId::new(),
            tenant_id: TenantId::new(),
            roles,
            issued_at: now,
            expires_at: now + Duration::minutes(5),
            user_id: Some(11),
        }
    }

    #[test]
    fn hr_manager_can_update_salary_but_not_products() {
        let p = RolePolicy::standard().principal_for(&claims(vec![Role::HR_MANAGER]));
        assert!(p.can(&Permission::new("employees.update_salary")));
        assert!(!p.can(&Permission::new("products.create")));
        assert_eq!(p.user_id, Some(11));
    }

    #[test]
    fn admin_can_do_anything() {
        let p = RolePolicy::standard().principal_for(&claims(vec![Role::ADMIN]));
        assert!(p.can(&Permission::new("providers.manage_certifications")));
    }

    #[test]
    fn unknown_role_grants_nothing() {
        let p = RolePolicy::standard().principal_for(&claims(vec![Role::new("intern")]));
        assert!(p.membership.permissions.is_empty());
    }

    #[test]
    fn permissions_are_deduplicated_across_roles() {
        let policy = RolePolicy::standard();
        let perms = policy.permissions_for(&[Role::ORDER_MANAGER, Role::SUPPORT]);
        let views = perms.iter().filter(|p| p.as_str() == "orders.view").count();
        assert_eq!(views, 1);
    }
}
