use thiserror::Error;

use tradeerp_core::TenantId;

use crate::{Permission, PrincipalId, Role, TenantMembership};

/// A fully resolved principal for authorization decisions.
///
/// Construction is decoupled from storage and transport: the API derives it
/// from verified claims through `RolePolicy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub principal_id: PrincipalId,
    pub active_tenant_id: TenantId,
    pub membership: TenantMembership,
    /// Key of the principal's row in the `users` table, when it has one.
    pub user_id: Option<i64>,
}

impl Principal {
    /// Principal holding `permissions` directly, without going through a role table.
    pub fn with_permissions(
        tenant_id: TenantId,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            principal_id: PrincipalId::new(),
            active_tenant_id: tenant_id,
            membership: TenantMembership {
                tenant_id,
                roles: Vec::new(),
                permissions: permissions.into_iter().collect(),
            },
            user_id: None,
        }
    }

    pub fn acting_as(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Yes/no ability check, the shape form requests consume.
    pub fn can(&self, ability: &Permission) -> bool {
        authorize(self, ability).is_ok()
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.membership.has_role(role)
    }

    /// Whether this principal is the owner of a record keyed by `users.id`.
    pub fn owns(&self, owner_user_id: i64) -> bool {
        self.user_id == Some(owner_user_id)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("tenant mismatch")]
    TenantMismatch,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Authorize a principal within its active tenant context.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    if principal.active_tenant_id != principal.membership.tenant_id {
        return Err(AuthzError::TenantMismatch);
    }

    let granted = principal
        .membership
        .permissions
        .iter()
        .any(|held| held.grants(required));

    if granted {
        Ok(())
    } else {
        tracing::debug!(
            principal_id = %principal.principal_id,
            permission = %required,
            "authorization denied"
        );
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}
