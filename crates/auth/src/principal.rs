use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tradeerp_core::{DomainError, TenantId};

use crate::{Permission, Role};

/// Identity of an authenticated principal (staff user, customer, service account).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(Uuid);

impl PrincipalId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for PrincipalId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::from_str(s)
            .map(Self)
            .map_err(|e| DomainError::invalid_id(format!("PrincipalId: {e}")))
    }
}

/// A principal's membership in a tenant: which tenant it acts within and what
/// it was granted there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMembership {
    pub tenant_id: TenantId,
    pub roles: Vec<Role>,
    /// Effective abilities (role grants already expanded).
    pub permissions: Vec<Permission>,
}

impl TenantMembership {
    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }
}
