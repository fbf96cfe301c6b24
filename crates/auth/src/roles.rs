use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC.
///
/// Roles are opaque strings; `RolePolicy` maps them to abilities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const CATALOG_MANAGER: Role = Role(Cow::Borrowed("catalog_manager"));
    pub const ORDER_MANAGER: Role = Role(Cow::Borrowed("order_manager"));
    pub const CUSTOMER_MANAGER: Role = Role(Cow::Borrowed("customer_manager"));
    pub const HR_MANAGER: Role = Role(Cow::Borrowed("hr_manager"));
    pub const PROVIDER_MANAGER: Role = Role(Cow::Borrowed("provider_manager"));
    pub const SUPPORT: Role = Role(Cow::Borrowed("support"));
    pub const CUSTOMER: Role = Role(Cow::Borrowed("customer"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
