//! Ability checks for routes that have no form request (reads and deletes).
//!
//! Writes are authorized by their form request's `authorize()`.

use tradeerp_auth::{authorize, AuthzError, Permission};

use crate::context::{PrincipalContext, TenantContext};

/// Require `ability` of the caller within the request's tenant.
pub fn require(
    tenant: &TenantContext,
    principal: &PrincipalContext,
    ability: &'static str,
) -> Result<(), AuthzError> {
    if principal.principal().active_tenant_id != tenant.tenant_id() {
        return Err(AuthzError::TenantMismatch);
    }
    authorize(principal.principal(), &Permission::new(ability))
}
