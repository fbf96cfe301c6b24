use tradeerp_core::TenantId;

use crate::BroadcastEnvelope;

/// Messages that belong to exactly one tenant.
///
/// Consumers fan out per tenant (e.g. the SSE stream) and must drop messages
/// for any other tenant.
pub trait TenantScoped {
    fn tenant_id(&self) -> TenantId;

    fn belongs_to(&self, tenant_id: TenantId) -> bool {
        self.tenant_id() == tenant_id
    }
}

impl TenantScoped for BroadcastEnvelope {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id()
    }
}
