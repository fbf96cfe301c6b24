use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tradeerp_core::TenantId;

use crate::{BroadcastEvent, Channel};

/// A broadcast event rendered for transport, with tenant metadata.
///
/// Multi-tenancy is enforced here via `tenant_id`; consumers filter on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastEnvelope {
    event_id: Uuid,
    tenant_id: TenantId,
    event: String,
    channels: Vec<Channel>,
    payload: serde_json::Value,
    occurred_at: DateTime<Utc>,
}

impl BroadcastEnvelope {
    pub fn new(
        tenant_id: TenantId,
        event: impl Into<String>,
        channels: Vec<Channel>,
        payload: serde_json::Value,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            tenant_id,
            event: event.into(),
            channels,
            payload,
            occurred_at,
        }
    }

    /// Render a broadcast event for a tenant.
    pub fn from_event<E: BroadcastEvent>(tenant_id: TenantId, event: &E) -> Self {
        Self::new(
            tenant_id,
            event.broadcast_as(),
            event.broadcast_on(),
            event.broadcast_with(),
            event.occurred_at(),
        )
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn is_on(&self, channel: &Channel) -> bool {
        self.channels.contains(channel)
    }
}
