//! Runtime wiring shared by every handler: storage, presence checks,
//! notification delivery and the realtime channel.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tokio::sync::broadcast;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};

use tradeerp_core::TenantId;
use tradeerp_events::{
    BroadcastEnvelope, BroadcastEvent, EventBus, InMemoryBusError, InMemoryEventBus, Subscription, TenantScoped,
};
use tradeerp_infra::{
    migrated_catalog, InMemoryMailer, InMemoryNotificationStore, InMemoryTableStore, Repository,
    StoreError, StorePresenceVerifier, TableStore,
};
use tradeerp_notifications::{
    DatabaseNotificationStore, DeliveryReport, Mailer, Notification, NotificationDispatcher, Recipient,
};
use tradeerp_schema::{SchemaCatalog, SchemaError};

/// Broadcast bus feeding in-process subscribers and SSE clients alike.
pub struct RealtimeBus {
    local: InMemoryEventBus<BroadcastEnvelope>,
    sse: broadcast::Sender<BroadcastEnvelope>,
}

impl RealtimeBus {
    pub fn new(capacity: usize) -> Self {
        let (sse, _rx) = broadcast::channel(capacity);
        Self {
            local: InMemoryEventBus::new(),
            sse,
        }
    }

    pub fn sse_receiver(&self) -> broadcast::Receiver<BroadcastEnvelope> {
        self.sse.subscribe()
    }
}

impl EventBus<BroadcastEnvelope> for RealtimeBus {
    type Error = InMemoryBusError;

    fn publish(&self, message: BroadcastEnvelope) -> Result<(), Self::Error> {
        // No connected SSE client is not a failure.
        let _ = self.sse.send(message.clone());
        self.local.publish(message)
    }

    fn subscribe(&self) -> Subscription<BroadcastEnvelope> {
        self.local.subscribe()
    }
}

pub struct AppServices {
    store: Arc<dyn TableStore>,
    catalog: Arc<SchemaCatalog>,
    dispatcher: NotificationDispatcher,
    notification_store: Arc<dyn DatabaseNotificationStore>,
    realtime: RealtimeBus,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn TableStore>,
        catalog: Arc<SchemaCatalog>,
        mailer: Arc<dyn Mailer>,
        notification_store: Arc<dyn DatabaseNotificationStore>,
        app_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            catalog,
            dispatcher: NotificationDispatcher::new(mailer, notification_store.clone(), app_url),
            notification_store,
            realtime: RealtimeBus::new(256),
        }
    }

    /// Everything in process: rows, mail and in-app notifications.
    pub fn in_memory(app_url: impl Into<String>) -> Result<Self, SchemaError> {
        Ok(Self::new(
            Arc::new(InMemoryTableStore::new()),
            Arc::new(migrated_catalog()?),
            Arc::new(InMemoryMailer::new()),
            Arc::new(InMemoryNotificationStore::new()),
            app_url,
        ))
    }

    pub fn repo<T: Serialize + DeserializeOwned>(&self, table: &'static str) -> Repository<T> {
        Repository::new(self.store.clone(), table)
    }

    /// Presence checks scoped to one tenant's rows.
    pub fn verifier(&self, tenant_id: TenantId) -> StorePresenceVerifier {
        StorePresenceVerifier::new(self.store.clone(), tenant_id, self.catalog.clone())
    }

    pub fn notification_store(&self) -> &Arc<dyn DatabaseNotificationStore> {
        &self.notification_store
    }

    pub fn realtime(&self) -> &RealtimeBus {
        &self.realtime
    }

    /// Make sure the `users` row referenced by a token exists in the tenant.
    pub fn provision_user(&self, tenant_id: TenantId, user_id: i64, name: &str) -> Result<(), StoreError> {
        if self.store.get(tenant_id, "users", user_id)?.is_some() {
            return Ok(());
        }
        tracing::info!(%tenant_id, user_id, "provisioning user");
        self.store.put(tenant_id, "users", user_id, json!({ "name": name }))
    }

    /// Notification target for a `users` row; mail only when the row has an email.
    pub fn user_recipient(&self, tenant_id: TenantId, user_id: i64) -> Result<Recipient, StoreError> {
        let row = self.store.get(tenant_id, "users", user_id)?.unwrap_or_default();
        let name = row.get("name").and_then(|v| v.as_str()).unwrap_or("there").to_owned();
        let recipient = Recipient::new("users", user_id, name);
        Ok(match row.get("email").and_then(|v| v.as_str()) {
            Some(email) => recipient.with_email(email),
            None => recipient,
        })
    }

    /// Deliver `notification` and log anything that did not go through.
    pub async fn notify<N: Notification + ?Sized>(&self, notification: &N, recipient: &Recipient) -> DeliveryReport {
        let report = self
            .dispatcher
            .send(notification, recipient, chrono::Utc::now())
            .await;
        if !report.failed.is_empty() {
            tracing::warn!(
                notification = report.notification_type,
                recipient = %report.recipient,
                failed = report.failed.len(),
                "notification partially delivered"
            );
        }
        report
    }

    pub fn broadcast<E: BroadcastEvent>(&self, tenant_id: TenantId, event: &E) -> bool {
        tradeerp_notifications::broadcast(&self.realtime, tenant_id, event)
    }
}

/// SSE stream of one tenant's broadcasts.
pub fn tenant_sse_stream(
    services: Arc<AppServices>,
    tenant_id: TenantId,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.realtime().sse_receiver();
    let stream = BroadcastStream::new(rx).filter_map(move |msg| match msg {
        Ok(m) if m.belongs_to(tenant_id) => {
            let data = json!({
                "channels": m.channels().iter().map(ToString::to_string).collect::<Vec<_>>(),
                "payload": m.payload(),
                "occurred_at": m.occurred_at(),
            });
            Some(Ok(SseEvent::default().event(m.event()).data(data.to_string())))
        }
        _ => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
