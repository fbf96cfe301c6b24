//! Delivery channel adapters.

use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use tradeerp_notifications::{DatabaseNotification, DatabaseNotificationStore, MailMessage, Mailer, NotificationError};

/// Writes mail to the log instead of sending it.
#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, message: &MailMessage) -> Result<(), NotificationError> {
        tracing::info!(from = %self.from, %to, subject = %message.subject, level = %message.level, "mail");
        tracing::debug!(body = %message.render_text(), "mail body");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentMail {
    pub to: String,
    pub message: MailMessage,
}

/// Keeps every mail for inspection.
#[derive(Debug, Default)]
pub struct InMemoryMailer {
    sent: Mutex<Vec<SentMail>>,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn send(&self, to: &str, message: &MailMessage) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .map_err(|_| NotificationError::Mail("lock poisoned".into()))?
            .push(SentMail {
                to: to.to_owned(),
                message: message.clone(),
            });
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryNotificationStore {
    rows: RwLock<Vec<DatabaseNotification>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<DatabaseNotification> {
        self.rows.read().map(|r| r.clone()).unwrap_or_default()
    }
}

fn store_error<T>(_: T) -> NotificationError {
    NotificationError::Store("lock poisoned".into())
}

#[async_trait]
impl DatabaseNotificationStore for InMemoryNotificationStore {
    async fn store(&self, notification: &DatabaseNotification) -> Result<(), NotificationError> {
        self.rows.write().map_err(store_error)?.push(notification.clone());
        Ok(())
    }

    async fn unread(
        &self,
        notifiable_type: &str,
        notifiable_id: i64,
    ) -> Result<Vec<DatabaseNotification>, NotificationError> {
        let rows = self.rows.read().map_err(store_error)?;
        let mut unread: Vec<_> = rows
            .iter()
            .filter(|n| n.notifiable_type == notifiable_type && n.notifiable_id == notifiable_id && n.is_unread())
            .cloned()
            .collect();
        unread.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(unread)
    }

    async fn mark_as_read(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, NotificationError> {
        let mut rows = self.rows.write().map_err(store_error)?;
        match rows.iter_mut().find(|n| n.id == id && n.is_unread()) {
            Some(n) => {
                n.read_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// The `notifications` table.
#[derive(Clone)]
pub struct PgDatabaseNotificationStore {
    pool: PgPool,
}

impl PgDatabaseNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(e: sqlx::Error) -> NotificationError {
    NotificationError::Store(e.to_string())
}

#[async_trait]
impl DatabaseNotificationStore for PgDatabaseNotificationStore {
    async fn store(&self, n: &DatabaseNotification) -> Result<(), NotificationError> {
        sqlx::query(
            "insert into notifications \
             (id, type, notifiable_type, notifiable_id, data, read_at, created_at, updated_at) \
             values ($1, $2, $3, $4, $5, $6, $7, $7)",
        )
        .bind(n.id)
        .bind(&n.notification_type)
        .bind(&n.notifiable_type)
        .bind(n.notifiable_id)
        .bind(&n.data)
        .bind(n.read_at)
        .bind(n.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn unread(
        &self,
        notifiable_type: &str,
        notifiable_id: i64,
    ) -> Result<Vec<DatabaseNotification>, NotificationError> {
        let rows = sqlx::query(
            "select id, type, notifiable_type, notifiable_id, data, read_at, created_at \
             from notifications \
             where notifiable_type = $1 and notifiable_id = $2 and read_at is null \
             order by created_at desc",
        )
        .bind(notifiable_type)
        .bind(notifiable_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter()
            .map(|r| {
                Ok(DatabaseNotification {
                    id: r.try_get("id")?,
                    notification_type: r.try_get("type")?,
                    notifiable_type: r.try_get("notifiable_type")?,
                    notifiable_id: r.try_get("notifiable_id")?,
                    data: r.try_get("data")?,
                    read_at: r.try_get("read_at")?,
                    created_at: r.try_get("created_at")?,
                })
            })
            .collect::<Result<_, sqlx::Error>>()
            .map_err(db_error)
    }

    async fn mark_as_read(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, NotificationError> {
        let result = sqlx::query(
            "update notifications set read_at = $2, updated_at = $2 where id = $1 and read_at is null",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, NaiveDate, Utc};

    use super::*;
    use tradeerp_notifications::{CertificationRevoked, NotificationDispatcher, Recipient};
    use tradeerp_providers::{CertificationStatus, NewProviderCertification, ProviderCertification, ProviderCertificationId, ProviderId};

    fn revoked() -> CertificationRevoked {
        let mut cert = ProviderCertification::create(
            ProviderCertificationId(1),
            ProviderId(2),
            NewProviderCertification {
                name: "ISO 9001".into(),
                issuing_authority: "ISO".into(),
                certification_number: "ISO-1".into(),
                issued_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                expiry_date: None,
                is_recurring: false,
                renewal_period_months: None,
                document_url: None,
            },
            Utc::now(),
        );
        cert.status = CertificationStatus::Revoked;
        CertificationRevoked::new(cert, "Acme")
    }

    #[tokio::test]
    async fn dispatcher_uses_both_in_memory_channels() {
        let mailer = Arc::new(InMemoryMailer::new());
        let store = Arc::new(InMemoryNotificationStore::new());
        let dispatcher = NotificationDispatcher::new(mailer.clone(), store.clone(), "http://localhost:8080");
        let recipient = Recipient::new("users", 1, "Dana").with_email("dana@example.com");

        let report = dispatcher.send(&revoked(), &recipient, Utc::now()).await;

        assert!(report.is_complete());
        assert_eq!(mailer.sent()[0].to, "dana@example.com");
        assert_eq!(store.unread("users", 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unread_is_newest_first_and_read_once() {
        let store = InMemoryNotificationStore::new();
        let now = Utc::now();
        let recipient = Recipient::new("users", 1, "Dana");
        let dispatcher_ctx = |at| tradeerp_notifications::NotificationContext::new("http://x", at);

        let older = DatabaseNotification::build(&revoked(), &recipient, &dispatcher_ctx(now - Duration::hours(1)));
        let newer = DatabaseNotification::build(&revoked(), &recipient, &dispatcher_ctx(now));
        store.store(&older).await.unwrap();
        store.store(&newer).await.unwrap();

        let unread = store.unread("users", 1).await.unwrap();
        assert_eq!(unread[0].id, newer.id);

        assert!(store.mark_as_read(newer.id, now).await.unwrap());
        assert!(!store.mark_as_read(newer.id, now).await.unwrap());
        assert_eq!(store.unread("users", 1).await.unwrap(), vec![older]);
    }
}
