//! Delivery of notifications to their channels.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use crate::{DatabaseNotification, DeliveryChannel, MailMessage, Notification, NotificationContext, Recipient};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotificationError {
    #[error("mail delivery failed: {0}")]
    Mail(String),

    #[error("notification store failed: {0}")]
    Store(String),

    #[error("recipient {0} has no email address")]
    NoAddress(String),
}

/// Outbound mail transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, message: &MailMessage) -> Result<(), NotificationError>;
}

/// Persistence for in-app notifications.
#[async_trait]
pub trait DatabaseNotificationStore: Send + Sync {
    async fn store(&self, notification: &DatabaseNotification) -> Result<(), NotificationError>;

    /// Unread notifications of one notifiable, newest first.
    async fn unread(
        &self,
        notifiable_type: &str,
        notifiable_id: i64,
    ) -> Result<Vec<DatabaseNotification>, NotificationError>;

    /// `false` when there is no such notification or it was already read.
    async fn mark_as_read(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, NotificationError>;
}

/// What happened to one notification for one recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReport {
    pub notification_type: &'static str,
    pub recipient: String,
    pub skipped: bool,
    pub delivered: Vec<DeliveryChannel>,
    pub failed: Vec<(DeliveryChannel, NotificationError)>,
}

impl DeliveryReport {
    fn new(notification_type: &'static str, recipient: &Recipient) -> Self {
        Self {
            notification_type,
            recipient: format!("{}:{}", recipient.notifiable_type, recipient.notifiable_id),
            skipped: false,
            delivered: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.skipped && self.failed.is_empty()
    }
}

/// Renders notifications and hands them to each channel.
///
/// A failing channel does not stop the others; the report says which ones
/// went through.
#[derive(Clone)]
pub struct NotificationDispatcher {
    mailer: Arc<dyn Mailer>,
    store: Arc<dyn DatabaseNotificationStore>,
    app_url: String,
}

impl NotificationDispatcher {
    pub fn new(
        mailer: Arc<dyn Mailer>,
        store: Arc<dyn DatabaseNotificationStore>,
        app_url: impl Into<String>,
    ) -> Self {
        Self {
            mailer,
            store,
            app_url: app_url.into(),
        }
    }

    pub fn context(&self, now: DateTime<Utc>) -> NotificationContext {
        NotificationContext::new(self.app_url.clone(), now)
    }

    #[instrument(
        skip_all,
        fields(
            notification = notification.notification_type(),
            notifiable = %recipient.notifiable_type,
            notifiable_id = recipient.notifiable_id,
        )
    )]
    pub async fn send<N: Notification + ?Sized>(
        &self,
        notification: &N,
        recipient: &Recipient,
        now: DateTime<Utc>,
    ) -> DeliveryReport {
        let mut report = DeliveryReport::new(notification.notification_type(), recipient);
        if !notification.should_send(recipient) {
            tracing::debug!("notification no longer applies; skipped");
            report.skipped = true;
            return report;
        }

        let ctx = self.context(now);
        for channel in notification.via(recipient) {
            let outcome = match channel {
                DeliveryChannel::Mail => self.deliver_mail(notification, recipient, &ctx).await,
                DeliveryChannel::Database => {
                    let record = DatabaseNotification::build(notification, recipient, &ctx);
                    self.store.store(&record).await
                }
            };
            match outcome {
                Ok(()) => report.delivered.push(channel),
                Err(err) => {
                    tracing::warn!(%channel, error = %err, "notification delivery failed");
                    report.failed.push((channel, err));
                }
            }
        }

        tracing::info!(
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            tags = ?notification.tags(),
            "notification dispatched"
        );
        report
    }

    /// Send one notification to several recipients, in order.
    pub async fn send_to_all<N: Notification + ?Sized>(
        &self,
        notification: &N,
        recipients: &[Recipient],
        now: DateTime<Utc>,
    ) -> Vec<DeliveryReport> {
        let mut reports = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            reports.push(self.send(notification, recipient, now).await);
        }
        reports
    }

    async fn deliver_mail<N: Notification + ?Sized>(
        &self,
        notification: &N,
        recipient: &Recipient,
        ctx: &NotificationContext,
    ) -> Result<(), NotificationError> {
        let address = recipient
            .email
            .as_deref()
            .ok_or_else(|| NotificationError::NoAddress(recipient.name.clone()))?;
        let message = notification.to_mail(recipient, ctx);
        self.mailer.send(address, &message).await
    }
}
