use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use tradeerp_core::string_enum;

use crate::MailMessage;

string_enum! {
    pub enum DeliveryChannel {
        Mail => "mail",
        Database => "database",
    }
}

/// Whoever a notification is addressed to.
///
/// `notifiable_type` and `notifiable_id` are what the `notifications` table
/// records; `email` decides whether the mail channel is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub notifiable_type: String,
    pub notifiable_id: i64,
    pub name: String,
    pub email: Option<String>,
}

impl Recipient {
    pub fn new(notifiable_type: impl Into<String>, notifiable_id: i64, name: impl Into<String>) -> Self {
        Self {
            notifiable_type: notifiable_type.into(),
            notifiable_id,
            name: name.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Rendering inputs shared by every notification.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationContext {
    pub app_url: String,
    pub now: DateTime<Utc>,
}

impl NotificationContext {
    pub fn new(app_url: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            app_url: app_url.into(),
            now,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// Absolute link into the application.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.app_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

/// A domain change rendered for delivery.
pub trait Notification: Send + Sync {
    /// Stable name stored as the notification's `type`.
    fn notification_type(&self) -> &'static str;

    /// Channels to deliver on. Mail needs an address.
    fn via(&self, recipient: &Recipient) -> Vec<DeliveryChannel> {
        if recipient.email.is_some() {
            vec![DeliveryChannel::Mail, DeliveryChannel::Database]
        } else {
            vec![DeliveryChannel::Database]
        }
    }

    fn to_mail(&self, recipient: &Recipient, ctx: &NotificationContext) -> MailMessage;

    /// Payload of the in-app record.
    fn to_array(&self, ctx: &NotificationContext) -> Value;

    fn tags(&self) -> &'static [&'static str];

    /// Checked right before delivery; stale notifications are dropped.
    fn should_send(&self, _recipient: &Recipient) -> bool {
        true
    }
}

/// One row of the `notifications` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseNotification {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub notifiable_type: String,
    pub notifiable_id: i64,
    pub data: Value,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DatabaseNotification {
    pub fn build<N: Notification + ?Sized>(
        notification: &N,
        recipient: &Recipient,
        ctx: &NotificationContext,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            notification_type: notification.notification_type().to_owned(),
            notifiable_type: recipient.notifiable_type.clone(),
            notifiable_id: recipient.notifiable_id,
            data: notification.to_array(ctx),
            read_at: None,
            created_at: ctx.now,
        }
    }

    pub fn is_unread(&self) -> bool {
        self.read_at.is_none()
    }
}

/// Money as shown in messages.
pub(crate) fn amount(value: f64) -> String {
    format!("{value:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_without_doubled_slashes() {
        let ctx = NotificationContext::new("https://erp.example.com/", Utc::now());
        assert_eq!(ctx.url("/providers/3"), "https://erp.example.com/providers/3");
        assert_eq!(amount(1234.5), "1234.50");
    }
}
