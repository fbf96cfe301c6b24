//! Notifications about provider certifications.

use serde_json::{json, Value};

use tradeerp_core::SoftDeletes;
use tradeerp_providers::{CertificationStatus, ProviderCertification};

use crate::{MailMessage, Notification, NotificationContext, Recipient};

fn certification_path(c: &ProviderCertification) -> String {
    format!("/providers/{}/certifications/{}", c.provider_id, c.id)
}

fn base_payload(
    kind: &str,
    c: &ProviderCertification,
    provider_name: &str,
    message: String,
    ctx: &NotificationContext,
) -> Value {
    json!({
        "type": kind,
        "certification_id": c.id,
        "provider_id": c.provider_id,
        "provider_name": provider_name,
        "certification_name": c.name,
        "certification_number": c.certification_number,
        "issuing_authority": c.issuing_authority,
        "expiry_date": c.expiry_date,
        "status": c.status,
        "message": message,
        "action_url": ctx.url(&certification_path(c)),
        "created_at": ctx.now,
    })
}

/// A certification was recorded for a provider.
#[derive(Debug, Clone)]
pub struct CertificationIssued {
    pub certification: ProviderCertification,
    pub provider_name: String,
}

impl CertificationIssued {
    pub fn new(certification: ProviderCertification, provider_name: impl Into<String>) -> Self {
        Self {
            certification,
            provider_name: provider_name.into(),
        }
    }

    fn message(&self) -> String {
        format!(
            "Certification {} has been issued to {}.",
            self.certification.name, self.provider_name
        )
    }

    fn renewal_months(&self) -> Option<u32> {
        self.certification
            .renewal_period_months
            .filter(|_| self.certification.is_recurring)
    }
}

impl Notification for CertificationIssued {
    fn notification_type(&self) -> &'static str {
        "certification_issued"
    }

    fn to_mail(&self, recipient: &Recipient, ctx: &NotificationContext) -> MailMessage {
        let c = &self.certification;
        let mut mail = MailMessage::new()
            .success()
            .subject(format!("Certification Issued: {}", c.name))
            .greeting(format!("Hello {},", recipient.name))
            .line(self.message())
            .line(format!("Certification number: {}", c.certification_number))
            .line(format!("Issuing authority: {}", c.issuing_authority))
            .line(format!("Issued on: {}", c.issued_date))
            .line_if(c.expiry_date.is_some(), || {
                format!("Expires on: {}", c.expiry_date.map(|d| d.to_string()).unwrap_or_default())
            });

        if let Some(months) = self.renewal_months() {
            mail = mail.line(format!("This certification renews every {months} months."));
            if let Some(next) = c.next_renewal(ctx.today()) {
                mail = mail.line(format!("Next renewal: {next}"));
            }
        }

        mail.action("View Certification", ctx.url(&certification_path(c)))
    }

    fn to_array(&self, ctx: &NotificationContext) -> Value {
        let mut data = base_payload(
            self.notification_type(),
            &self.certification,
            &self.provider_name,
            self.message(),
            ctx,
        );
        data["issued_date"] = json!(self.certification.issued_date);
        data["is_recurring"] = json!(self.certification.is_recurring);
        data["renewal_period_months"] = json!(self.renewal_months());
        data
    }

    fn tags(&self) -> &'static [&'static str] {
        &["certification", "issued", "provider"]
    }

    fn should_send(&self, _recipient: &Recipient) -> bool {
        !self.certification.is_trashed() && self.certification.status == CertificationStatus::Active
    }
}

/// An active certification expires within a few days.
#[derive(Debug, Clone)]
pub struct CertificationExpiringSoon {
    pub certification: ProviderCertification,
    pub provider_name: String,
    pub days_remaining: i64,
}

impl CertificationExpiringSoon {
    /// `None` when the certification has no expiry date.
    pub fn new(
        certification: ProviderCertification,
        provider_name: impl Into<String>,
        today: chrono::NaiveDate,
    ) -> Option<Self> {
        let expiry = certification.expiry_date?;
        Some(Self {
            days_remaining: (expiry - today).num_days(),
            certification,
            provider_name: provider_name.into(),
        })
    }

    fn message(&self) -> String {
        match self.days_remaining {
            0 => format!("Certification {} expires today.", self.certification.name),
            1 => format!("Certification {} expires tomorrow.", self.certification.name),
            n => format!("Certification {} expires in {n} days.", self.certification.name),
        }
    }
}

impl Notification for CertificationExpiringSoon {
    fn notification_type(&self) -> &'static str {
        "certification_expiring_soon"
    }

    fn to_mail(&self, recipient: &Recipient, ctx: &NotificationContext) -> MailMessage {
        let c = &self.certification;
        MailMessage::new()
            .subject(format!("Certification Expiring Soon: {}", c.name))
            .greeting(format!("Hello {},", recipient.name))
            .line(self.message())
            .line(format!("Provider: {}", self.provider_name))
            .line(format!("Certification number: {}", c.certification_number))
            .line("Please arrange a renewal before the expiry date to stay compliant.")
            .action("Review Certification", ctx.url(&certification_path(c)))
    }

    fn to_array(&self, ctx: &NotificationContext) -> Value {
        let mut data = base_payload(
            self.notification_type(),
            &self.certification,
            &self.provider_name,
            self.message(),
            ctx,
        );
        data["days_remaining"] = json!(self.days_remaining);
        data
    }

    fn tags(&self) -> &'static [&'static str] {
        &["certification", "expiring", "provider", "compliance"]
    }

    fn should_send(&self, _recipient: &Recipient) -> bool {
        !self.certification.is_trashed()
            && self.certification.status == CertificationStatus::Active
            && self.days_remaining >= 0
    }
}

/// A certification reached its expiry date.
#[derive(Debug, Clone)]
pub struct CertificationExpired {
    pub certification: ProviderCertification,
    pub provider_name: String,
}

impl CertificationExpired {
    pub fn new(certification: ProviderCertification, provider_name: impl Into<String>) -> Self {
        Self {
            certification,
            provider_name: provider_name.into(),
        }
    }

    fn message(&self) -> String {
        format!(
            "Certification {} for {} has expired.",
            self.certification.name, self.provider_name
        )
    }
}

impl Notification for CertificationExpired {
    fn notification_type(&self) -> &'static str {
        "certification_expired"
    }

    fn to_mail(&self, recipient: &Recipient, ctx: &NotificationContext) -> MailMessage {
        let c = &self.certification;
        MailMessage::new()
            .error()
            .subject(format!("Certification Expired: {}", c.name))
            .greeting(format!("Hello {},", recipient.name))
            .line(self.message())
            .line_if(c.expiry_date.is_some(), || {
                format!("Expired on: {}", c.expiry_date.map(|d| d.to_string()).unwrap_or_default())
            })
            .line("The provider may not be assigned work that requires this certification until it is renewed.")
            .action("Renew Certification", ctx.url(&certification_path(c)))
    }

    fn to_array(&self, ctx: &NotificationContext) -> Value {
        base_payload(
            self.notification_type(),
            &self.certification,
            &self.provider_name,
            self.message(),
            ctx,
        )
    }

    fn tags(&self) -> &'static [&'static str] {
        &["certification", "expired", "provider", "compliance"]
    }

    fn should_send(&self, _recipient: &Recipient) -> bool {
        !self.certification.is_trashed() && self.certification.status == CertificationStatus::Expired
    }
}

/// A certification was revoked.
#[derive(Debug, Clone)]
pub struct CertificationRevoked {
    pub certification: ProviderCertification,
    pub provider_name: String,
}

impl CertificationRevoked {
    pub fn new(certification: ProviderCertification, provider_name: impl Into<String>) -> Self {
        Self {
            certification,
            provider_name: provider_name.into(),
        }
    }

    fn message(&self) -> String {
        format!(
            "Certification {} for {} has been revoked.",
            self.certification.name, self.provider_name
        )
    }
}

impl Notification for CertificationRevoked {
    fn notification_type(&self) -> &'static str {
        "certification_revoked"
    }

    fn to_mail(&self, recipient: &Recipient, ctx: &NotificationContext) -> MailMessage {
        let c = &self.certification;
        MailMessage::new()
            .error()
            .subject(format!("Certification Revoked: {}", c.name))
            .greeting(format!("Hello {},", recipient.name))
            .line(self.message())
            .line_if(c.status_reason.is_some(), || {
                format!("Reason: {}", c.status_reason.clone().unwrap_or_default())
            })
            .action("View Certification", ctx.url(&certification_path(c)))
            .line("Contact the compliance team if you believe this is a mistake.")
    }

    fn to_array(&self, ctx: &NotificationContext) -> Value {
        let mut data = base_payload(
            self.notification_type(),
            &self.certification,
            &self.provider_name,
            self.message(),
            ctx,
        );
        data["reason"] = json!(self.certification.status_reason);
        data
    }

    fn tags(&self) -> &'static [&'static str] {
        &["certification", "revoked", "provider", "compliance"]
    }

    fn should_send(&self, _recipient: &Recipient) -> bool {
        !self.certification.is_trashed() && self.certification.status == CertificationStatus::Revoked
    }
}
