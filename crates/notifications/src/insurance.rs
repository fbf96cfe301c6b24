//! Notifications about provider insurance policies.

use chrono::NaiveDate;
use serde_json::{json, Value};

use tradeerp_core::SoftDeletes;
use tradeerp_providers::{InsuranceStatus, ProviderInsurance};

use crate::notification::amount;
use crate::{MailMessage, Notification, NotificationContext, Recipient};

fn insurance_path(i: &ProviderInsurance) -> String {
    format!("/providers/{}/insurances/{}", i.provider_id, i.id)
}

/// The outcome of an insurance verification.
#[derive(Debug, Clone)]
pub struct InsuranceVerified {
    pub insurance: ProviderInsurance,
    pub provider_name: String,
}

impl InsuranceVerified {
    pub fn new(insurance: ProviderInsurance, provider_name: impl Into<String>) -> Self {
        Self {
            insurance,
            provider_name: provider_name.into(),
        }
    }

    fn approved(&self) -> bool {
        self.insurance.status == InsuranceStatus::Active
    }

    fn message(&self) -> String {
        if self.approved() {
            format!("Insurance policy {} has been verified.", self.insurance.policy_number)
        } else {
            format!(
                "Insurance policy {} was {} during verification.",
                self.insurance.policy_number, self.insurance.status
            )
        }
    }
}

impl Notification for InsuranceVerified {
    fn notification_type(&self) -> &'static str {
        "insurance_verified"
    }

    fn to_mail(&self, recipient: &Recipient, ctx: &NotificationContext) -> MailMessage {
        let i = &self.insurance;
        let mail = MailMessage::new()
            .subject(format!("Insurance Verification: {}", i.policy_number))
            .greeting(format!("Hello {},", recipient.name))
            .line(self.message())
            .line(format!("Provider: {}", self.provider_name))
            .line(format!("Insurer: {}", i.insurer_name))
            .line(format!("Coverage: {}", amount(i.coverage_amount)))
            .line(format!("Valid from {} to {}", i.effective_date, i.expiry_date))
            .line_if(i.verification_notes.is_some(), || {
                format!("Notes: {}", i.verification_notes.clone().unwrap_or_default())
            })
            .action("View Policy", ctx.url(&insurance_path(i)));
        if self.approved() { mail.success() } else { mail.error() }
    }

    fn to_array(&self, ctx: &NotificationContext) -> Value {
        let i = &self.insurance;
        json!({
            "type": self.notification_type(),
            "insurance_id": i.id,
            "provider_id": i.provider_id,
            "provider_name": self.provider_name,
            "policy_number": i.policy_number,
            "insurance_type": i.insurance_type,
            "status": i.status,
            "verified_at": i.verified_at,
            "verification_notes": i.verification_notes,
            "message": self.message(),
            "action_url": ctx.url(&insurance_path(i)),
            "created_at": ctx.now,
        })
    }

    fn tags(&self) -> &'static [&'static str] {
        &["insurance", "verification", "provider"]
    }

    fn should_send(&self, _recipient: &Recipient) -> bool {
        !self.insurance.is_trashed()
            && self.insurance.verified_at.is_some()
            && self.insurance.status != InsuranceStatus::Pending
    }
}

/// An active policy is about to lapse.
#[derive(Debug, Clone)]
pub struct InsuranceExpiring {
    pub insurance: ProviderInsurance,
    pub provider_name: String,
    pub days_remaining: i64,
}

impl InsuranceExpiring {
    pub fn new(insurance: ProviderInsurance, provider_name: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            days_remaining: insurance.days_until_expiry(today),
            insurance,
            provider_name: provider_name.into(),
        }
    }

    fn message(&self) -> String {
        format!(
            "Insurance policy {} ({}) expires in {} day{}.",
            self.insurance.policy_number,
            self.insurance.insurance_type,
            self.days_remaining,
            if self.days_remaining == 1 { "" } else { "s" }
        )
    }
}

impl Notification for InsuranceExpiring {
    fn notification_type(&self) -> &'static str {
        "insurance_expiring"
    }

    fn to_mail(&self, recipient: &Recipient, ctx: &NotificationContext) -> MailMessage {
        let i = &self.insurance;
        MailMessage::new()
            .subject(format!("Insurance Expiring: {}", i.policy_number))
            .greeting(format!("Hello {},", recipient.name))
            .line(self.message())
            .line(format!("Provider: {}", self.provider_name))
            .line(format!("Expiry date: {}", i.expiry_date))
            .line("Upload the renewed policy to keep the provider eligible for work.")
            .action("Update Policy", ctx.url(&insurance_path(i)))
    }

    fn to_array(&self, ctx: &NotificationContext) -> Value {
        let i = &self.insurance;
        json!({
            "type": self.notification_type(),
            "insurance_id": i.id,
            "provider_id": i.provider_id,
            "provider_name": self.provider_name,
            "policy_number": i.policy_number,
            "insurance_type": i.insurance_type,
            "expiry_date": i.expiry_date,
            "days_remaining": self.days_remaining,
            "message": self.message(),
            "action_url": ctx.url(&insurance_path(i)),
            "created_at": ctx.now,
        })
    }

    fn tags(&self) -> &'static [&'static str] {
        &["insurance", "expiring", "provider", "compliance"]
    }

    fn should_send(&self, _recipient: &Recipient) -> bool {
        !self.insurance.is_trashed()
            && self.insurance.status == InsuranceStatus::Active
            && self.days_remaining >= 0
    }
}
