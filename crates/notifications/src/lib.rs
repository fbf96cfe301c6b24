//! `tradeerp-notifications`: mail, in-app and broadcast renderings of
//! domain changes.
//!
//! A [`Notification`] knows how to describe itself on each channel; the
//! [`NotificationDispatcher`] decides whether it still applies and hands it to
//! a [`Mailer`] and a [`DatabaseNotificationStore`]. Broadcast events go out
//! on the events bus through [`broadcast`].

pub mod broadcasts;
pub mod certifications;
pub mod commerce;
pub mod dispatcher;
pub mod employees;
pub mod insurance;
pub mod mail;
pub mod notification;

pub use broadcasts::{broadcast, CertificationUpdated, EmployeeSalaryUpdated, OrderStatusUpdated};
pub use certifications::{
    CertificationExpired, CertificationExpiringSoon, CertificationIssued, CertificationRevoked,
};
pub use commerce::{OrderStatusChanged, SubscriptionStatusChanged};
pub use dispatcher::{
    DatabaseNotificationStore, DeliveryReport, Mailer, NotificationDispatcher, NotificationError,
};
pub use employees::{EmployeeTerminated, SalaryChanged};
pub use insurance::{InsuranceExpiring, InsuranceVerified};
pub use mail::{MailAction, MailLevel, MailMessage};
pub use notification::{DatabaseNotification, DeliveryChannel, Notification, NotificationContext, Recipient};

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    use tradeerp_core::Timestamps;
    use tradeerp_customers::{
        BillingCycle, CustomerId, SubscriptionPlan, SubscriptionStatus, UserSubscription, UserSubscriptionId,
    };
    use tradeerp_hr::{Employee, EmployeeId, EmployeeSalaryHistory, EmployeeSalaryHistoryId, EmployeeStatus, EmploymentType};
    use tradeerp_orders::{Order, OrderId, OrderStatus, OrderStatusHistory, OrderStatusHistoryId, PaymentStatus};
    use tradeerp_providers::{
        CertificationStatus, InsuranceStatus, InsuranceType, ProviderCertification, ProviderCertificationId,
        ProviderId, ProviderInsurance, ProviderInsuranceId,
    };

    use crate::{NotificationContext, Recipient};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    pub fn ctx() -> NotificationContext {
        NotificationContext::new("http://localhost:8080", now())
    }

    pub fn user() -> Recipient {
        Recipient::new("users", 1, "Dana").with_email("dana@example.com")
    }

    pub fn certification(status: CertificationStatus, renewal_months: Option<u32>) -> ProviderCertification {
        ProviderCertification {
            id: ProviderCertificationId(42),
            provider_id: ProviderId(7),
            name: "ISO 9001".into(),
            issuing_authority: "ISO".into(),
            certification_number: "ISO-42".into(),
            issued_date: date(2024, 1, 15),
            expiry_date: Some(date(2025, 12, 31)),
            status,
            status_reason: None,
            is_recurring: renewal_months.is_some(),
            renewal_period_months: renewal_months,
            document_url: None,
            timestamps: Timestamps::new(now()),
            deleted_at: None,
        }
    }

    pub fn insurance(status: InsuranceStatus) -> ProviderInsurance {
        ProviderInsurance {
            id: ProviderInsuranceId(3),
            provider_id: ProviderId(7),
            insurance_type: InsuranceType::GeneralLiability,
            policy_number: "GL-1".into(),
            insurer_name: "Mutual".into(),
            coverage_amount: 1_000_000.0,
            deductible: Some(5_000.0),
            effective_date: date(2025, 1, 1),
            expiry_date: date(2025, 12, 31),
            status,
            document_url: None,
            verified_at: Some(now()),
            verified_by: Some(1),
            verification_notes: None,
            timestamps: Timestamps::new(now()),
            deleted_at: None,
        }
    }

    pub fn employee(status: EmployeeStatus) -> Employee {
        Employee {
            id: EmployeeId(5),
            user_id: Some(1),
            employee_number: "EMP-005".into(),
            first_name: "Dana".into(),
            last_name: "Reyes".into(),
            email: "dana@example.com".into(),
            phone: None,
            date_of_birth: None,
            department: "Operations".into(),
            position: "Buyer".into(),
            manager_id: None,
            employment_type: EmploymentType::FullTime,
            status,
            hire_date: date(2020, 3, 1),
            salary: 50_000.0,
            termination_date: None,
            termination_type: None,
            termination_reason: None,
            eligible_for_rehire: None,
            timestamps: Timestamps::new(now()),
            deleted_at: None,
        }
    }

    pub fn salary_history(previous: f64, new: f64) -> EmployeeSalaryHistory {
        EmployeeSalaryHistory {
            id: EmployeeSalaryHistoryId(1),
            employee_id: EmployeeId(5),
            previous_salary: previous,
            new_salary: new,
            effective_date: date(2025, 7, 1),
            reason: "Annual review".into(),
            changed_by: Some(1),
            created_at: now(),
        }
    }

    pub fn order(status: OrderStatus) -> Order {
        Order {
            id: OrderId(1),
            order_number: "ORD-0001".into(),
            customer_id: Some(CustomerId(3)),
            user_id: Some(1),
            status,
            payment_status: PaymentStatus::Paid,
            currency: "USD".into(),
            subtotal: 90.0,
            discount_amount: 0.0,
            tax_amount: 5.0,
            shipping_amount: 5.0,
            total: 100.0,
            billing_address_id: None,
            shipping_address_id: None,
            shipping_method: None,
            tracking_number: None,
            notes: None,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
            timestamps: Timestamps::new(now()),
            deleted_at: None,
        }
    }

    pub fn status_history(from: OrderStatus, to: OrderStatus) -> OrderStatusHistory {
        OrderStatusHistory {
            id: OrderStatusHistoryId(1),
            order_id: OrderId(1),
            from_status: Some(from),
            to_status: to,
            comment: None,
            user_id: Some(1),
            notify_customer: true,
            created_at: now(),
        }
    }

    pub fn subscription(status: SubscriptionStatus) -> UserSubscription {
        UserSubscription {
            id: UserSubscriptionId(9),
            user_id: 1,
            plan: SubscriptionPlan::Premium,
            status,
            price: 49.0,
            billing_cycle: BillingCycle::Monthly,
            starts_at: date(2025, 1, 15),
            trial_ends_at: None,
            ends_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            auto_renew: true,
            timestamps: Timestamps::new(now()),
        }
    }
}
