//! Payment ledger of an order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradeerp_core::{record_id, string_enum, Entity, Money, Timestamps};

use crate::{Order, OrderId, PaymentStatus};

record_id!(TransactionId);

string_enum! {
    pub enum TransactionType {
        Payment => "payment",
        Refund => "refund",
    }
}

string_enum! {
    pub enum TransactionStatus {
        Pending => "pending",
        Completed => "completed",
        Failed => "failed",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub order_id: OrderId,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub status: TransactionStatus,
    pub amount: f64,
    pub currency: String,
    pub gateway: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewTransaction {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub status: TransactionStatus,
    pub amount: f64,
    pub currency: String,
    pub gateway: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl Transaction {
    pub fn create(id: TransactionId, order_id: OrderId, new: NewTransaction, now: DateTime<Utc>) -> Self {
        let processed_at = (new.status == TransactionStatus::Completed).then_some(now);
        Self {
            id,
            order_id,
            kind: new.kind,
            status: new.status,
            amount: new.amount,
            currency: new.currency,
            gateway: new.gateway,
            reference: new.reference,
            notes: new.notes,
            processed_at,
            timestamps: Timestamps::new(now),
        }
    }
}

impl Entity for Transaction {
    type Id = TransactionId;

    fn id(&self) -> &TransactionId {
        &self.id
    }
}

/// Completed payments and refunds of one order, in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ledger {
    pub paid_minor: i64,
    pub refunded_minor: i64,
}

impl Ledger {
    pub fn of(transactions: &[Transaction]) -> Self {
        transactions
            .iter()
            .filter(|t| t.status == TransactionStatus::Completed)
            .fold(Self::default(), |mut acc, t| {
                let minor = (t.amount * 100.0).round() as i64;
                match t.kind {
                    TransactionType::Payment => acc.paid_minor += minor,
                    TransactionType::Refund => acc.refunded_minor += minor,
                }
                acc
            })
    }

    /// What may still be refunded: the order total minus earlier refunds.
    pub fn refundable(&self, order: &Order) -> f64 {
        let total_minor = (order.total * 100.0).round() as i64;
        (total_minor - self.refunded_minor).max(0) as f64 / 100.0
    }

    pub fn payment_status(&self, order: &Order) -> PaymentStatus {
        let total_minor = (order.total * 100.0).round() as i64;
        if self.refunded_minor > 0 {
            if self.refunded_minor >= total_minor {
                PaymentStatus::Refunded
            } else {
                PaymentStatus::PartiallyRefunded
            }
        } else if self.paid_minor >= total_minor && total_minor > 0 {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Pending
        }
    }

    pub fn refunded(&self, currency: &str) -> tradeerp_core::DomainResult<Money> {
        Money::new(self.refunded_minor, currency)
    }
}
