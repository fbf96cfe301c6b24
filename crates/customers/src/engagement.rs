//! Segments, communication log and loyalty ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tradeerp_core::{record_id, string_enum, Timestamps};

use crate::{Customer, CustomerId};

record_id!(CustomerSegmentId);
record_id!(CustomerCommunicationId);
record_id!(LoyaltyTransactionId);

string_enum! {
    /// Customer attribute a segment criterion looks at.
    pub enum SegmentField {
        TotalSpent => "total_spent",
        OrderCount => "order_count",
        LastOrderDays => "last_order_days",
        LoyaltyPoints => "loyalty_points",
        CustomerType => "customer_type",
    }
}

string_enum! {
    pub enum SegmentOperator {
        Eq => "=",
        Ne => "!=",
        Gt => ">",
        Gte => ">=",
        Lt => "<",
        Lte => "<=",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentCriterion {
    pub field: SegmentField,
    pub operator: SegmentOperator,
    pub value: Value,
}

/// Aggregates a segment is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CustomerStats {
    pub total_spent: f64,
    pub order_count: u32,
    pub last_order_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSegment {
    pub id: CustomerSegmentId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub criteria: Vec<SegmentCriterion>,
    pub is_active: bool,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewCustomerSegment {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    #[serde(default)]
    pub criteria: Option<Vec<SegmentCriterion>>,
    pub is_active: bool,
}

impl CustomerSegment {
    pub fn create(id: CustomerSegmentId, new: NewCustomerSegment, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            slug: new.slug,
            description: new.description,
            criteria: new.criteria.unwrap_or_default(),
            is_active: new.is_active,
            timestamps: Timestamps::new(now),
        }
    }

    /// All criteria must hold. A segment without criteria matches nobody.
    pub fn matches(&self, customer: &Customer, stats: &CustomerStats) -> bool {
        self.is_active
            && !self.criteria.is_empty()
            && self.criteria.iter().all(|c| c.holds(customer, stats))
    }
}

impl SegmentCriterion {
    fn holds(&self, customer: &Customer, stats: &CustomerStats) -> bool {
        if self.field == SegmentField::CustomerType {
            let actual = customer.customer_type.as_str();
            let expected = self.value.as_str().unwrap_or_default();
            return match self.operator {
                SegmentOperator::Eq => actual == expected,
                SegmentOperator::Ne => actual != expected,
                _ => false,
            };
        }
        let actual = match self.field {
            SegmentField::TotalSpent => stats.total_spent,
            SegmentField::OrderCount => f64::from(stats.order_count),
            SegmentField::LastOrderDays => match stats.last_order_days {
                Some(days) => f64::from(days),
                None => return false,
            },
            SegmentField::LoyaltyPoints => customer.loyalty_points as f64,
            SegmentField::CustomerType => return false,
        };
        let expected = match &self.value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        };
        let Some(expected) = expected else {
            return false;
        };
        match self.operator {
            SegmentOperator::Eq => actual == expected,
            SegmentOperator::Ne => actual != expected,
            SegmentOperator::Gt => actual > expected,
            SegmentOperator::Gte => actual >= expected,
            SegmentOperator::Lt => actual < expected,
            SegmentOperator::Lte => actual <= expected,
        }
    }
}

string_enum! {
    pub enum CommunicationChannel {
        Email => "email",
        Phone => "phone",
        Sms => "sms",
        Chat => "chat",
        InPerson => "in_person",
    }
}

string_enum! {
    pub enum CommunicationDirection {
        Inbound => "inbound",
        Outbound => "outbound",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerCommunication {
    pub id: CustomerCommunicationId,
    pub customer_id: CustomerId,
    /// Staff member who logged it.
    pub user_id: Option<i64>,
    pub channel: CommunicationChannel,
    pub direction: CommunicationDirection,
    pub subject: Option<String>,
    pub content: String,
    pub communicated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewCustomerCommunication {
    pub channel: CommunicationChannel,
    pub direction: CommunicationDirection,
    pub subject: Option<String>,
    pub content: String,
    pub communicated_at: Option<DateTime<Utc>>,
}

impl CustomerCommunication {
    pub fn create(
        id: CustomerCommunicationId,
        customer_id: CustomerId,
        user_id: Option<i64>,
        new: NewCustomerCommunication,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer_id,
            user_id,
            channel: new.channel,
            direction: new.direction,
            subject: new.subject,
            content: new.content,
            communicated_at: new.communicated_at.unwrap_or(now),
            timestamps: Timestamps::new(now),
        }
    }
}

string_enum! {
    pub enum LoyaltyType {
        Earn => "earn",
        Redeem => "redeem",
        Adjust => "adjust",
        Expire => "expire",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyTransaction {
    pub id: LoyaltyTransactionId,
    pub customer_id: CustomerId,
    pub order_id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: LoyaltyType,
    pub points: i64,
    pub balance_after: i64,
    pub description: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewLoyaltyTransaction {
    #[serde(rename = "type")]
    pub kind: LoyaltyType,
    pub points: i64,
    pub order_id: Option<i64>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer::tests::customer;
    use serde_json::json;

    fn segment(criteria: Value) -> CustomerSegment {
        CustomerSegment::create(
            CustomerSegmentId(1),
            NewCustomerSegment {
                name: "VIP".into(),
                slug: "vip".into(),
                description: None,
                criteria: serde_json::from_value(criteria).unwrap(),
                is_active: true,
            },
            Utc::now(),
        )
    }

    #[test]
    fn every_criterion_must_hold() {
        let vip = segment(json!([
            {"field": "total_spent", "operator": ">=", "value": 1000},
            {"field": "customer_type", "operator": "=", "value": "individual"}
        ]));
        let stats = CustomerStats { total_spent: 1500.0, order_count: 12, last_order_days: Some(3) };
        assert!(vip.matches(&customer(1, 0), &stats));

        let small = CustomerStats { total_spent: 999.0, ..stats };
        assert!(!vip.matches(&customer(1, 0), &small));
    }

    #[test]
    fn lapsed_customers_need_an_order_history() {
        let lapsed = segment(json!([{"field": "last_order_days", "operator": ">", "value": "90"}]));
        let never = CustomerStats { total_spent: 0.0, order_count: 0, last_order_days: None };
        assert!(!lapsed.matches(&customer(1, 0), &never));
        let old = CustomerStats { last_order_days: Some(120), ..never };
        assert!(lapsed.matches(&customer(1, 0), &old));
    }

    #[test]
    fn empty_segment_matches_nobody() {
        let s = segment(json!(null));
        let stats = CustomerStats { total_spent: 0.0, order_count: 0, last_order_days: None };
        assert!(!s.matches(&customer(1, 0), &stats));
    }
}
