use tradeerp_auth::Permission;
use tradeerp_validation::{FormRequest, Input, Messages, Rule, Rules, ValidationErrors};

use crate::{
    CommunicationChannel, CommunicationDirection, Customer, CustomerId, LoyaltyType,
    NewCustomerCommunication, NewCustomerSegment, NewLoyaltyTransaction, SegmentField,
    SegmentOperator,
};

pub struct StoreCustomerSegmentRequest;

impl FormRequest for StoreCustomerSegmentRequest {
    type Output = NewCustomerSegment;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("customers.manage_segments"))
    }

    fn prepare(&self, input: &mut Input) {
        input.slug_from("slug", "name");
        input.default("is_active", true);
        input.coerce_bool("is_active");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field(
                "name",
                [Rule::Required, Rule::String, Rule::Max(100.0), Rule::unique("customer_segments", "name")],
            )
            .field("slug", [Rule::Required, Rule::AlphaDash, Rule::unique("customer_segments", "slug")])
            .field("description", [Rule::Nullable, Rule::String, Rule::Max(500.0)])
            .field("criteria", [Rule::Nullable, Rule::Array, Rule::Max(10.0)])
            .field("criteria.*.field", [Rule::Required, Rule::In(SegmentField::VALUES)])
            .field("criteria.*.operator", [Rule::Required, Rule::In(SegmentOperator::VALUES)])
            .field("criteria.*.value", [Rule::Required])
            .field("is_active", [Rule::Boolean])
    }

    fn attributes(&self) -> tradeerp_validation::Attributes {
        tradeerp_validation::Attributes::new()
            .with("criteria.*.field", "criterion field")
            .with("criteria.*.operator", "criterion operator")
            .with("criteria.*.value", "criterion value")
    }
}

pub struct StoreCustomerCommunicationRequest {
    pub customer_id: CustomerId,
}

impl FormRequest for StoreCustomerCommunicationRequest {
    type Output = NewCustomerCommunication;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("customers.communicate"))
    }

    fn prepare(&self, input: &mut Input) {
        input.lowercase("channel");
        input.lowercase("direction");
        input.default("direction", CommunicationDirection::Outbound.as_str());
        // Bare dates are logged at midnight UTC.
        if let Some(day) = input.get_str("communicated_at").filter(|s| s.len() == 10) {
            let stamped = format!("{day}T00:00:00Z");
            input.set("communicated_at", stamped);
        }
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("channel", [Rule::Required, Rule::In(CommunicationChannel::VALUES)])
            .field("direction", [Rule::Required, Rule::In(CommunicationDirection::VALUES)])
            .field(
                "subject",
                [Rule::RequiredIf("channel", &["email"]), Rule::Nullable, Rule::String, Rule::Max(255.0)],
            )
            .field("content", [Rule::Required, Rule::String, Rule::Max(10000.0)])
            .field("communicated_at", [Rule::Nullable, Rule::Date])
    }

    fn messages(&self) -> Messages {
        Messages::new().with("subject.required_if", "Emails need a subject.")
    }
}

pub struct StoreLoyaltyTransactionRequest {
    pub customer: Customer,
}

impl FormRequest for StoreLoyaltyTransactionRequest {
    type Output = NewLoyaltyTransaction;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("customers.manage_loyalty"))
    }

    fn prepare(&self, input: &mut Input) {
        input.lowercase("type");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("type", [Rule::Required, Rule::In(LoyaltyType::VALUES)])
            .field("points", [Rule::Required, Rule::Integer, Rule::NotIn(&["0"])])
            .field("order_id", [Rule::Nullable, Rule::Integer, Rule::exists("orders", "id")])
            .field("description", [Rule::Nullable, Rule::String, Rule::Max(255.0)])
    }

    fn messages(&self) -> Messages {
        Messages::new().with("points.not_in", "The points must not be zero.")
    }

    fn after(&self, input: &Input, errors: &mut ValidationErrors) {
        if errors.has("type") || errors.has("points") {
            return;
        }
        let (Some(kind), Some(points)) = (
            input.get_str("type").and_then(|t| t.parse::<LoyaltyType>().ok()),
            input.get_f64("points"),
        ) else {
            return;
        };
        if kind != LoyaltyType::Adjust && points < 1.0 {
            errors.add("points", "The points must be at least 1.");
            return;
        }
        let outgoing = match kind {
            LoyaltyType::Redeem | LoyaltyType::Expire => points,
            LoyaltyType::Adjust if points < 0.0 => -points,
            _ => 0.0,
        };
        if outgoing > self.customer.loyalty_points as f64 {
            errors.add(
                "points",
                format!(
                    "The customer only has {} points available.",
                    self.customer.loyalty_points
                ),
            );
        }
    }
}
