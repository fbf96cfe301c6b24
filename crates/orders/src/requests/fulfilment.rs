use std::collections::HashSet;

use tradeerp_auth::Permission;
use tradeerp_validation::{FormRequest, Input, Messages, Rule, Rules, ValidationErrors};

use super::MAX_LINE_QUANTITY;

use crate::{
    unshipped_quantities, Ledger, NewShipment, NewTransaction, Order, OrderItem, OrderStatus,
    ShipmentItem, Transaction, TransactionStatus, TransactionType,
};

/// Ship some or all of an order's lines.
pub struct StoreShipmentRequest {
    pub order: Order,
    pub items: Vec<OrderItem>,
    /// Lines already covered by earlier shipments.
    pub shipped: Vec<ShipmentItem>,
}

impl FormRequest for StoreShipmentRequest {
    type Output = NewShipment;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("orders.ship"))
    }

    fn prepare(&self, input: &mut Input) {
        if let Some(day) = input.get_str("shipped_at").filter(|s| s.len() == 10) {
            let stamped = format!("{day}T00:00:00Z");
            input.set("shipped_at", stamped);
        }
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("carrier", [Rule::Required, Rule::String, Rule::Max(100.0)])
            .field("tracking_number", [Rule::Nullable, Rule::String, Rule::Max(100.0)])
            .field("shipped_at", [Rule::Nullable, Rule::Date])
            .field("notes", [Rule::Nullable, Rule::String, Rule::Max(1000.0)])
            .field("items", [Rule::Required, Rule::Array, Rule::Min(1.0)])
            .field("items.*.order_item_id", [Rule::Required, Rule::Integer, Rule::Distinct])
            .field("items.*.quantity", [Rule::Required, Rule::Integer, Rule::Min(1.0), Rule::Max(MAX_LINE_QUANTITY)])
    }

    fn messages(&self) -> Messages {
        Messages::new().with("items.*.order_item_id.distinct", "Each order item may only be listed once.")
    }

    fn after(&self, input: &Input, errors: &mut ValidationErrors) {
        if !matches!(self.order.status, OrderStatus::Processing | OrderStatus::Shipped) {
            errors.add(
                "order",
                format!("Orders that are {} cannot be shipped.", self.order.status.as_str()),
            );
            return;
        }
        let owned: HashSet<i64> = self.items.iter().map(|i| i.id.get()).collect();
        let remaining = unshipped_quantities(&self.items, &self.shipped);
        for path in input.expand("items.*.order_item_id") {
            if errors.has(&path) {
                continue;
            }
            let Some(item_id) = input.get_f64(&path).map(|v| v as i64) else {
                continue;
            };
            if !owned.contains(&item_id) {
                errors.add(path, "The selected item does not belong to this order.");
                continue;
            }
            let quantity_path = path.replace("order_item_id", "quantity");
            let left = remaining.get(&crate::OrderItemId(item_id)).copied().unwrap_or(0);
            if input.get_f64(&quantity_path).is_some_and(|q| q > f64::from(left)) && !errors.has(&quantity_path) {
                errors.add(quantity_path, format!("Only {left} of this item remain to be shipped."));
            }
        }
    }
}

/// Record a payment or refund against an order.
pub struct StoreTransactionRequest {
    pub order: Order,
    pub transactions: Vec<Transaction>,
}

impl FormRequest for StoreTransactionRequest {
    type Output = NewTransaction;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("orders.manage_payments"))
    }

    fn prepare(&self, input: &mut Input) {
        input.lowercase("type");
        input.default("status", TransactionStatus::Completed.as_str());
        input.default("currency", self.order.currency.as_str());
        input.uppercase("currency");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("type", [Rule::Required, Rule::In(TransactionType::VALUES)])
            .field("status", [Rule::Required, Rule::In(TransactionStatus::VALUES)])
            .field("amount", [Rule::Required, Rule::Numeric, Rule::Min(0.01)])
            .field("currency", [Rule::Required, Rule::String, Rule::Between(3.0, 3.0)])
            .field("gateway", [Rule::Nullable, Rule::String, Rule::Max(50.0)])
            .field(
                "reference",
                [Rule::Nullable, Rule::String, Rule::Max(255.0), Rule::unique("transactions", "reference")],
            )
            .field("notes", [Rule::Nullable, Rule::String, Rule::Max(1000.0)])
    }

    fn messages(&self) -> Messages {
        Messages::new().with("reference.unique", "This transaction reference has already been recorded.")
    }

    fn after(&self, input: &Input, errors: &mut ValidationErrors) {
        if !errors.has("currency") && input.get_str("currency") != Some(self.order.currency.as_str()) {
            errors.add(
                "currency",
                format!("The currency must match the order currency ({}).", self.order.currency),
            );
        }
        if errors.has("amount") || input.get_str("type") != Some(TransactionType::Refund.as_str()) {
            return;
        }
        let refundable = Ledger::of(&self.transactions).refundable(&self.order);
        if input.get_f64("amount").is_some_and(|a| a > refundable + 1e-9) {
            errors.add(
                "amount",
                format!("The refund cannot exceed the refundable amount of {refundable:.2}."),
            );
        }
    }
}
