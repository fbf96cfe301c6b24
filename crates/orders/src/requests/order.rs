use tradeerp_auth::Permission;
use tradeerp_core::{Lifecycle, SortDirection};
use tradeerp_validation::{DateRef, FormRequest, Input, Messages, Rule, Rules, ValidationErrors};

use super::MAX_LINE_QUANTITY;

use crate::{NewOrder, Order, OrderSearch, OrderSortField, OrderStatus, OrderStatusUpdate, PaymentStatus};

pub struct StoreOrderRequest;

impl FormRequest for StoreOrderRequest {
    type Output = NewOrder;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("orders.create"))
    }

    fn prepare(&self, input: &mut Input) {
        input.default("currency", "USD");
        input.uppercase("currency");
        input.default("shipping_amount", 0);
        input.default("discount_amount", 0);
        input.default("tax_amount", 0);
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("customer_id", [Rule::Nullable, Rule::Integer, Rule::exists("customers", "id")])
            .field("currency", [Rule::Required, Rule::String, Rule::Between(3.0, 3.0)])
            .field("items", [Rule::Required, Rule::Array, Rule::Min(1.0), Rule::Max(100.0)])
            .field("items.*.product_id", [Rule::Required, Rule::Integer, Rule::exists("products", "id")])
            .field("items.*.variant_id", [Rule::Nullable, Rule::Integer, Rule::exists("product_variants", "id")])
            .field("items.*.quantity", [Rule::Required, Rule::Integer, Rule::Min(1.0), Rule::Max(MAX_LINE_QUANTITY)])
            .field("items.*.unit_price", [Rule::Nullable, Rule::Numeric, Rule::Min(0.0)])
            .field("billing_address_id", [Rule::Nullable, Rule::Integer, Rule::exists("addresses", "id")])
            .field("shipping_address_id", [Rule::Nullable, Rule::Integer, Rule::exists("addresses", "id")])
            .field("shipping_method", [Rule::Nullable, Rule::String, Rule::Max(100.0)])
            .field("shipping_amount", [Rule::Numeric, Rule::Min(0.0)])
            .field("discount_amount", [Rule::Numeric, Rule::Min(0.0)])
            .field("tax_amount", [Rule::Numeric, Rule::Min(0.0)])
            .field("notes", [Rule::Nullable, Rule::String, Rule::Max(1000.0)])
    }

    fn messages(&self) -> Messages {
        Messages::new()
            .with("items.required", "An order needs at least one item.")
            .with("items.min", "An order needs at least one item.")
            .with("items.max", "An order may contain at most :max items.")
            .with("items.*.product_id.exists", "The selected product does not exist.")
            .with("items.*.quantity.min", "Each item quantity must be at least 1.")
            .with("items.*.quantity.max", "Each item quantity may be at most :max.")
    }
}

/// Move an order along its lifecycle.
pub struct UpdateOrderStatusRequest {
    pub order: Order,
}

impl FormRequest for UpdateOrderStatusRequest {
    type Output = OrderStatusUpdate;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("orders.update_status"))
    }

    fn prepare(&self, input: &mut Input) {
        input.lowercase("status");
        input.default("notify_customer", true);
        input.coerce_bool("notify_customer");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("status", [Rule::Required, Rule::In(OrderStatus::VALUES)])
            .field("comment", [Rule::Nullable, Rule::String, Rule::Max(500.0)])
            .field(
                "tracking_number",
                [Rule::RequiredIf("status", &["shipped"]), Rule::Nullable, Rule::String, Rule::Max(100.0)],
            )
            .field("notify_customer", [Rule::Boolean])
    }

    fn messages(&self) -> Messages {
        Messages::new().with(
            "tracking_number.required_if",
            "A tracking number is required when marking an order as shipped.",
        )
    }

    fn after(&self, input: &Input, errors: &mut ValidationErrors) {
        if errors.has("status") {
            return;
        }
        let Some(target) = input.get_str("status").and_then(|s| s.parse::<OrderStatus>().ok()) else {
            return;
        };
        let current = self.order.status;
        if target == current {
            errors.add("status", format!("The order is already {}.", current.as_str()));
        } else if !current.can_transition_to(target) {
            errors.add(
                "status",
                format!(
                    "Cannot change order status from {} to {}.",
                    current.as_str(),
                    target.as_str()
                ),
            );
        }
    }
}

pub struct SearchOrderRequest;

impl FormRequest for SearchOrderRequest {
    type Output = OrderSearch;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("orders.view"))
    }

    fn prepare(&self, input: &mut Input) {
        input.default("per_page", tradeerp_core::PageRequest::DEFAULT_PER_PAGE);
        input.default("page", 1);
        input.default("sort_by", OrderSortField::CreatedAt.as_str());
        input.default("sort_direction", SortDirection::Desc.as_str());
        input.lowercase("sort_direction");
        input.lowercase("status");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("q", [Rule::Nullable, Rule::String, Rule::Max(50.0)])
            .field("status", [Rule::Nullable, Rule::In(OrderStatus::VALUES)])
            .field("payment_status", [Rule::Nullable, Rule::In(PaymentStatus::VALUES)])
            .field("customer_id", [Rule::Nullable, Rule::Integer])
            .field("date_from", [Rule::Nullable, Rule::Date])
            .field("date_to", [Rule::Nullable, Rule::Date, Rule::AfterOrEqual(DateRef::Field("date_from"))])
            .field("min_total", [Rule::Nullable, Rule::Numeric, Rule::Min(0.0)])
            .field("max_total", [Rule::Nullable, Rule::Numeric, Rule::Gte("min_total")])
            .field("sort_by", [Rule::In(OrderSortField::VALUES)])
            .field("sort_direction", [Rule::In(SortDirection::VALUES)])
            .field("per_page", [Rule::Integer, Rule::Between(1.0, 100.0)])
            .field("page", [Rule::Integer, Rule::Between(1.0, f64::from(u32::MAX))])
    }

    fn messages(&self) -> Messages {
        Messages::new()
            .with("date_to.after_or_equal", "The end date must be on or after the start date.")
            .with("max_total.gte", "The maximum total must be greater than or equal to the minimum total.")
    }
}
