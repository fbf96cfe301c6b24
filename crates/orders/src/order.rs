use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tradeerp_catalog::{Product, ProductId, ProductVariant, ProductVariantId};
use tradeerp_core::{
    record_id, string_enum, DomainError, DomainResult, Entity, Lifecycle, Money, Page, PageRequest,
    SoftDeletes, SortDirection, StatusChange, Timestamps,
};
use tradeerp_customers::{AddressId, CustomerId};

record_id!(
    /// Key of an `orders` row.
    OrderId
);
record_id!(OrderItemId);
record_id!(OrderStatusHistoryId);

string_enum! {
    pub enum OrderStatus {
        Pending => "pending",
        Processing => "processing",
        Shipped => "shipped",
        Delivered => "delivered",
        Cancelled => "cancelled",
        Returned => "returned",
        Refunded => "refunded",
    }
}

impl Lifecycle for OrderStatus {
    fn allowed_transitions(&self) -> &'static [Self] {
        use OrderStatus::*;
        match self {
            Pending => &[Processing, Cancelled],
            Processing => &[Shipped, Cancelled],
            Shipped => &[Delivered, Returned],
            Delivered => &[Returned, Refunded],
            Returned => &[Refunded],
            Cancelled | Refunded => &[],
        }
    }

    fn as_str(&self) -> &'static str {
        OrderStatus::as_str(self)
    }
}

string_enum! {
    pub enum PaymentStatus {
        Pending => "pending",
        Paid => "paid",
        PartiallyRefunded => "partially_refunded",
        Refunded => "refunded",
        Failed => "failed",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub customer_id: Option<CustomerId>,
    pub user_id: Option<i64>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub currency: String,
    pub subtotal: f64,
    pub discount_amount: f64,
    pub tax_amount: f64,
    pub shipping_amount: f64,
    pub total: f64,
    pub billing_address_id: Option<AddressId>,
    pub shipping_address_id: Option<AddressId>,
    pub shipping_method: Option<String>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub variant_id: Option<ProductVariantId>,
    pub name: String,
    pub sku: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub total: f64,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub variant_id: Option<ProductVariantId>,
    pub quantity: u32,
    /// Catalog price is used when absent.
    pub unit_price: Option<f64>,
}

/// Validated payload of an order placement request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewOrder {
    pub customer_id: Option<CustomerId>,
    pub currency: String,
    pub items: Vec<NewOrderItem>,
    pub billing_address_id: Option<AddressId>,
    pub shipping_address_id: Option<AddressId>,
    pub shipping_method: Option<String>,
    #[serde(default)]
    pub shipping_amount: f64,
    #[serde(default)]
    pub discount_amount: f64,
    #[serde(default)]
    pub tax_amount: f64,
    pub notes: Option<String>,
}

/// Order amounts, summed in minor units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
}

impl OrderTotals {
    /// `lines` are `(unit_price, quantity)` pairs. The discount may not exceed
    /// the subtotal.
    pub fn compute(
        currency: &str,
        lines: impl IntoIterator<Item = (f64, u32)>,
        discount: f64,
        tax: f64,
        shipping: f64,
    ) -> DomainResult<Self> {
        let mut subtotal = Money::zero(currency)?;
        for (unit_price, quantity) in lines {
            subtotal = subtotal.checked_add(&line_total(currency, unit_price, quantity)?)?;
        }
        let discount = Money::from_decimal(discount, currency)?;
        let tax = Money::from_decimal(tax, currency)?;
        let shipping = Money::from_decimal(shipping, currency)?;
        if discount.amount_minor > subtotal.amount_minor {
            return Err(DomainError::validation(format!(
                "discount {discount} exceeds subtotal {subtotal}"
            )));
        }
        let total = Money::new(subtotal.amount_minor - discount.amount_minor, currency)?
            .checked_add(&tax)?
            .checked_add(&shipping)?;
        Ok(Self {
            subtotal,
            discount,
            tax,
            shipping,
            total,
        })
    }
}

fn line_total(currency: &str, unit_price: f64, quantity: u32) -> DomainResult<Money> {
    let unit = Money::from_decimal(unit_price, currency)?;
    let amount = unit
        .amount_minor
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| DomainError::invariant("line total overflow"))?;
    Money::new(amount, currency)
}

impl Order {
    /// `ORD-20250601-000042`
    pub fn number_for(id: OrderId, placed_on: NaiveDate) -> String {
        format!("ORD-{}-{:06}", placed_on.format("%Y%m%d"), id.get())
    }

    /// Price the lines against the catalog and build the order with its items.
    pub fn place(
        id: OrderId,
        user_id: Option<i64>,
        new: NewOrder,
        catalog: &[Product],
        variants: &[ProductVariant],
        mut next_item_id: impl FnMut() -> OrderItemId,
        now: DateTime<Utc>,
    ) -> DomainResult<(Self, Vec<OrderItem>)> {
        let mut items = Vec::with_capacity(new.items.len());
        for line in &new.items {
            let product = catalog
                .iter()
                .find(|p| p.id == line.product_id && !p.is_trashed())
                .ok_or_else(|| DomainError::not_found(format!("product {}", line.product_id)))?;
            let variant = match line.variant_id {
                Some(vid) => Some(
                    variants
                        .iter()
                        .find(|v| v.id == vid && v.product_id == product.id)
                        .ok_or_else(|| DomainError::not_found(format!("variant {vid}")))?,
                ),
                None => None,
            };
            let catalog_price = variant.map_or(product.price, |v| v.effective_price(product.price));
            let unit_price = line.unit_price.unwrap_or(catalog_price);
            let total = line_total(&new.currency, unit_price, line.quantity)?.as_decimal();
            items.push(OrderItem {
                id: next_item_id(),
                order_id: id,
                product_id: product.id,
                variant_id: line.variant_id,
                name: variant.map_or_else(|| product.name.clone(), |v| format!("{} ({})", product.name, v.name)),
                sku: variant.map_or_else(|| product.sku.clone(), |v| v.sku.clone()),
                quantity: line.quantity,
                unit_price,
                total,
                timestamps: Timestamps::new(now),
            });
        }

        let totals = OrderTotals::compute(
            &new.currency,
            items.iter().map(|i| (i.unit_price, i.quantity)),
            new.discount_amount,
            new.tax_amount,
            new.shipping_amount,
        )?;
        let order = Self {
            id,
            order_number: Self::number_for(id, now.date_naive()),
            customer_id: new.customer_id,
            user_id,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            currency: new.currency,
            subtotal: totals.subtotal.as_decimal(),
            discount_amount: totals.discount.as_decimal(),
            tax_amount: totals.tax.as_decimal(),
            shipping_amount: totals.shipping.as_decimal(),
            total: totals.total.as_decimal(),
            billing_address_id: new.billing_address_id,
            shipping_address_id: new.shipping_address_id,
            shipping_method: new.shipping_method,
            tracking_number: None,
            notes: new.notes,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
            timestamps: Timestamps::new(now),
            deleted_at: None,
        };
        Ok((order, items))
    }

    /// Move the order along its lifecycle and stamp the matching timestamp.
    pub fn change_status(
        &mut self,
        update: OrderStatusUpdate,
        now: DateTime<Utc>,
    ) -> DomainResult<StatusChange<OrderStatus>> {
        let moved = StatusChange::checked(self.status, update.status)?;
        if moved.to == OrderStatus::Shipped && update.tracking_number.is_none() && self.tracking_number.is_none() {
            return Err(DomainError::validation("shipping an order requires a tracking number"));
        }
        self.status = moved.to;
        match moved.to {
            OrderStatus::Shipped => self.shipped_at = Some(now),
            OrderStatus::Delivered => self.delivered_at = Some(now),
            OrderStatus::Cancelled => self.cancelled_at = Some(now),
            OrderStatus::Refunded => self.payment_status = PaymentStatus::Refunded,
            _ => {}
        }
        if update.tracking_number.is_some() {
            self.tracking_number = update.tracking_number;
        }
        self.timestamps.touch(now);
        Ok(moved)
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &OrderId {
        &self.id
    }
}

impl SoftDeletes for Order {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
    pub comment: Option<String>,
    pub tracking_number: Option<String>,
    #[serde(default = "notify_by_default")]
    pub notify_customer: bool,
}

fn notify_by_default() -> bool {
    true
}

/// Audit row written for every status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusHistory {
    pub id: OrderStatusHistoryId,
    pub order_id: OrderId,
    pub from_status: Option<OrderStatus>,
    pub to_status: OrderStatus,
    pub comment: Option<String>,
    pub user_id: Option<i64>,
    pub notify_customer: bool,
    pub created_at: DateTime<Utc>,
}

impl OrderStatusHistory {
    pub fn record(
        id: OrderStatusHistoryId,
        order_id: OrderId,
        change: StatusChange<OrderStatus>,
        update: &OrderStatusUpdate,
        user_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            order_id,
            from_status: Some(change.from),
            to_status: change.to,
            comment: update.comment.clone(),
            user_id,
            notify_customer: update.notify_customer,
            created_at: now,
        }
    }
}

string_enum! {
    pub enum OrderSortField {
        CreatedAt => "created_at",
        Total => "total",
        OrderNumber => "order_number",
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderSearch {
    pub q: Option<String>,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub customer_id: Option<CustomerId>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub min_total: Option<f64>,
    pub max_total: Option<f64>,
    pub sort_by: OrderSortField,
    pub sort_direction: SortDirection,
    pub per_page: u32,
    pub page: u32,
}

impl OrderSearch {
    pub fn matches(&self, order: &Order) -> bool {
        if order.is_trashed() {
            return false;
        }
        let placed_on = order.timestamps.created_at.date_naive();
        self.q
            .as_deref()
            .is_none_or(|q| order.order_number.to_lowercase().contains(&q.to_lowercase()))
            && self.status.is_none_or(|s| order.status == s)
            && self.payment_status.is_none_or(|s| order.payment_status == s)
            && self.customer_id.is_none_or(|c| order.customer_id == Some(c))
            && self.date_from.is_none_or(|d| placed_on >= d)
            && self.date_to.is_none_or(|d| placed_on <= d)
            && self.min_total.is_none_or(|t| order.total >= t)
            && self.max_total.is_none_or(|t| order.total <= t)
    }

    pub fn run(&self, orders: Vec<Order>) -> Page<Order> {
        let mut hits: Vec<Order> = orders.into_iter().filter(|o| self.matches(o)).collect();
        hits.sort_by(|a, b| {
            let ord = match self.sort_by {
                OrderSortField::CreatedAt => a.timestamps.created_at.cmp(&b.timestamps.created_at),
                OrderSortField::Total => a.total.total_cmp(&b.total),
                OrderSortField::OrderNumber => a.order_number.cmp(&b.order_number),
            };
            self.sort_direction.apply(ord)
        });
        Page::paginate(hits, PageRequest::new(self.page, self.per_page))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn product(id: i64, name: &str, price: f64) -> Product {
        serde_json::from_value(serde_json::json!({
            "id": id, "brand_id": null, "category_id": null, "name": name,
            "slug": name.to_lowercase(), "sku": format!("SKU-{id}"),
            "description": null, "short_description": null, "price": price,
            "compare_price": null, "cost_price": null, "quantity": 10, "weight": null,
            "status": "active", "is_featured": false, "meta_title": null,
            "meta_description": null, "tags": [],
            "created_at": "2025-01-01T00:00:00Z", "updated_at": "2025-01-01T00:00:00Z",
            "deleted_at": null
        }))
        .unwrap()
    }

    fn new_order(items: Vec<NewOrderItem>) -> NewOrder {
        NewOrder {
            customer_id: Some(CustomerId(1)),
            currency: "USD".into(),
            items,
            billing_address_id: None,
            shipping_address_id: None,
            shipping_method: None,
            shipping_amount: 5.0,
            discount_amount: 2.5,
            tax_amount: 1.2,
            notes: None,
        }
    }

    pub(crate) fn order(id: i64, status: OrderStatus, total: f64) -> Order {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        let (mut order, _) = Order::place(
            OrderId(id),
            None,
            NewOrder {
                shipping_amount: 0.0,
                discount_amount: 0.0,
                tax_amount: 0.0,
                ..new_order(vec![NewOrderItem {
                    product_id: ProductId(1),
                    variant_id: None,
                    quantity: 1,
                    unit_price: Some(total),
                }])
            },
            &[product(1, "Widget", total)],
            &[],
            || OrderItemId(id * 10),
            now,
        )
        .unwrap();
        order.status = status;
        order
    }

    #[test]
    fn placing_prices_lines_and_sums_totals() {
        let mut next = 0;
        let (order, items) = Order::place(
            OrderId(42),
            Some(7),
            new_order(vec![
                NewOrderItem { product_id: ProductId(1), variant_id: None, quantity: 3, unit_price: None },
                NewOrderItem { product_id: ProductId(2), variant_id: None, quantity: 1, unit_price: Some(0.1) },
            ]),
            &[product(1, "Widget", 19.99), product(2, "Bolt", 3.0)],
            &[],
            || {
                next += 1;
                OrderItemId(next)
            },
            Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap(),
        )
        .unwrap();

        assert_eq!(order.order_number, "ORD-20250601-000042");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].total, 59.97);
        assert_eq!(items[1].id, OrderItemId(2));
        assert_eq!(order.subtotal, 60.07);
        assert_eq!(order.total, 63.77);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn unknown_products_are_not_found() {
        let err = Order::place(
            OrderId(1),
            None,
            new_order(vec![NewOrderItem { product_id: ProductId(9), variant_id: None, quantity: 1, unit_price: None }]),
            &[],
            &[],
            || OrderItemId(1),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::not_found("product 9"));
    }

    #[test]
    fn discount_cannot_exceed_subtotal() {
        assert!(OrderTotals::compute("USD", [(1.0, 1)], 1.01, 0.0, 0.0).is_err());
    }

    #[test]
    fn shipping_stamps_and_records_tracking() {
        let mut o = order(1, OrderStatus::Processing, 10.0);
        let update = OrderStatusUpdate {
            status: OrderStatus::Shipped,
            comment: None,
            tracking_number: Some("1Z999".into()),
            notify_customer: true,
        };
        let change = o.change_status(update, Utc::now()).unwrap();
        assert_eq!(change.from, OrderStatus::Processing);
        assert!(o.shipped_at.is_some());
        assert_eq!(o.tracking_number.as_deref(), Some("1Z999"));
    }

    #[test]
    fn cancelled_orders_are_final() {
        let mut o = order(1, OrderStatus::Cancelled, 10.0);
        let update = OrderStatusUpdate {
            status: OrderStatus::Processing,
            comment: None,
            tracking_number: None,
            notify_customer: false,
        };
        assert!(o.change_status(update, Utc::now()).is_err());
        assert_eq!(o.status, OrderStatus::Cancelled);
    }

    proptest! {
        #[test]
        fn total_is_sum_of_parts(
            lines in proptest::collection::vec((0u32..100_000, 1u32..20), 1..10),
            tax in 0u32..10_000,
            shipping in 0u32..10_000,
        ) {
            let priced = lines.iter().map(|(cents, qty)| (f64::from(*cents) / 100.0, *qty));
            let t = OrderTotals::compute("USD", priced, 0.0, f64::from(tax) / 100.0, f64::from(shipping) / 100.0).unwrap();
            let expected: i64 = lines.iter().map(|(c, q)| i64::from(*c) * i64::from(*q)).sum::<i64>()
                + i64::from(tax) + i64::from(shipping);
            prop_assert_eq!(t.total.amount_minor, expected);
        }
    }
}
