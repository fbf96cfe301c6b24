//! Shipments and the order lines they carry.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradeerp_core::{record_id, string_enum, Entity, Lifecycle, Timestamps};

use crate::{OrderId, OrderItem, OrderItemId};

record_id!(ShipmentId);
record_id!(ShipmentItemId);

string_enum! {
    pub enum ShipmentStatus {
        Pending => "pending",
        Shipped => "shipped",
        InTransit => "in_transit",
        Delivered => "delivered",
        Returned => "returned",
    }
}

impl Lifecycle for ShipmentStatus {
    fn allowed_transitions(&self) -> &'static [Self] {
        use ShipmentStatus::*;
        match self {
            Pending => &[Shipped],
            Shipped => &[InTransit, Delivered, Returned],
            InTransit => &[Delivered, Returned],
            Delivered => &[Returned],
            Returned => &[],
        }
    }

    fn as_str(&self) -> &'static str {
        ShipmentStatus::as_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub order_id: OrderId,
    pub carrier: String,
    pub tracking_number: Option<String>,
    pub status: ShipmentStatus,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentItem {
    pub id: ShipmentItemId,
    pub shipment_id: ShipmentId,
    pub order_item_id: OrderItemId,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewShipmentItem {
    pub order_item_id: OrderItemId,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewShipment {
    pub carrier: String,
    pub tracking_number: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub items: Vec<NewShipmentItem>,
}

impl Shipment {
    /// A shipment with a ship date starts out shipped.
    pub fn create(
        id: ShipmentId,
        order_id: OrderId,
        new: NewShipment,
        mut next_item_id: impl FnMut() -> ShipmentItemId,
        now: DateTime<Utc>,
    ) -> (Self, Vec<ShipmentItem>) {
        let items = new
            .items
            .iter()
            .map(|line| ShipmentItem {
                id: next_item_id(),
                shipment_id: id,
                order_item_id: line.order_item_id,
                quantity: line.quantity,
            })
            .collect();
        let status = if new.shipped_at.is_some() {
            ShipmentStatus::Shipped
        } else {
            ShipmentStatus::Pending
        };
        let shipment = Self {
            id,
            order_id,
            carrier: new.carrier,
            tracking_number: new.tracking_number,
            status,
            shipped_at: new.shipped_at,
            delivered_at: None,
            notes: new.notes,
            timestamps: Timestamps::new(now),
        };
        (shipment, items)
    }
}

impl Entity for Shipment {
    type Id = ShipmentId;

    fn id(&self) -> &ShipmentId {
        &self.id
    }
}

/// Quantity of each order line not yet covered by a shipment.
pub fn unshipped_quantities(items: &[OrderItem], shipped: &[ShipmentItem]) -> HashMap<OrderItemId, u32> {
    let mut remaining: HashMap<OrderItemId, u32> =
        items.iter().map(|i| (i.id, i.quantity)).collect();
    for line in shipped {
        if let Some(left) = remaining.get_mut(&line.order_item_id) {
            *left = left.saturating_sub(line.quantity);
        }
    }
    remaining
}
