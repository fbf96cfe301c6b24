//! `tradeerp-orders`: orders, their status history, shipments and payment
//! transactions.
//!
//! Totals are summed in minor units through [`tradeerp_core::Money`] and
//! stored as two-decimal amounts.

pub mod order;
pub mod requests;
pub mod shipment;
pub mod transaction;

pub use order::{
    NewOrder, NewOrderItem, Order, OrderId, OrderItem, OrderItemId, OrderSearch, OrderSortField,
    OrderStatus, OrderStatusHistory, OrderStatusHistoryId, OrderStatusUpdate, OrderTotals,
    PaymentStatus,
};
pub use requests::*;
pub use shipment::{
    unshipped_quantities, NewShipment, NewShipmentItem, Shipment, ShipmentId, ShipmentItem,
    ShipmentItemId, ShipmentStatus,
};
pub use transaction::{
    Ledger, NewTransaction, Transaction, TransactionId, TransactionStatus, TransactionType,
};
