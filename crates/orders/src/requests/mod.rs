//! Form requests for order placement and fulfilment.

mod fulfilment;
mod order;

pub use fulfilment::{StoreShipmentRequest, StoreTransactionRequest};
pub use order::{SearchOrderRequest, StoreOrderRequest, UpdateOrderStatusRequest};

/// Largest quantity accepted on a single order or shipment line.
pub const MAX_LINE_QUANTITY: f64 = 10_000.0;
