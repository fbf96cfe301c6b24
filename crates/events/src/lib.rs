//! Domain events and their fan-out.
//!
//! Domain state changes (a certification was revoked, an order shipped) are
//! described by [`Event`] values. Those that clients watch live are wrapped in
//! a [`BroadcastEnvelope`] and published on an [`EventBus`].

pub mod broadcast;
pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;
pub mod tenant;

pub use broadcast::{BroadcastEvent, Channel};
pub use bus::{EventBus, Subscription};
pub use envelope::BroadcastEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use tenant::TenantScoped;
