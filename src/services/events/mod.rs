//! Event System
//!
//! Typed events and the publish/subscribe bus the engine announces state
//! changes on.

pub mod bus;
pub mod types;

pub use bus::{
    BusMetadata, EventBus, EventFilter, EventHandler, SubscribeOptions, SubscriptionHandle,
};
pub use types::{ChatEvent, EventName};
