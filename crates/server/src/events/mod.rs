//! Live events pushed to connected WebSocket listeners.
//!
//! Producers publish through the one-way [`EventPublisher`] trait. The
//! shipped implementation is the in-process [`BroadcastBus`], which fans each
//! event out to every `/socket` connection. Delivery is fire-and-forget:
//! there is no replay, and a listener that falls behind skips what it missed.

pub mod bus;
pub mod socket;
pub mod types;

pub use bus::{BroadcastBus, EventBusError, EventPublisher};
pub use types::LiveEvent;
