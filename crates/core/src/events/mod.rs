//! Domain events module.
//!
//! Provides domain event types and the sink trait for emitting events
//! as polls complete. Runtime adapters implement the sink to translate
//! domain events into platform-specific actions.

mod domain_event;
mod sink;

pub use domain_event::*;
pub use sink::*;
