//! Stable wire schema for domain events and the routing constants
//! shared by the outbox relay and the consumer.

pub mod codec;

pub use codec::{decode, encode};

/// Outbox transport the relay drains.
pub const TRANSPORT_NAME: &str = "domain";
/// Routing keys are `user.<event_type>`.
pub const ROUTING_KEY_PREFIX: &str = "user.";
pub const CONTENT_TYPE: &str = "application/json";
