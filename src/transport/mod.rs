pub mod consumer;
pub mod memory;

pub use consumer::EventConsumer;
pub use memory::MemoryBroker;

use async_trait::async_trait;

use crate::core::Result;

/// One message as carried by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub routing_key: String,
    /// Saga instance key; stable across redeliveries of the same
    /// logical event.
    pub correlation_id: String,
    pub content_type: String,
    /// Event type tag; selects the wire schema.
    pub kind: String,
    pub body: Vec<u8>,
}

/// Producer half of the message transport collaborator. Publish is
/// synchronous-ack: an `Ok` means the transport owns the message.
#[async_trait]
pub trait EventProducer: Send + Sync {
    async fn publish(&self, delivery: Delivery) -> Result<()>;
}
