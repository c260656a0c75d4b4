use std::sync::Arc;

use async_trait::async_trait;
use tracing::{Level, event};

use crate::core::Result;
use crate::transport::{Delivery, EventProducer};
use crate::wire;

/// Target of the outbox relay: publishes one serialized event.
#[async_trait]
pub trait OutboxTransport: Send + Sync {
    async fn handle_event(
        &self,
        correlation_id: &str,
        event_type: &str,
        payload: &str,
    ) -> Result<()>;
}

/// Publishes domain events to the message transport under the
/// `user.<event_type>` routing key with the JSON content type.
pub struct DomainEventTransport {
    producer: Arc<dyn EventProducer>,
}

impl DomainEventTransport {
    pub fn new(producer: Arc<dyn EventProducer>) -> Self {
        Self { producer }
    }
}

#[async_trait]
impl OutboxTransport for DomainEventTransport {
    async fn handle_event(
        &self,
        correlation_id: &str,
        event_type: &str,
        payload: &str,
    ) -> Result<()> {
        let delivery = Delivery {
            routing_key: format!("{}{}", wire::ROUTING_KEY_PREFIX, event_type),
            correlation_id: correlation_id.to_string(),
            content_type: wire::CONTENT_TYPE.to_string(),
            kind: event_type.to_string(),
            body: payload.as_bytes().to_vec(),
        };

        match self.producer.publish(delivery).await {
            Ok(()) => {
                event!(
                    Level::INFO,
                    correlation_id,
                    event_type,
                    "successfully published event"
                );
                Ok(())
            }
            Err(err) => {
                event!(
                    Level::ERROR,
                    correlation_id,
                    event_type,
                    error = %err,
                    "failed to publish event"
                );
                Err(err)
            }
        }
    }
}
