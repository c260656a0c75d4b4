use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{Level, event};

use crate::core::{Result, ServiceError};
use crate::transport::consumer::EventConsumer;
use crate::transport::{Delivery, EventProducer};

/// In-memory stand-in for the message broker: a bounded channel whose
/// capacity plays the consumer's prefetch window. Tests and the demo
/// binary use it in place of a real queue.
pub struct MemoryBroker {
    sender: mpsc::Sender<Delivery>,
    receiver: Mutex<Option<mpsc::Receiver<Delivery>>>,
}

impl MemoryBroker {
    pub fn new(prefetch: usize) -> Self {
        let (sender, receiver) = mpsc::channel(prefetch);
        Self {
            sender,
            receiver: Mutex::new(Some(receiver)),
        }
    }

    /// Spawn the consumer loop. Handler errors are logged and the
    /// delivery is dropped; the loop keeps going. Returns the task
    /// handle; the loop ends when all producers are gone.
    pub async fn spawn_consumer(&self, consumer: Arc<EventConsumer>) -> Result<JoinHandle<()>> {
        let mut receiver = self
            .receiver
            .lock()
            .await
            .take()
            .ok_or_else(|| ServiceError::Transient("consumer already attached".to_string()))?;

        Ok(tokio::spawn(async move {
            while let Some(delivery) = receiver.recv().await {
                if let Err(err) = consumer.handle(&delivery).await {
                    event!(
                        Level::ERROR,
                        correlation_id = %delivery.correlation_id,
                        error = %err,
                        "failed to handle message"
                    );
                }
            }
        }))
    }
}

#[async_trait]
impl EventProducer for MemoryBroker {
    async fn publish(&self, delivery: Delivery) -> Result<()> {
        self.sender
            .send(delivery)
            .await
            .map_err(|err| ServiceError::Transient(format!("broker closed: {err}")))
    }
}
