use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::interval;
use tracing::{Level, event};

use crate::core::OutboxConfig;
use crate::outbox::record::OutboxReader;
use crate::outbox::transport::OutboxTransport;
use crate::wire;

/// Relays committed outbox records to the message transport,
/// at-least-once.
///
/// Records stay pending until the transport acknowledges the publish;
/// a failed publish is retried on the next poll, indefinitely. Duplicate
/// delivery is possible and downstream consumers must be idempotent.
pub struct OutboxRelay {
    reader: Arc<dyn OutboxReader>,
    transport: Arc<dyn OutboxTransport>,
    config: OutboxConfig,
}

impl OutboxRelay {
    pub fn new(
        reader: Arc<dyn OutboxReader>,
        transport: Arc<dyn OutboxTransport>,
        config: OutboxConfig,
    ) -> Self {
        Self {
            reader,
            transport,
            config,
        }
    }

    /// Poll loop. Runs until `shutdown` flips to true.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut tick = interval(self.config.poll_interval());
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.drain_once().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        event!(Level::INFO, "outbox relay stopping");
                        return;
                    }
                }
            }
        }
    }

    /// One poll: publish pending records in watermark order, marking
    /// each dispatched only after the transport acknowledged it. Stops
    /// the batch at the first failure to preserve per-aggregate order;
    /// the next poll retries from the failed record.
    pub async fn drain_once(&self) -> usize {
        let records = match self
            .reader
            .load_pending(wire::TRANSPORT_NAME, self.config.batch_size)
            .await
        {
            Ok(records) => records,
            Err(err) => {
                event!(Level::WARN, error = %err, "failed to load pending outbox records");
                return 0;
            }
        };

        let mut dispatched = 0;
        for record in records {
            let publish = self
                .transport
                .handle_event(
                    &record.correlation_id(),
                    &record.event_type,
                    &record.payload,
                )
                .await;
            if let Err(err) = publish {
                event!(
                    Level::WARN,
                    record_id = %record.record_id,
                    error = %err,
                    "publish failed, record stays pending"
                );
                break;
            }

            if let Err(err) = self.reader.mark_dispatched(record.record_id).await {
                // The publish already happened; the record will be
                // republished next poll. At-least-once holds.
                event!(
                    Level::WARN,
                    record_id = %record.record_id,
                    error = %err,
                    "failed to mark record dispatched"
                );
                break;
            }
            dispatched += 1;
        }
        dispatched
    }
}
