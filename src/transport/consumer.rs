use std::sync::Arc;

use tracing::{Instrument, Level, event, info_span};

use crate::core::{Result, ServiceError};
use crate::domain::event::{USER_UPDATED, UserEvent};
use crate::wire;
use crate::workflow::WorkflowService;

/// Receives published domain events and triggers the
/// status-reconciliation saga.
///
/// Deliveries with an unexpected content type and event types this
/// consumer does not recognize are acknowledged and skipped, never
/// failed: new event types must be safely ignorable by older consumers.
pub struct EventConsumer {
    workflows: Arc<dyn WorkflowService>,
}

impl EventConsumer {
    pub fn new(workflows: Arc<dyn WorkflowService>) -> Self {
        Self { workflows }
    }

    pub async fn handle(&self, delivery: &crate::transport::Delivery) -> Result<()> {
        let span = info_span!(
            "consumer.handle",
            routing_key = %delivery.routing_key,
            correlation_id = %delivery.correlation_id,
            content_type = %delivery.content_type,
        );
        async {
            if delivery.content_type != wire::CONTENT_TYPE {
                event!(Level::WARN, "invalid content type, skipping");
                return Ok(());
            }

            match delivery.kind.as_str() {
                USER_UPDATED => {
                    let update = match wire::decode(USER_UPDATED, &delivery.body)? {
                        UserEvent::Updated(update) => update,
                        other => {
                            return Err(ServiceError::Codec(format!(
                                "expected user_updated payload, got {}",
                                other.event_type()
                            )));
                        }
                    };
                    self.workflows
                        .start_user_updated(&delivery.correlation_id, update)
                        .await?;
                    event!(Level::INFO, "successfully handled message");
                    Ok(())
                }
                _ => {
                    event!(Level::INFO, kind = %delivery.kind, "unhandled delivery, skipping");
                    Ok(())
                }
            }
        }
        .instrument(span)
        .await
    }
}
