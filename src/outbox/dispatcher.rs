use async_trait::async_trait;
use tracing::{Level, event};

use crate::core::Result;
use crate::domain::event::UserEvent;
use crate::domain::model::EventDispatcher;
use crate::outbox::record::{OutboxAppend, OutboxRecord};
use crate::wire;

/// Event sink handed to the domain service inside a unit of work.
///
/// Serializes each event to its wire form and appends it through the
/// transaction scope, so the event commits if and only if the mutation
/// it describes commits. Publishing happens later, in the relay.
pub struct OutboxEventDispatcher<'a> {
    outbox: &'a dyn OutboxAppend,
}

impl<'a> OutboxEventDispatcher<'a> {
    pub fn new(outbox: &'a dyn OutboxAppend) -> Self {
        Self { outbox }
    }
}

#[async_trait]
impl EventDispatcher for OutboxEventDispatcher<'_> {
    async fn dispatch(&self, event: UserEvent) -> Result<()> {
        let event_type = event.event_type();
        let payload = wire::encode(&event)?;
        let record = OutboxRecord::new(wire::TRANSPORT_NAME, event_type, payload);
        event!(
            Level::DEBUG,
            record_id = %record.record_id,
            event_type,
            "domain event staged in outbox"
        );
        self.outbox.append(record).await
    }
}
