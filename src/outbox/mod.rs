pub mod dispatcher;
pub mod record;
pub mod relay;
pub mod transport;

pub use dispatcher::OutboxEventDispatcher;
pub use record::{OutboxAppend, OutboxReader, OutboxRecord, OutboxStatus};
pub use relay::OutboxRelay;
pub use transport::{DomainEventTransport, OutboxTransport};
