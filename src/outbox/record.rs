use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::Result;

/// Dispatch status of an outbox record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboxStatus {
    /// Waiting to be relayed to the message transport.
    Pending,
    /// Acknowledged by the transport.
    Dispatched,
}

/// A store-and-forward record of one domain event, appended in the same
/// transaction as the aggregate write that produced it.
///
/// `record_id` doubles as the correlation id on the wire: it is
/// generated once at append time and reused verbatim on every relay
/// retry, so duplicate publishes carry the same saga key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxRecord {
    pub record_id: Uuid,
    pub transport_name: String,
    pub event_type: String,
    pub payload: String,
    pub status: OutboxStatus,
    /// Write-time watermark; the relay publishes in this order.
    pub created_at: DateTime<Utc>,
}

impl OutboxRecord {
    pub fn new(
        transport_name: impl Into<String>,
        event_type: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            record_id: Uuid::new_v4(),
            transport_name: transport_name.into(),
            event_type: event_type.into(),
            payload: payload.into(),
            status: OutboxStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn correlation_id(&self) -> String {
        self.record_id.to_string()
    }
}

/// Transaction-scoped append: the record commits atomically with the
/// aggregate write of the enclosing unit of work.
#[async_trait]
pub trait OutboxAppend: Send + Sync {
    async fn append(&self, record: OutboxRecord) -> Result<()>;
}

/// Relay-side access to committed outbox records.
#[async_trait]
pub trait OutboxReader: Send + Sync {
    /// Pending records for one transport, oldest first.
    async fn load_pending(&self, transport_name: &str, limit: usize) -> Result<Vec<OutboxRecord>>;

    /// Mark a record dispatched after the transport acknowledged it.
    async fn mark_dispatched(&self, record_id: Uuid) -> Result<()>;
}
