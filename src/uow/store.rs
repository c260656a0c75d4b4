use async_trait::async_trait;

use crate::core::Result;
use crate::domain::model::UserRepository;
use crate::outbox::OutboxAppend;

/// Transactional store: the external storage collaborator.
///
/// `begin` opens a unit of work; everything written through the
/// resulting scope commits atomically or not at all.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    type Txn: TxnScope;

    async fn begin(&self) -> Result<Self::Txn>;
}

/// One open unit of work.
///
/// Repository writes and outbox appends are staged against this scope
/// and become visible to other units of work only on `commit`. A scope
/// dropped without commit leaves no trace.
#[async_trait]
pub trait TxnScope: Send + Sync {
    fn users(&self) -> &dyn UserRepository;

    fn outbox(&self) -> &dyn OutboxAppend;

    async fn commit(&self) -> Result<()>;

    async fn rollback(&self) -> Result<()>;
}
