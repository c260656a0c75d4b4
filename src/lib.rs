// ============================================================================
// userguard Library
// ============================================================================
//
// Keeps one user aggregate, its published domain events, and a derived
// activity status consistent despite concurrent writers and unreliable
// message delivery: named distributed locks serialize conflicting
// mutations, a transactional outbox guarantees events are published only
// if the mutation they describe committed, and a status-reconciliation
// saga re-derives the user's status from contact-info changes delivered
// at-least-once.

pub mod core;
pub mod domain;
pub mod facade;
pub mod outbox;
pub mod storage;
pub mod transport;
pub mod uow;
pub mod wire;
pub mod workflow;

// Re-export main types for convenience
pub use crate::core::{
    LockConfig, OutboxConfig, Result, RetryPolicy, ServiceConfig, ServiceError, WorkflowConfig,
};
pub use crate::domain::{
    FieldChange, FindSpec, User, UserDomainService, UserEvent, UserRepository, UserStatus,
};
pub use crate::facade::{UserFacade, UserInput, UserSnapshot};
pub use crate::outbox::{DomainEventTransport, OutboxRecord, OutboxRelay, OutboxStatus};
pub use crate::storage::{MemoryLockManager, MemoryStore};
pub use crate::transport::{Delivery, EventConsumer, EventProducer, MemoryBroker};
pub use crate::uow::{LockManager, LockName, LockingExecutor, Store, TxnScope};
pub use crate::workflow::{LocalWorkflowEngine, UserServiceActivities, WorkflowService};
