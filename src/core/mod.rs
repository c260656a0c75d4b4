pub mod config;
pub mod error;

pub use config::{LockConfig, OutboxConfig, RetryPolicy, ServiceConfig, WorkflowConfig};
pub use error::{Result, ServiceError};
