use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for named distributed locks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// Lease time-to-live in milliseconds. A crashed holder cannot wedge
    /// an aggregate for longer than this.
    pub ttl_ms: u64,
    /// Maximum time in milliseconds a caller waits for a contended lock
    /// before the whole unit of work fails with `LockUnavailable`.
    pub acquire_timeout_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 60_000,
            acquire_timeout_ms: 60_000,
        }
    }
}

impl LockConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

/// Configuration for the outbox relay loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxConfig {
    /// Interval in milliseconds between polls for pending records.
    pub poll_interval_ms: u64,
    /// Maximum number of records loaded per poll.
    pub batch_size: usize,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 200,
            batch_size: 100,
        }
    }
}

impl OutboxConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Configuration for retry behavior on transient activity failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first one).
    pub max_attempts: u32,
    /// Initial backoff duration in milliseconds.
    pub initial_backoff_ms: u64,
    /// Maximum backoff duration in milliseconds.
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff_ms: 50,
            max_backoff_ms: 5_000,
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff for the given attempt (1-based), capped at
    /// `max_backoff_ms`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(1u64 << exp)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }
}

/// Configuration for the durable-workflow engine hosting the
/// status-reconciliation saga.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Task queue the saga definitions are keyed by.
    pub task_queue: String,
    /// Per-activity start-to-close timeout in milliseconds.
    pub activity_timeout_ms: u64,
    /// Retry policy applied to transient activity failures.
    pub retry: RetryPolicy,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            task_queue: "userguard_task_queue".to_string(),
            activity_timeout_ms: 60_000,
            retry: RetryPolicy::default(),
        }
    }
}

impl WorkflowConfig {
    pub fn activity_timeout(&self) -> Duration {
        Duration::from_millis(self.activity_timeout_ms)
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub lock: LockConfig,
    pub outbox: OutboxConfig,
    pub workflow: WorkflowConfig,
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the lock configuration.
    pub fn with_lock(mut self, lock: LockConfig) -> Self {
        self.lock = lock;
        self
    }

    /// Set the outbox relay configuration.
    pub fn with_outbox(mut self, outbox: OutboxConfig) -> Self {
        self.outbox = outbox;
        self
    }

    /// Set the workflow engine configuration.
    pub fn with_workflow(mut self, workflow: WorkflowConfig) -> Self {
        self.workflow = workflow;
        self
    }
}
