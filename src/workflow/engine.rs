use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{Instrument, Level, event, info_span};

use crate::core::{Result, WorkflowConfig};
use crate::domain::event::UserUpdated;
use crate::uow::store::Store;
use crate::workflow::activity::{ActivityExecutor, UserServiceActivities};
use crate::workflow::user_updated::run_user_updated;

/// Trigger contract of the durable-workflow engine collaborator.
///
/// The workflow id is the delivery's correlation id: redelivery of the
/// same logical event must resume the existing run, not start a
/// duplicate.
#[async_trait]
pub trait WorkflowService: Send + Sync {
    async fn start_user_updated(&self, workflow_id: &str, event: UserUpdated) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Running,
    Completed,
    Failed,
}

/// In-process workflow engine: runs the saga inline, keyed by workflow
/// id.
///
/// Starting an id that is running or already completed is a no-op.
/// Failed runs may be started again; a redelivered trigger acts as the
/// retry. The real deployment swaps in a durable engine behind the same
/// trait; the saga logic is identical.
///
/// The run map is unbounded: completed ids must stay resident for the
/// duplicate-delivery check, so this in-process engine keeps them for
/// the process lifetime. A durable engine persists run history instead.
pub struct LocalWorkflowEngine<S: Store> {
    activities: Arc<UserServiceActivities<S>>,
    config: WorkflowConfig,
    runs: RwLock<HashMap<String, RunState>>,
}

impl<S: Store> LocalWorkflowEngine<S> {
    pub fn new(activities: Arc<UserServiceActivities<S>>, config: WorkflowConfig) -> Self {
        Self {
            activities,
            config,
            runs: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<S: Store> WorkflowService for LocalWorkflowEngine<S> {
    async fn start_user_updated(&self, workflow_id: &str, event: UserUpdated) -> Result<()> {
        {
            let mut runs = self.runs.write().await;
            match runs.get(workflow_id) {
                Some(RunState::Running) | Some(RunState::Completed) => {
                    event!(
                        Level::INFO,
                        workflow_id,
                        "workflow already started, resuming existing run"
                    );
                    return Ok(());
                }
                Some(RunState::Failed) | None => {
                    runs.insert(workflow_id.to_string(), RunState::Running);
                }
            }
        }

        let span = info_span!(
            "workflow.user_updated",
            workflow_id,
            task_queue = %self.config.task_queue,
        );
        let executor =
            ActivityExecutor::new(self.config.activity_timeout(), self.config.retry.clone());
        let result = run_user_updated(&self.activities, &executor, &event)
            .instrument(span)
            .await;

        let mut runs = self.runs.write().await;
        match &result {
            Ok(()) => {
                runs.insert(workflow_id.to_string(), RunState::Completed);
            }
            Err(err) => {
                event!(Level::ERROR, workflow_id, error = %err, "workflow run failed");
                runs.insert(workflow_id.to_string(), RunState::Failed);
            }
        }
        result
    }
}
