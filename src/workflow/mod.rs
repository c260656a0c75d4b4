pub mod activity;
pub mod engine;
pub mod user_updated;

pub use activity::{ActivityExecutor, UserServiceActivities};
pub use engine::{LocalWorkflowEngine, WorkflowService};
