use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{Level, event};
use uuid::Uuid;

use crate::core::{Result, RetryPolicy, ServiceError};
use crate::domain::model::UserStatus;
use crate::facade::{UserFacade, UserSnapshot};
use crate::uow::store::Store;

/// Remote calls available to the saga, injected through the run rather
/// than reached through shared mutable state.
pub struct UserServiceActivities<S: Store> {
    facade: Arc<UserFacade<S>>,
}

impl<S: Store> UserServiceActivities<S> {
    pub fn new(facade: Arc<UserFacade<S>>) -> Self {
        Self { facade }
    }

    pub async fn find_user(&self, user_id: Uuid) -> Result<UserSnapshot> {
        self.facade.find_user(user_id).await
    }

    pub async fn set_user_status(&self, user_id: Uuid, status: UserStatus) -> Result<()> {
        self.facade.set_user_status(user_id, status).await
    }
}

/// Engine-side activity wrapper: bounds each call by a start-to-close
/// timeout and retries transient failures with exponential backoff.
/// Non-retryable errors (`NotFound`, conflicts, codec) surface on the
/// first attempt.
pub struct ActivityExecutor {
    activity_timeout: Duration,
    retry: RetryPolicy,
}

impl ActivityExecutor {
    pub fn new(activity_timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            activity_timeout,
            retry,
        }
    }

    pub async fn execute<T, F, Fut>(&self, activity: &str, f: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut last_err = ServiceError::Transient(format!("activity {activity} never ran"));

        for attempt in 1..=max_attempts {
            match timeout(self.activity_timeout, f()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(err)) if err.is_retryable() => {
                    event!(
                        Level::WARN,
                        activity,
                        attempt,
                        error = %err,
                        "activity failed, will retry"
                    );
                    last_err = err;
                }
                Ok(Err(err)) => return Err(err),
                Err(_) => {
                    event!(Level::WARN, activity, attempt, "activity timed out");
                    last_err =
                        ServiceError::Transient(format!("activity {activity} timed out"));
                }
            }

            if attempt < max_attempts {
                sleep(self.retry.backoff(attempt)).await;
            }
        }

        event!(Level::ERROR, activity, error = %last_err, "activity retries exhausted");
        Err(last_err)
    }
}
