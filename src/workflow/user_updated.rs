use tracing::{Level, event};

use crate::core::Result;
use crate::domain::event::UserUpdated;
use crate::domain::model::UserStatus;
use crate::uow::store::Store;
use crate::workflow::activity::{ActivityExecutor, UserServiceActivities};

/// Status-reconciliation saga, triggered by `user_updated` events.
///
/// Re-derives the user's activity status from their contact info: a
/// user with an email or telegram handle should be `Active`, one with
/// neither should be `Blocked`. Status-only updates are a no-op. A user
/// deleted concurrently (`NotFound` from either activity) means there
/// is nothing to reconcile and the run completes successfully. The logic
/// is idempotent: re-setting an equal status performs no write, so
/// replays after partial failure are safe.
pub async fn run_user_updated<S: Store>(
    activities: &UserServiceActivities<S>,
    executor: &ActivityExecutor,
    event: &UserUpdated,
) -> Result<()> {
    if !event.contact_info_changed() {
        return Ok(());
    }

    let user = match executor
        .execute("find_user", || activities.find_user(event.user_id))
        .await
    {
        Ok(user) => user,
        Err(err) if err.is_not_found() => return Ok(()),
        Err(err) => return Err(err),
    };

    let desired = if user.email.is_some() || user.telegram.is_some() {
        UserStatus::Active
    } else {
        UserStatus::Blocked
    };
    event!(
        Level::DEBUG,
        user_id = %event.user_id,
        desired = desired.as_i32(),
        "reconciling user status"
    );

    match executor
        .execute("set_user_status", || {
            activities.set_user_status(event.user_id, desired)
        })
        .await
    {
        Ok(()) => Ok(()),
        Err(err) if err.is_not_found() => Ok(()),
        Err(err) => Err(err),
    }
}
