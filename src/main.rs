// ============================================================================
// userguard demo binary
// ============================================================================
//
// Wires the consistency pipeline over the in-memory collaborators and
// drives one create, contact-change and reconcile cycle. Process wiring
// for a real deployment (storage engine, broker, durable workflow
// engine) replaces the memory components behind the same traits.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use userguard::{
    DomainEventTransport, EventConsumer, LocalWorkflowEngine, LockingExecutor, MemoryBroker,
    MemoryLockManager, MemoryStore, OutboxConfig, OutboxRelay, ServiceConfig, UserFacade,
    UserInput, UserServiceActivities, UserStatus,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Poll the outbox more eagerly than the service default so the
    // demo cycle finishes quickly.
    let config = ServiceConfig::new().with_outbox(OutboxConfig {
        poll_interval_ms: 50,
        batch_size: 100,
    });

    let store = Arc::new(MemoryStore::new());
    let locks = Arc::new(MemoryLockManager::new());
    let executor = LockingExecutor::new(Arc::clone(&store), locks, config.lock.clone());
    let facade = Arc::new(UserFacade::new(executor));

    let activities = Arc::new(UserServiceActivities::new(Arc::clone(&facade)));
    let engine = Arc::new(LocalWorkflowEngine::new(activities, config.workflow.clone()));

    let broker = Arc::new(MemoryBroker::new(100));
    let consumer = Arc::new(EventConsumer::new(engine));
    let consumer_task = broker
        .spawn_consumer(consumer)
        .await
        .context("attach consumer")?;

    let relay = Arc::new(OutboxRelay::new(
        Arc::clone(&store) as Arc<dyn userguard::outbox::OutboxReader>,
        Arc::new(DomainEventTransport::new(broker)),
        config.outbox.clone(),
    ));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let relay_task = {
        let relay = Arc::clone(&relay);
        tokio::spawn(async move { relay.run(shutdown_rx).await })
    };

    let user_id = facade
        .store_user(UserInput {
            user_id: None,
            login: "alice".to_string(),
            email: None,
            telegram: Some("@alice".to_string()),
        })
        .await?;
    info!(%user_id, "user stored");

    wait_for_status(&facade, user_id, UserStatus::Active).await?;
    info!(%user_id, "saga reconciled status to Active");

    facade
        .store_user(UserInput {
            user_id: Some(user_id),
            login: "alice".to_string(),
            email: None,
            telegram: None,
        })
        .await?;
    info!(%user_id, "telegram cleared");

    wait_for_status(&facade, user_id, UserStatus::Blocked).await?;
    info!(%user_id, "saga reconciled status to Blocked");

    shutdown_tx.send(true).ok();
    relay_task.await.ok();
    drop(relay);
    drop(facade);
    consumer_task.abort();
    Ok(())
}

async fn wait_for_status(
    facade: &UserFacade<MemoryStore>,
    user_id: uuid::Uuid,
    expected: UserStatus,
) -> anyhow::Result<()> {
    for _ in 0..100 {
        let user = facade.find_user(user_id).await?;
        if user.status == expected {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    anyhow::bail!("status never reached {expected:?}")
}
