//! # smarthomed: smarthome daemon
//!
//! Composition root that wires storage and the engines together and runs the
//! background scheduler until interrupted.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Initialize logging
//! - Initialize the `SQLite` connection pool and run migrations
//! - Seed an empty store and load the house
//! - Apply configured rules and register configured schedules
//! - Run the scheduler loop; on Ctrl-C (or a failing signal listener) cancel
//!   it, join it and save the house
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;

use std::future::Future;
use std::sync::Arc;

use smarthome_adapter_storage_sqlite_sqlx::{Config as StorageConfig, SqliteHomeRepository};
use smarthome_app::house::House;
use smarthome_app::rule_engine::RuleEngine;
use smarthome_app::scheduler::Scheduler;
use smarthome_app::services::HouseService;
use smarthome_domain::id::DeviceId;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    init_logging(&config.logging.filter);

    // Database
    let db = StorageConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let service = HouseService::new(SqliteHomeRepository::new(db.pool().clone()));

    // House
    if service.seed_if_empty(config.room_seeds()).await? {
        tracing::info!(rooms = config.rooms.len(), "empty store seeded from config");
    }
    let house = Arc::new(service.load_house().await?);

    // Rules
    let engine = build_rule_engine(&config);
    let applied = engine.apply_rules_to_house(&house);
    tracing::info!(rules = engine.rules().len(), applied, "rules applied");

    // Scheduler
    let scheduler = Arc::new(Scheduler::new());
    register_schedules(&config, &house, &scheduler);
    let cancel = CancellationToken::new();
    let task = scheduler.spawn(config.poll_interval(), cancel.clone());

    stop_on(tokio::signal::ctrl_c(), &cancel, task).await?;

    service.save_house(&house).await?;
    Ok(())
}

/// Wait for `signal`, then cancel the scheduler and join its task.
/// A failing signal listener stops the daemon the same way.
async fn stop_on(
    signal: impl Future<Output = std::io::Result<()>>,
    cancel: &CancellationToken,
    task: JoinHandle<()>,
) -> Result<(), JoinError> {
    match signal.await {
        Ok(()) => tracing::info!("shutdown requested"),
        Err(err) => tracing::error!(error = %err, "failed to listen for shutdown signal, stopping"),
    }
    cancel.cancel();
    task.await
}

fn init_logging(filter: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn build_rule_engine(config: &Config) -> RuleEngine {
    let mut engine = RuleEngine::new();
    for rule in &config.rules {
        engine.add_rule(*rule);
    }
    for env in &config.environment {
        if let Some(temperature) = env.temperature {
            engine.set_room_temperature(&env.room, temperature);
        }
        if let Some(motion) = env.motion {
            engine.set_room_motion(&env.room, motion);
        }
    }
    engine
}

/// Register every configured schedule whose room and device resolve.
/// Unresolvable entries are logged and skipped.
fn register_schedules(config: &Config, house: &House, scheduler: &Scheduler) {
    for entry in &config.schedules {
        let device_id = DeviceId::new(entry.device_id);
        let Some(device) = house.room(&entry.room).and_then(|room| room.device(device_id)) else {
            tracing::warn!(room = %entry.room, device_id = %device_id, "scheduled device not found, skipped");
            continue;
        };
        let target = match entry.target() {
            Ok(target) => target,
            Err(err) => {
                tracing::warn!(room = %entry.room, device_id = %device_id, error = %err, "schedule rejected");
                continue;
            }
        };
        if let Err(err) = scheduler.schedule_at(device, target, &entry.at, entry.repeat) {
            tracing::warn!(room = %entry.room, device_id = %device_id, error = %err, "schedule rejected");
        }
    }
}
