pub mod dashboard;
pub mod http;
pub mod metrics;
pub mod models;
pub mod scheduler;
pub mod settings;
pub mod sources;
pub mod store;

use anyhow::{Context, Result};
use log::{info, warn};

use http::ReqwestHttpClient;
use scheduler::{Aggregator, CyclePlan, SchedulerController};
use settings::Settings;
use sources::Sources;
use store::SnapshotStore;

pub async fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    info!("Commute board starting up...");

    let settings = Settings::load()?;
    let http = ReqwestHttpClient::new().context("failed to build HTTP client")?;
    let store = SnapshotStore::new();

    let aggregator = Aggregator::new(
        Sources::from_settings(&settings, http),
        CyclePlan::from_settings(&settings),
        store.clone(),
    );

    // The first cycle finishes before the dashboard accepts connections, so
    // no viewer ever sees placeholder values as measurements.
    let mut scheduler = SchedulerController::new();
    scheduler
        .start(aggregator, settings.update_interval())
        .await?;

    let served = dashboard::serve(store, settings.bind_addr, settings.update_interval(), async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for shutdown signal: {err}");
            std::future::pending::<()>().await;
        }
    })
    .await;

    info!("shutting down aggregation");
    scheduler.stop().await?;
    served
}
