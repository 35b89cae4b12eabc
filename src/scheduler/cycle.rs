use std::sync::Arc;

use chrono::Utc;
use log::info;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::http::HttpClient;
use crate::models::{DerivedCommuteMetric, Snapshot};
use crate::settings::Settings;
use crate::sources::Sources;
use crate::store::SnapshotStore;

use super::SchedulerStatus;

/// The fixed inputs of every cycle.
#[derive(Debug, Clone)]
pub struct CyclePlan {
    pub home_address: String,
    pub work_address: String,
    pub weather_lat: f64,
    pub weather_long: f64,
    /// Usual commute time; 0 disables severity coloring.
    pub baseline_minutes: u32,
}

impl CyclePlan {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            home_address: settings.home_address.clone(),
            work_address: settings.work_address.clone(),
            weather_lat: settings.weather_lat,
            weather_long: settings.weather_long,
            baseline_minutes: settings.standard_commute_mins,
        }
    }
}

/// Runs aggregation cycles and publishes their snapshots. Owned by exactly
/// one task; `run_cycle` takes `&mut self` so cycles cannot overlap.
pub struct Aggregator<C> {
    sources: Sources<C>,
    plan: CyclePlan,
    store: SnapshotStore,
    status: watch::Sender<SchedulerStatus>,
}

impl<C: HttpClient> Aggregator<C> {
    pub fn new(sources: Sources<C>, plan: CyclePlan, store: SnapshotStore) -> Self {
        let (status, _) = watch::channel(SchedulerStatus::default());
        Self {
            sources,
            plan,
            store,
            status,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SchedulerStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> SchedulerStatus {
        *self.status.borrow()
    }

    /// Fetch every source once, derive metrics against the previously
    /// published snapshot and publish the result. Adapter failures only
    /// degrade their own field; the cycle itself always publishes.
    pub async fn run_cycle(&mut self) -> Arc<Snapshot> {
        let is_first_cycle = self.status.borrow().is_first_cycle();
        let cycle = self.status.borrow().cycles_completed + 1;
        self.status.send_modify(SchedulerStatus::begin_cycle);

        let started = Instant::now();
        info!("aggregation cycle {cycle} starting");

        let previous = self.store.read();
        let plan = &self.plan;

        let to_work = self
            .sources
            .route
            .estimate(&plan.home_address, &plan.work_address)
            .await;
        let to_home = self
            .sources
            .route
            .estimate(&plan.work_address, &plan.home_address)
            .await;
        let weather = self
            .sources
            .weather
            .fetch(plan.weather_lat, plan.weather_long)
            .await;
        let alerts = self.sources.alerts.fetch().await;
        let now_playing = self.sources.now_playing.fetch().await;

        let snapshot = Snapshot {
            to_work: DerivedCommuteMetric::derive(
                to_work,
                previous.to_work.value.duration_minutes,
                is_first_cycle,
                plan.baseline_minutes,
            ),
            to_home: DerivedCommuteMetric::derive(
                to_home,
                previous.to_home.value.duration_minutes,
                is_first_cycle,
                plan.baseline_minutes,
            ),
            weather,
            alerts,
            now_playing,
            last_updated: Utc::now(),
            is_initial: is_first_cycle,
            cycle,
        };

        self.store.publish(snapshot);
        self.status.send_modify(SchedulerStatus::finish_cycle);

        info!(
            "aggregation cycle {cycle} published in {}ms (to_work={}min, to_home={}min)",
            started.elapsed().as_millis(),
            to_work.duration_minutes,
            to_home.duration_minutes
        );

        self.store.read()
    }
}
