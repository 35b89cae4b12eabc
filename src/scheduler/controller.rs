use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::http::HttpClient;
use crate::models::Snapshot;

use super::loop_worker::aggregation_loop;
use super::{Aggregator, SchedulerStatus};

/// Owns the background aggregation task.
pub struct SchedulerController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    status: Option<watch::Receiver<SchedulerStatus>>,
}

impl SchedulerController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
            status: None,
        }
    }

    /// Run the initial cycle to completion, then hand the aggregator to a
    /// background task ticking every `period`. Returns the initial snapshot,
    /// which is already published when this resolves.
    pub async fn start<C>(&mut self, mut aggregator: Aggregator<C>, period: Duration) -> Result<Arc<Snapshot>>
    where
        C: HttpClient + 'static,
    {
        if self.handle.is_some() {
            bail!("scheduler already running");
        }

        info!("running initial aggregation cycle");
        let initial = aggregator.run_cycle().await;

        let cancel_token = CancellationToken::new();
        self.status = Some(aggregator.subscribe());
        let handle = tokio::spawn(aggregation_loop(aggregator, period, cancel_token.clone()));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        info!("aggregation scheduled every {}s", period.as_secs());
        Ok(initial)
    }

    /// Latest status reported by the running loop.
    pub fn status(&self) -> Option<SchedulerStatus> {
        self.status.as_ref().map(|rx| *rx.borrow())
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stop after the cycle in flight, if any, completes.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("aggregation loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Default for SchedulerController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Trend;
    use crate::scheduler::cycle::tests::{aggregator, scripted};
    use crate::scheduler::SchedulerState;

    const PERIOD: Duration = Duration::from_secs(300);

    #[tokio::test(start_paused = true)]
    async fn test_start_publishes_before_returning() {
        let (aggregator, store) = aggregator(scripted(&[50, 40]));
        let mut controller = SchedulerController::new();
        assert!(store.read().is_placeholder());

        let initial = controller.start(aggregator, PERIOD).await.unwrap();
        assert!(initial.is_initial);
        assert_eq!(store.read().cycle, 1);
        assert!(controller.is_running());

        controller.stop().await.unwrap();
        assert!(!controller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_runs_on_interval() {
        let (aggregator, store) = aggregator(scripted(&[50, 40, 55, 35, 60, 30]));
        let mut controller = SchedulerController::new();
        controller.start(aggregator, PERIOD).await.unwrap();

        tokio::time::sleep(PERIOD / 2).await;
        assert_eq!(store.read().cycle, 1);

        tokio::time::sleep(PERIOD).await;
        let snapshot = store.read();
        assert_eq!(snapshot.cycle, 2);
        assert!(!snapshot.is_initial);
        assert_eq!(snapshot.to_work.trend, Trend::Up);

        tokio::time::sleep(PERIOD).await;
        assert_eq!(store.read().cycle, 3);

        let status = controller.status().unwrap();
        assert_eq!(status.state, SchedulerState::Idle);
        assert_eq!(status.cycles_completed, 3);

        controller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_is_rejected() {
        let (first, _) = aggregator(scripted(&[50, 40]));
        let (second, _) = aggregator(scripted(&[50, 40]));
        let mut controller = SchedulerController::new();

        controller.start(first, PERIOD).await.unwrap();
        assert!(controller.start(second, PERIOD).await.is_err());
        controller.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let mut controller = SchedulerController::new();
        assert!(controller.status().is_none());
        controller.stop().await.unwrap();
    }
}
