use log::info;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::http::HttpClient;

use super::Aggregator;

/// Drive cycles every `period` until cancelled. The first tick fires one full
/// period from now; the initial cycle is run by the caller beforehand.
pub async fn aggregation_loop<C: HttpClient>(
    mut aggregator: Aggregator<C>,
    period: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    // A cycle that overruns the period pushes the next one back instead of
    // queueing a burst.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                aggregator.run_cycle().await;
            }
            _ = cancel_token.cancelled() => {
                info!("aggregation loop shutting down");
                break;
            }
        }
    }
}
