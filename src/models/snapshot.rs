use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{AlertList, DerivedCommuteMetric, NowPlaying, WeatherReading};

/// One complete aggregate view. Built once per scheduler cycle and never
/// mutated afterwards; every field always holds a value, falling back to the
/// source's sentinel when a fetch failed.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub to_work: DerivedCommuteMetric,
    pub to_home: DerivedCommuteMetric,
    pub weather: WeatherReading,
    pub alerts: AlertList,
    pub now_playing: NowPlaying,
    pub last_updated: DateTime<Utc>,
    /// Set only on the snapshot produced by the very first cycle.
    pub is_initial: bool,
    /// Number of the cycle that produced this snapshot; 0 for the placeholder.
    pub cycle: u64,
}

impl Snapshot {
    /// Value readers see before the first cycle has been published.
    pub fn placeholder() -> Self {
        Self {
            to_work: DerivedCommuteMetric::default(),
            to_home: DerivedCommuteMetric::default(),
            weather: WeatherReading::unavailable(),
            alerts: AlertList::awaiting_first_fetch(),
            now_playing: NowPlaying::Idle,
            last_updated: Utc::now(),
            is_initial: true,
            cycle: 0,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.cycle == 0
    }
}
