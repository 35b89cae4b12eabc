mod commute;
mod readings;
mod snapshot;

pub use commute::{DerivedCommuteMetric, RouteEstimate};
pub use readings::{AlertList, Condition, NowPlaying, Track, WeatherReading};
pub use snapshot::Snapshot;
