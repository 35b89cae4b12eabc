//! Source adapters. Each one turns an unreliable upstream into a value that
//! is always usable: failures are logged and replaced by a sentinel.

mod alerts;
mod credential;
mod error;
mod now_playing;
mod route;
mod weather;

pub use alerts::{AlertFeed, DEFAULT_FEED_URL};
pub use credential::MediaCredential;
pub use error::SourceError;
pub use now_playing::NowPlayingProvider;
pub use route::{RouteEstimator, WazeRegion};
pub use weather::WeatherProvider;

use std::future::Future;
use std::time::Duration;

use crate::http::HttpClient;
use crate::settings::Settings;

/// Run an adapter call under its own deadline.
pub(crate) async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, SourceError>
where
    F: Future<Output = Result<T, SourceError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout(limit)),
    }
}

/// The four adapters a cycle consults.
pub struct Sources<C> {
    pub route: RouteEstimator<C>,
    pub weather: WeatherProvider<C>,
    pub alerts: AlertFeed<C>,
    pub now_playing: NowPlayingProvider<C>,
}

impl<C: HttpClient + Clone> Sources<C> {
    pub fn from_settings(settings: &Settings, http: C) -> Self {
        Self {
            route: RouteEstimator::new(http.clone(), WazeRegion::parse(&settings.region)),
            weather: WeatherProvider::new(http.clone()),
            alerts: AlertFeed::new(http.clone(), settings.alerts_feed_url.clone()),
            now_playing: NowPlayingProvider::new(http, settings.media_credential()),
        }
    }
}
