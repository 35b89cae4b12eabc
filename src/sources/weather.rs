use std::time::Duration;

use log::{debug, warn};
use reqwest::Url;
use serde::Deserialize;

use crate::http::HttpClient;
use crate::models::{Condition, WeatherReading};

use super::{bounded, SourceError};

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const CURRENT_FIELDS: &str = "temperature_2m,apparent_temperature,weather_code";
const WEATHER_TIMEOUT: Duration = Duration::from_secs(10);
const UNKNOWN_ICON: &str = "🤷";

#[derive(Deserialize)]
struct ForecastReply {
    current: CurrentConditions,
}

#[derive(Deserialize)]
struct CurrentConditions {
    temperature_2m: f64,
    apparent_temperature: f64,
    weather_code: i64,
}

/// Map a WMO weather code to a condition and its icon.
pub fn classify(code: i64) -> (Condition, &'static str) {
    match code {
        0 => (Condition::Clear, "☀️"),
        1 => (Condition::Clear, "🌤️"),
        2 => (Condition::Cloudy, "⛅"),
        3 => (Condition::Overcast, "☁️"),
        45 | 48 => (Condition::Fog, "🌫️"),
        51 | 53 | 55 => (Condition::Drizzle, "🌦️"),
        61 | 63 | 65 => (Condition::Rain, "🌧️"),
        71 | 73 | 75 => (Condition::Snow, "❄️"),
        95 | 96 | 99 => (Condition::Storm, "⛈️"),
        _ => (Condition::Unknown, UNKNOWN_ICON),
    }
}

pub struct WeatherProvider<C> {
    http: C,
    timeout: Duration,
}

impl<C: HttpClient> WeatherProvider<C> {
    pub fn new(http: C) -> Self {
        Self {
            http,
            timeout: WEATHER_TIMEOUT,
        }
    }

    /// Current conditions at `lat`/`lon`, or the unavailable reading.
    pub async fn fetch(&self, lat: f64, lon: f64) -> WeatherReading {
        match bounded(self.timeout, self.try_fetch(lat, lon)).await {
            Ok(reading) => {
                debug!(
                    "weather at {lat},{lon}: {}°C ({:?})",
                    reading.temperature_c, reading.condition
                );
                reading
            }
            Err(err) => {
                warn!("weather fetch failed: {err}");
                WeatherReading::unavailable()
            }
        }
    }

    async fn try_fetch(&self, lat: f64, lon: f64) -> Result<WeatherReading, SourceError> {
        let url = Url::parse_with_params(
            FORECAST_URL,
            &[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
            ],
        )
        .map_err(|e| SourceError::Malformed(format!("bad forecast url: {e}")))?;

        let body = self.http.get(url.as_str()).await?;
        let reply: ForecastReply = serde_json::from_slice(&body)?;
        let (condition, icon) = classify(reply.current.weather_code);

        Ok(WeatherReading {
            temperature_c: whole_degrees(reply.current.temperature_2m),
            feels_like_c: whole_degrees(reply.current.apparent_temperature),
            condition,
            icon: icon.to_string(),
        })
    }
}

/// Halves go to the even neighbour, so 12.5 reads as 12 and -0.5 as 0.
fn whole_degrees(celsius: f64) -> i32 {
    celsius.round_ties_even() as i32
}
