//! Route time estimates from the Waze live-map routing service.
//!
//! Each estimate geocodes both addresses through the region's search
//! server and then asks the routing manager for a driving route.

use std::time::Duration;

use log::{debug, warn};
use reqwest::Url;
use serde::Deserialize;

use crate::http::HttpClient;
use crate::models::RouteEstimate;

use super::{bounded, SourceError};

const WAZE_URL: &str = "https://www.waze.com/";
const ROUTE_TIMEOUT: Duration = Duration::from_secs(20);

const HEADERS: [(&str, &str); 1] = [("Referer", "https://www.waze.com/")];

/// Waze serves separate backends per world region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WazeRegion {
    Us,
    Eu,
    Il,
    Au,
}

impl WazeRegion {
    /// Parse a region code, falling back to `EU` for anything unrecognised.
    pub fn parse(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "US" | "NA" => WazeRegion::Us,
            "EU" => WazeRegion::Eu,
            "IL" => WazeRegion::Il,
            "AU" => WazeRegion::Au,
            other => {
                warn!("unknown Waze region '{other}', using EU");
                WazeRegion::Eu
            }
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            WazeRegion::Us => "",
            WazeRegion::Eu | WazeRegion::Au => "row-",
            WazeRegion::Il => "il-",
        }
    }

    /// Reference point the search server ranks geocoding hits around.
    fn reference(&self) -> (f64, f64) {
        match self {
            WazeRegion::Us => (40.713, -74.006),
            WazeRegion::Eu => (47.498, 19.040),
            WazeRegion::Il => (31.768, 35.214),
            WazeRegion::Au => (-35.281, 149.128),
        }
    }

    fn search_url(&self) -> String {
        format!("{WAZE_URL}{}SearchServer/mozi", self.prefix())
    }

    fn routing_url(&self) -> String {
        format!("{WAZE_URL}{}RoutingManager/routingRequest", self.prefix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
struct Coordinates {
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
struct SearchHit {
    location: Option<Coordinates>,
}

#[derive(Deserialize)]
struct RoutingReply {
    response: Option<RouteBody>,
    alternatives: Option<Vec<Alternative>>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct Alternative {
    response: RouteBody,
}

#[derive(Deserialize)]
struct RouteBody {
    results: Vec<RouteSegment>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteSegment {
    /// Seconds, including live traffic.
    cross_time: f64,
    /// Meters.
    length: f64,
}

pub struct RouteEstimator<C> {
    http: C,
    region: WazeRegion,
    timeout: Duration,
}

impl<C: HttpClient> RouteEstimator<C> {
    pub fn new(http: C, region: WazeRegion) -> Self {
        Self {
            http,
            region,
            timeout: ROUTE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Estimate a drive from `origin` to `destination`. Any failure is logged
    /// and reported as the zero estimate.
    pub async fn estimate(&self, origin: &str, destination: &str) -> RouteEstimate {
        match bounded(self.timeout, self.try_estimate(origin, destination)).await {
            Ok(estimate) => {
                debug!(
                    "route {origin} -> {destination}: {} min, {} km",
                    estimate.duration_minutes, estimate.distance_km
                );
                estimate
            }
            Err(err) => {
                warn!("route estimate {origin} -> {destination} failed: {err}");
                RouteEstimate::zero()
            }
        }
    }

    async fn try_estimate(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<RouteEstimate, SourceError> {
        let from = self.geocode(origin).await?;
        let to = self.geocode(destination).await?;

        let url = Url::parse_with_params(
            &self.region.routing_url(),
            &[
                ("from", format!("x:{} y:{}", from.lon, from.lat)),
                ("to", format!("x:{} y:{}", to.lon, to.lat)),
                ("at", "0".to_string()),
                ("returnJSON", "true".to_string()),
                ("returnGeometries", "true".to_string()),
                ("returnInstructions", "true".to_string()),
                ("timeout", "60000".to_string()),
                ("nPaths", "3".to_string()),
                ("options", "AVOID_TRAILS:t".to_string()),
            ],
        )
        .map_err(|e| SourceError::Malformed(format!("bad routing url: {e}")))?;

        let body = self.http.get_with_headers(url.as_str(), &HEADERS).await?;
        parse_route(&body)
    }

    async fn geocode(&self, address: &str) -> Result<Coordinates, SourceError> {
        let (lat, lon) = self.region.reference();
        let url = Url::parse_with_params(
            &self.region.search_url(),
            &[
                ("q", address.to_string()),
                ("lang", "eng".to_string()),
                ("origin", "livemap".to_string()),
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
            ],
        )
        .map_err(|e| SourceError::Malformed(format!("bad search url: {e}")))?;

        let body = self.http.get_with_headers(url.as_str(), &HEADERS).await?;
        let hits: Vec<SearchHit> = serde_json::from_slice(&body)?;
        hits.into_iter()
            .find_map(|hit| hit.location)
            .ok_or_else(|| SourceError::Malformed(format!("no location found for '{address}'")))
    }
}

/// Sum the segments of the first returned route.
fn parse_route(body: &[u8]) -> Result<RouteEstimate, SourceError> {
    let reply: RoutingReply = serde_json::from_slice(body)?;
    if let Some(error) = reply.error {
        return Err(SourceError::Malformed(format!("routing error: {error}")));
    }

    let route = match (reply.response, reply.alternatives) {
        (Some(route), _) => route,
        (None, Some(alternatives)) => alternatives
            .into_iter()
            .next()
            .map(|alt| alt.response)
            .ok_or_else(|| SourceError::Malformed("empty alternatives".into()))?,
        (None, None) => return Err(SourceError::Malformed("no route in reply".into())),
    };

    if route.results.is_empty() {
        return Err(SourceError::Malformed("route has no segments".into()));
    }

    let seconds: f64 = route.results.iter().map(|s| s.cross_time).sum();
    let meters: f64 = route.results.iter().map(|s| s.length).sum();

    Ok(RouteEstimate {
        duration_minutes: (seconds / 60.0) as u32,
        distance_km: (meters / 100.0).round() / 10.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::tests::MockHttpClient;
    use crate::http::HttpError;

    const SEARCH: &str = r#"[{"name":"Antwerpen","location":{"lat":51.22,"lon":4.40}}]"#;

    fn route_reply(segments: &[(f64, f64)]) -> String {
        let results: Vec<String> = segments
            .iter()
            .map(|(t, l)| format!(r#"{{"crossTime":{t},"crossTimeWithoutRealTime":{t},"length":{l}}}"#))
            .collect();
        format!(r#"{{"response":{{"results":[{}]}}}}"#, results.join(","))
    }

    #[test]
    fn test_parse_route_sums_segments() {
        let body = route_reply(&[(1200.0, 20_000.0), (1530.0, 24_260.0)]);
        let estimate = parse_route(body.as_bytes()).unwrap();
        assert_eq!(estimate.duration_minutes, 45);
        assert_eq!(estimate.distance_km, 44.3);
    }

    #[test]
    fn test_parse_route_accepts_alternatives() {
        let body = r#"{"alternatives":[
            {"response":{"results":[{"crossTime":600,"length":5000}]}},
            {"response":{"results":[{"crossTime":900,"length":4000}]}}
        ]}"#;
        let estimate = parse_route(body.as_bytes()).unwrap();
        assert_eq!(estimate.duration_minutes, 10);
        assert_eq!(estimate.distance_km, 5.0);
    }

    #[test]
    fn test_parse_route_rejects_error_reply() {
        let err = parse_route(br#"{"error":"No route found"}"#).unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }

    #[test]
    fn test_region_endpoints() {
        assert_eq!(
            WazeRegion::Us.routing_url(),
            "https://www.waze.com/RoutingManager/routingRequest"
        );
        assert_eq!(
            WazeRegion::Eu.search_url(),
            "https://www.waze.com/row-SearchServer/mozi"
        );
        assert_eq!(WazeRegion::parse("il"), WazeRegion::Il);
        assert_eq!(WazeRegion::parse("mars"), WazeRegion::Eu);
    }

    #[tokio::test]
    async fn test_estimate_success() {
        let http = MockHttpClient::new()
            .respond("SearchServer", SEARCH)
            .respond("RoutingManager", route_reply(&[(2700.0, 45_040.0)]));
        let estimator = RouteEstimator::new(http.clone(), WazeRegion::Eu);

        let estimate = estimator.estimate("Antwerp, Belgium", "Brussels, Belgium").await;
        assert_eq!(estimate.duration_minutes, 45);
        assert_eq!(estimate.distance_km, 45.0);

        let calls = http.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[0].contains("row-SearchServer"));
        assert!(calls[2].contains("routingRequest"));
    }

    #[tokio::test]
    async fn test_estimate_network_failure_is_zero() {
        let http = MockHttpClient::new().fail("SearchServer", HttpError::Request("refused".into()));
        let estimator = RouteEstimator::new(http, WazeRegion::Eu);
        assert_eq!(estimator.estimate("a", "b").await, RouteEstimate::zero());
    }

    #[tokio::test]
    async fn test_estimate_malformed_reply_is_zero() {
        let http = MockHttpClient::new()
            .respond("SearchServer", SEARCH)
            .respond("RoutingManager", "<html>captcha</html>");
        let estimator = RouteEstimator::new(http, WazeRegion::Eu);
        assert_eq!(estimator.estimate("a", "b").await, RouteEstimate::zero());
    }

    #[tokio::test]
    async fn test_estimate_unknown_address_is_zero() {
        let http = MockHttpClient::new().respond("SearchServer", "[]");
        let estimator = RouteEstimator::new(http, WazeRegion::Eu);
        assert_eq!(estimator.estimate("nowhere", "b").await, RouteEstimate::zero());
    }

    #[tokio::test(start_paused = true)]
    async fn test_estimate_timeout_is_zero() {
        let http = MockHttpClient::new()
            .respond("SearchServer", SEARCH)
            .respond("RoutingManager", route_reply(&[(600.0, 1000.0)]))
            .with_delay(Duration::from_secs(30));
        let estimator = RouteEstimator::new(http, WazeRegion::Eu).with_timeout(Duration::from_secs(5));
        assert_eq!(estimator.estimate("a", "b").await, RouteEstimate::zero());
    }
}
