use std::{env, fs, net::SocketAddr, path::Path, time::Duration};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::sources::{MediaCredential, DEFAULT_FEED_URL};

const DEFAULT_CONFIG_PATH: &str = "config.json";
const CONFIG_PATH_VAR: &str = "COMMUTE_BOARD_CONFIG";

/// Fully resolved runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub work_address: String,
    pub home_address: String,
    pub region: String,
    pub weather_lat: f64,
    pub weather_long: f64,
    pub update_interval_secs: u64,
    pub standard_commute_mins: u32,
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub spotify_refresh_token: String,
    pub alerts_feed_url: String,
    pub bind_addr: SocketAddr,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_address: "Brussels, Belgium".into(),
            home_address: "Antwerp, Belgium".into(),
            region: "EU".into(),
            weather_lat: 51.2194,
            weather_long: 4.4025,
            update_interval_secs: 300,
            standard_commute_mins: 45,
            spotify_client_id: String::new(),
            spotify_client_secret: String::new(),
            spotify_refresh_token: String::new(),
            alerts_feed_url: DEFAULT_FEED_URL.into(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
        }
    }
}

/// Partial overrides read from `config.json`. Missing keys keep the default.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    work_address: Option<String>,
    home_address: Option<String>,
    #[serde(alias = "waze_region")]
    region: Option<String>,
    weather_lat: Option<f64>,
    weather_long: Option<f64>,
    update_interval_secs: Option<u64>,
    standard_commute_mins: Option<u32>,
    spotify_client_id: Option<String>,
    spotify_client_secret: Option<String>,
    spotify_refresh_token: Option<String>,
    alerts_feed_url: Option<String>,
    bind_addr: Option<SocketAddr>,
}

impl Settings {
    /// Resolve settings from environment, then `config.json`, then defaults.
    pub fn load() -> Result<Self> {
        let path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let file = read_file_settings(Path::new(&path));
        let settings = Self::resolve(file, |key| env::var(key).ok());
        settings.validate()?;
        info!(
            "settings resolved: region={}, interval={}s, media credential {}",
            settings.region,
            settings.update_interval_secs,
            if settings.has_media_credential() { "configured" } else { "absent" }
        );
        Ok(settings)
    }

    fn resolve(file: FileSettings, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Settings::default();
        let env_value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            work_address: env_value("WORK_ADDRESS")
                .or(file.work_address)
                .unwrap_or(defaults.work_address),
            home_address: env_value("HOME_ADDRESS")
                .or(file.home_address)
                .unwrap_or(defaults.home_address),
            region: env_value("WAZE_REGION")
                .or(file.region)
                .unwrap_or(defaults.region),
            weather_lat: parsed(env_value("WEATHER_LAT"), "WEATHER_LAT")
                .or(file.weather_lat)
                .unwrap_or(defaults.weather_lat),
            weather_long: parsed(env_value("WEATHER_LONG"), "WEATHER_LONG")
                .or(file.weather_long)
                .unwrap_or(defaults.weather_long),
            update_interval_secs: parsed(env_value("UPDATE_INTERVAL_SECS"), "UPDATE_INTERVAL_SECS")
                .or(file.update_interval_secs)
                .unwrap_or(defaults.update_interval_secs),
            standard_commute_mins: parsed(env_value("STANDARD_COMMUTE_MINS"), "STANDARD_COMMUTE_MINS")
                .or(file.standard_commute_mins)
                .unwrap_or(defaults.standard_commute_mins),
            spotify_client_id: env_value("SPOTIFY_CLIENT_ID")
                .or(file.spotify_client_id)
                .unwrap_or(defaults.spotify_client_id),
            spotify_client_secret: env_value("SPOTIFY_CLIENT_SECRET")
                .or(file.spotify_client_secret)
                .unwrap_or(defaults.spotify_client_secret),
            spotify_refresh_token: env_value("SPOTIFY_REFRESH_TOKEN")
                .or(file.spotify_refresh_token)
                .unwrap_or(defaults.spotify_refresh_token),
            alerts_feed_url: env_value("ALERTS_FEED_URL")
                .or(file.alerts_feed_url)
                .unwrap_or(defaults.alerts_feed_url),
            bind_addr: parsed(env_value("DASHBOARD_BIND_ADDR"), "DASHBOARD_BIND_ADDR")
                .or(file.bind_addr)
                .unwrap_or(defaults.bind_addr),
        }
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.update_interval_secs > 0,
            "update_interval_secs must be greater than zero"
        );
        Ok(())
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    pub fn has_media_credential(&self) -> bool {
        !self.spotify_client_id.is_empty()
            && !self.spotify_client_secret.is_empty()
            && !self.spotify_refresh_token.is_empty()
    }

    pub fn media_credential(&self) -> Option<MediaCredential> {
        self.has_media_credential().then(|| {
            MediaCredential::new(
                self.spotify_client_id.clone(),
                self.spotify_client_secret.clone(),
                self.spotify_refresh_token.clone(),
            )
        })
    }
}

/// Parse an environment override, keeping the lower-precedence value when it
/// does not parse.
fn parsed<T: std::str::FromStr>(value: Option<String>, key: &str) -> Option<T> {
    let raw = value?;
    match raw.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("ignoring {key}={raw}: not a valid value");
            None
        }
    }
}

fn read_file_settings(path: &Path) -> FileSettings {
    if !path.exists() {
        return FileSettings::default();
    }

    let loaded = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))
        .and_then(|contents| {
            serde_json::from_str(&contents)
                .with_context(|| format!("Invalid settings in {}", path.display()))
        });

    match loaded {
        Ok(file) => file,
        Err(err) => {
            warn!("{err:#}; using defaults");
            FileSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_overrides() {
        let settings = Settings::resolve(FileSettings::default(), env_of(&[]));
        assert_eq!(settings, Settings::default());
        assert!(!settings.has_media_credential());
        assert!(settings.media_credential().is_none());
    }

    #[test]
    fn test_env_beats_file_beats_default() {
        let file: FileSettings = serde_json::from_str(
            r#"{"work_address": "Gent", "home_address": "Leuven", "update_interval_secs": 120}"#,
        )
        .unwrap();
        let settings = Settings::resolve(file, env_of(&[("WORK_ADDRESS", "Mechelen")]));

        assert_eq!(settings.work_address, "Mechelen");
        assert_eq!(settings.home_address, "Leuven");
        assert_eq!(settings.update_interval_secs, 120);
        assert_eq!(settings.region, "EU");
    }

    #[test]
    fn test_bad_numeric_env_keeps_file_value() {
        let file: FileSettings = serde_json::from_str(r#"{"standard_commute_mins": 50}"#).unwrap();
        let settings = Settings::resolve(
            file,
            env_of(&[("STANDARD_COMMUTE_MINS", "soon"), ("WEATHER_LAT", "50.85")]),
        );
        assert_eq!(settings.standard_commute_mins, 50);
        assert_eq!(settings.weather_lat, 50.85);
    }

    #[test]
    fn test_empty_env_is_ignored() {
        let settings = Settings::resolve(FileSettings::default(), env_of(&[("HOME_ADDRESS", "  ")]));
        assert_eq!(settings.home_address, "Antwerp, Belgium");
    }

    #[test]
    fn test_file_accepts_waze_region_key() {
        let file: FileSettings = serde_json::from_str(r#"{"waze_region": "US"}"#).unwrap();
        assert_eq!(Settings::resolve(file, env_of(&[])).region, "US");
    }

    #[test]
    fn test_media_credential_needs_all_parts() {
        let partial = env_of(&[("SPOTIFY_CLIENT_ID", "id"), ("SPOTIFY_CLIENT_SECRET", "secret")]);
        assert!(!Settings::resolve(FileSettings::default(), partial).has_media_credential());

        let full = env_of(&[
            ("SPOTIFY_CLIENT_ID", "id"),
            ("SPOTIFY_CLIENT_SECRET", "secret"),
            ("SPOTIFY_REFRESH_TOKEN", "refresh"),
        ]);
        let settings = Settings::resolve(FileSettings::default(), full);
        assert!(settings.media_credential().is_some());
    }

    #[test]
    fn test_unreadable_file_falls_back() {
        let dir = env::temp_dir().join(format!("commute-board-settings-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let file = read_file_settings(&path);
        assert!(file.work_address.is_none());

        fs::write(&path, r#"{"bind_addr": "0.0.0.0:8080"}"#).unwrap();
        let file = read_file_settings(&path);
        assert_eq!(file.bind_addr, Some(SocketAddr::from(([0, 0, 0, 0], 8080))));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_update_interval_follows_setting() {
        let settings = Settings {
            update_interval_secs: 90,
            ..Settings::default()
        };
        assert!(settings.validate().is_ok());
        assert_eq!(settings.update_interval(), Duration::from_secs(90));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let settings = Settings {
            update_interval_secs: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }
}
