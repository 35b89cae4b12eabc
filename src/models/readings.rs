use serde::{Deserialize, Serialize};

/// Coarse weather condition derived from a WMO weather code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Condition {
    Clear,
    Cloudy,
    Overcast,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Storm,
    #[default]
    Unknown,
}

impl Condition {
    pub fn label(&self) -> &'static str {
        match self {
            Condition::Clear => "Clear",
            Condition::Cloudy => "Cloudy",
            Condition::Overcast => "Overcast",
            Condition::Fog => "Fog",
            Condition::Drizzle => "Drizzle",
            Condition::Rain => "Rain",
            Condition::Snow => "Snow",
            Condition::Storm => "Storm",
            Condition::Unknown => "--",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct WeatherReading {
    pub temperature_c: i32,
    pub feels_like_c: i32,
    pub condition: Condition,
    pub icon: String,
}

impl WeatherReading {
    /// Reading used when the weather source failed.
    pub fn unavailable() -> Self {
        Self::default()
    }
}

const MAX_ALERTS: usize = 5;
const NO_INCIDENTS: &str = "Geen incidenten momenteel.";
const FEED_UNREACHABLE: &str = "Kon verkeersinformatie niet ophalen.";
const AWAITING_FIRST_FETCH: &str = "Initializing...";

/// Traffic alerts shown on the dashboard. Holds between one and five entries;
/// an empty result is replaced by a sentinel message.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(transparent)]
pub struct AlertList(Vec<String>);

impl AlertList {
    pub fn from_entries(mut entries: Vec<String>) -> Self {
        if entries.is_empty() {
            return Self::no_incidents();
        }
        entries.truncate(MAX_ALERTS);
        Self(entries)
    }

    /// The feed answered but nothing survived filtering.
    pub fn no_incidents() -> Self {
        Self(vec![NO_INCIDENTS.to_string()])
    }

    /// The feed could not be fetched or parsed.
    pub fn unreachable() -> Self {
        Self(vec![FEED_UNREACHABLE.to_string()])
    }

    pub(crate) fn awaiting_first_fetch() -> Self {
        Self(vec![AWAITING_FIRST_FETCH.to_string()])
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept so the list reads like a collection.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub title: String,
    /// Comma-joined artist names.
    pub artist: String,
    /// Empty when the track has no cover art.
    pub cover_url: String,
}

/// What the media account is playing right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "NowPlayingView")]
pub enum NowPlaying {
    /// No media credential configured; the source is never queried.
    NotConfigured,
    /// Credential configured but nothing playing, or the query failed.
    Idle,
    Playing(Track),
}

impl NowPlaying {
    pub fn is_playing(&self) -> bool {
        matches!(self, NowPlaying::Playing(_))
    }

    pub fn title(&self) -> &str {
        match self {
            NowPlaying::NotConfigured => "Not Configured",
            NowPlaying::Idle => "Not Playing",
            NowPlaying::Playing(track) => &track.title,
        }
    }
}

/// Flat shape readers see: `{ state, is_playing, title, artist, cover_url }`.
#[derive(Serialize)]
struct NowPlayingView {
    state: &'static str,
    is_playing: bool,
    title: String,
    artist: String,
    cover_url: String,
}

impl From<NowPlaying> for NowPlayingView {
    fn from(value: NowPlaying) -> Self {
        let title = value.title().to_string();
        match value {
            NowPlaying::NotConfigured => Self {
                state: "not_configured",
                is_playing: false,
                title,
                artist: String::new(),
                cover_url: String::new(),
            },
            NowPlaying::Idle => Self {
                state: "idle",
                is_playing: false,
                title,
                artist: String::new(),
                cover_url: String::new(),
            },
            NowPlaying::Playing(track) => Self {
                state: "playing",
                is_playing: true,
                title,
                artist: track.artist,
                cover_url: track.cover_url,
            },
        }
    }
}
