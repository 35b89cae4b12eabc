use std::time::Duration;

use log::{debug, warn};
use serde::Deserialize;

use crate::http::HttpClient;
use crate::models::{NowPlaying, Track};

use super::{bounded, MediaCredential, SourceError};

const CURRENTLY_PLAYING_URL: &str = "https://api.spotify.com/v1/me/player/currently-playing";
const NOW_PLAYING_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct CurrentlyPlaying {
    #[serde(default)]
    is_playing: bool,
    item: Option<TrackItem>,
}

#[derive(Deserialize)]
struct TrackItem {
    name: String,
    #[serde(default)]
    artists: Vec<ArtistRef>,
    album: Option<AlbumRef>,
}

#[derive(Deserialize)]
struct ArtistRef {
    name: String,
}

#[derive(Deserialize)]
struct AlbumRef {
    #[serde(default)]
    images: Vec<ImageRef>,
}

#[derive(Deserialize)]
struct ImageRef {
    url: String,
}

pub struct NowPlayingProvider<C> {
    http: C,
    credential: Option<MediaCredential>,
    timeout: Duration,
}

impl<C: HttpClient> NowPlayingProvider<C> {
    pub fn new(http: C, credential: Option<MediaCredential>) -> Self {
        Self {
            http,
            credential,
            timeout: NOW_PLAYING_TIMEOUT,
        }
    }

    pub async fn fetch(&self) -> NowPlaying {
        let Some(credential) = &self.credential else {
            return NowPlaying::NotConfigured;
        };

        match bounded(self.timeout, self.try_fetch(credential)).await {
            Ok(now_playing) => now_playing,
            Err(err) => {
                // A rejected token is refreshed on the next cycle.
                if let SourceError::Unavailable(http_err) = &err {
                    if http_err.status() == Some(401) {
                        credential.invalidate().await;
                    }
                }
                warn!("now-playing fetch failed: {err}");
                NowPlaying::Idle
            }
        }
    }

    async fn try_fetch(&self, credential: &MediaCredential) -> Result<NowPlaying, SourceError> {
        let token = credential.access_token(&self.http).await?;
        let authorization = format!("Bearer {token}");
        let body = self
            .http
            .get_with_headers(CURRENTLY_PLAYING_URL, &[("Authorization", authorization.as_str())])
            .await?;

        // 204 No Content: nothing is playing.
        if body.is_empty() {
            debug!("media player idle");
            return Ok(NowPlaying::Idle);
        }

        let current: CurrentlyPlaying = serde_json::from_slice(&body)?;
        Ok(to_now_playing(current))
    }
}

fn to_now_playing(current: CurrentlyPlaying) -> NowPlaying {
    let item = match current.item {
        Some(item) if current.is_playing => item,
        _ => return NowPlaying::Idle,
    };

    let artist = item
        .artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let cover_url = item
        .album
        .and_then(|album| album.images.into_iter().next())
        .map(|image| image.url)
        .unwrap_or_default();

    NowPlaying::Playing(Track {
        title: item.name,
        artist,
        cover_url,
    })
}
