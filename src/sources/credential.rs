use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::http::HttpClient;

use super::SourceError;

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
/// Refresh this long before the provider-declared expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct TokenReply {
    access_token: String,
    expires_in: u64,
    /// Present only when the provider rotates the refresh token.
    refresh_token: Option<String>,
}

struct AccessToken {
    value: String,
    refresh_at: Instant,
}

struct TokenState {
    refresh_token: String,
    cached: Option<AccessToken>,
}

/// Renewable media-API credential. Obtaining the initial refresh token is an
/// interactive flow handled elsewhere; this only trades it for short-lived
/// access tokens and caches them.
pub struct MediaCredential {
    client_id: String,
    client_secret: String,
    state: Mutex<TokenState>,
}

impl MediaCredential {
    pub fn new(client_id: String, client_secret: String, refresh_token: String) -> Self {
        Self {
            client_id,
            client_secret,
            state: Mutex::new(TokenState {
                refresh_token,
                cached: None,
            }),
        }
    }

    /// A valid access token, refreshing it first if needed.
    pub async fn access_token<C: HttpClient>(&self, http: &C) -> Result<String, SourceError> {
        let mut state = self.state.lock().await;

        if let Some(token) = &state.cached {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
            debug!("media access token expired, refreshing");
        }

        let body = http
            .post_form(
                TOKEN_URL,
                Some((self.client_id.as_str(), self.client_secret.as_str())),
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", state.refresh_token.as_str()),
                ],
            )
            .await?;
        let reply: TokenReply = serde_json::from_slice(&body)?;

        if let Some(rotated) = reply.refresh_token {
            info!("media refresh token rotated");
            state.refresh_token = rotated;
        }

        let lifetime = Duration::from_secs(reply.expires_in).saturating_sub(EXPIRY_MARGIN);
        state.cached = Some(AccessToken {
            value: reply.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });

        Ok(reply.access_token)
    }

    /// Drop the cached access token so the next call refreshes.
    pub async fn invalidate(&self) {
        self.state.lock().await.cached = None;
    }
}
