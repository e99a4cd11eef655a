//! lyrics.ovh API client
//!
//! Plain-text lyrics by artist and title.
//! API Documentation: https://lyricsovh.docs.apiary.io

use crate::error::ProviderError;
use crate::providers::{LyricsSource, get_json};
use async_trait::async_trait;
use serde::Deserialize;

/// lyrics.ovh API response. Misses come back as `{"error": "..."}`.
#[derive(Debug, Deserialize, Clone)]
pub struct LyricsResponse {
    pub lyrics: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LyricsOvhClient {
    http: reqwest::Client,
    base_url: String,
}

impl LyricsOvhClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn lyrics_url(&self, artist: &str, title: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            urlencoding::encode(artist),
            urlencoding::encode(title)
        )
    }
}

#[async_trait]
impl LyricsSource for LyricsOvhClient {
    async fn lyrics(&self, artist: &str, title: &str) -> Result<Option<String>, ProviderError> {
        let url = self.lyrics_url(artist, title);
        let response: Option<LyricsResponse> = get_json(&self.http, &url, "lyrics.ovh").await?;
        Ok(response.and_then(|r| {
            if let Some(err) = &r.error {
                tracing::debug!(error = %err, "lyrics.ovh miss");
            }
            r.lyrics
        }))
    }
}
