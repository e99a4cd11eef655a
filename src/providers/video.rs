//! YouTube Data API v3 search, used to find an audio source for a track.

use super::models::{CanonicalTrack, VideoMatch};
use super::{VideoSource, get_json};
use crate::error::{Degraded, ProviderError};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
pub struct SearchItem {
    pub id: ItemId,
    pub snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemId {
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Snippet {
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
pub struct Thumbnails {
    pub high: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

impl Thumbnails {
    /// Highest resolution available.
    fn best_url(self) -> Option<String> {
        self.high
            .or(self.medium)
            .or(self.default)
            .map(|t| t.url)
    }
}

impl SearchListResponse {
    pub fn first_video(self) -> Option<VideoMatch> {
        let item = self.items.into_iter().next()?;
        let video_id = item.id.video_id?;
        let artwork_url = item.snippet.and_then(|s| s.thumbnails.best_url());
        Some(VideoMatch {
            video_id,
            artwork_url,
        })
    }
}

#[derive(Debug, Clone)]
pub struct YoutubeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl YoutubeClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn search_url(&self, query: &str, api_key: &str) -> String {
        format!(
            "{}?part=snippet&q={}&type=video&maxResults=1&key={}",
            self.base_url,
            urlencoding::encode(query),
            urlencoding::encode(api_key)
        )
    }
}

#[async_trait]
impl VideoSource for YoutubeClient {
    async fn search_video(&self, query: &str) -> Result<Option<VideoMatch>, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ProviderError::MissingApiKey("youtube"))?;
        let url = self.search_url(query, api_key);
        let response: Option<SearchListResponse> = get_json(&self.http, &url, "youtube").await?;
        Ok(response.and_then(SearchListResponse::first_video))
    }
}

/// Locate a playable video for the track, or `None`. Searches for
/// `"{artist} {title} audio"` to bias towards audio-only uploads.
pub async fn fetch_video(source: &dyn VideoSource, track: &CanonicalTrack) -> Option<VideoMatch> {
    let query = format!("{} audio", track.video_query());
    match source.search_video(&query).await {
        Ok(Some(found)) => {
            tracing::info!(video_id = %found.video_id, "video located");
            Some(found)
        }
        Ok(None) => {
            tracing::warn!("{}", Degraded::VideoNotFound(format!("no results for {query:?}")));
            None
        }
        Err(e) => {
            tracing::warn!("{}", Degraded::VideoNotFound(e.to_string()));
            None
        }
    }
}
