//! iTunes Search API client, used to turn sloppy user input into a proper
//! artist/title pair.
//!
//! API Documentation: https://performance-partners.apple.com/search-api

use super::models::{CanonicalTrack, SearchQuery};
use super::{MetadataSource, get_json};
use crate::error::{Degraded, ProviderError};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub result_count: u32,
    #[serde(default)]
    pub results: Vec<SongResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongResult {
    pub artist_name: String,
    pub track_name: String,
}

impl SearchResponse {
    pub fn first_track(self) -> Option<CanonicalTrack> {
        if self.result_count == 0 {
            return None;
        }
        self.results
            .into_iter()
            .next()
            .map(|r| CanonicalTrack::new(r.artist_name, r.track_name))
    }
}

#[derive(Debug, Clone)]
pub struct ItunesClient {
    http: reqwest::Client,
    base_url: String,
}

impl ItunesClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn search_url(&self, term: &str) -> String {
        format!(
            "{}?term={}&entity=song&limit=1",
            self.base_url,
            urlencoding::encode(term)
        )
    }
}

#[async_trait]
impl MetadataSource for ItunesClient {
    async fn search_song(&self, term: &str) -> Result<Option<CanonicalTrack>, ProviderError> {
        let url = self.search_url(term);
        let response: Option<SearchResponse> = get_json(&self.http, &url, "itunes").await?;
        Ok(response.and_then(SearchResponse::first_track))
    }
}

/// Resolve raw input to a canonical track.
///
/// Returns `None` when the provider has no match or fails; the caller then
/// uses the raw pair. Never errors.
pub async fn resolve(source: &dyn MetadataSource, query: &SearchQuery) -> Option<CanonicalTrack> {
    let term = query.term();
    if term.trim().is_empty() {
        tracing::debug!("blank query, skipping metadata lookup");
        return None;
    }

    match source.search_song(&term).await {
        Ok(Some(track)) => {
            tracing::info!(artist = %track.artist, title = %track.title, "resolved track");
            Some(track)
        }
        Ok(None) => {
            let reason = Degraded::ResolutionFailure(format!("no match for {term:?}"));
            tracing::warn!("{reason}");
            None
        }
        Err(e) => {
            let reason = Degraded::ResolutionFailure(e.to_string());
            tracing::warn!("{reason}");
            None
        }
    }
}
