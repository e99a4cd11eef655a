//! External data providers: song metadata search and video search.
//!
//! Each provider sits behind a small trait so the search pipeline can be
//! driven by the real HTTP clients or by in-memory fakes.

pub mod metadata;
pub mod models;
pub mod video;

use crate::config::ProvidersConfig;
use crate::error::ProviderError;
use anyhow::Context;
use async_trait::async_trait;
use models::{CanonicalTrack, VideoMatch};
use serde::de::DeserializeOwned;
use std::sync::Arc;

pub use metadata::{ItunesClient, resolve};
pub use video::{YoutubeClient, fetch_video};

#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Closest single song match for a free-text term.
    async fn search_song(&self, term: &str) -> Result<Option<CanonicalTrack>, ProviderError>;
}

#[async_trait]
pub trait LyricsSource: Send + Sync {
    async fn lyrics(&self, artist: &str, title: &str) -> Result<Option<String>, ProviderError>;
}

#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Top single video match for a free-text query.
    async fn search_video(&self, query: &str) -> Result<Option<VideoMatch>, ProviderError>;
}

/// The three collaborators one search fans out to.
#[derive(Clone)]
pub struct Providers {
    pub metadata: Arc<dyn MetadataSource>,
    pub lyrics: Arc<dyn LyricsSource>,
    pub video: Arc<dyn VideoSource>,
}

impl Providers {
    pub fn from_config(cfg: &crate::config::Config) -> anyhow::Result<Self> {
        let http = http_client(&cfg.providers)?;
        Ok(Self {
            metadata: Arc::new(ItunesClient::new(http.clone(), &cfg.providers.metadata_url)),
            lyrics: Arc::new(crate::lyrics::LyricsOvhClient::new(
                http.clone(),
                &cfg.providers.lyrics_url,
            )),
            video: Arc::new(YoutubeClient::new(
                http,
                &cfg.providers.video_url,
                cfg.youtube.api_key.clone(),
            )),
        })
    }
}

pub fn http_client(cfg: &ProvidersConfig) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(cfg.user_agent.as_str())
        .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
        .build()
        .context("build reqwest client")
}

/// GET a JSON document. `404` maps to `Ok(None)`.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &reqwest::Client,
    url: &str,
    provider: &'static str,
) -> Result<Option<T>, ProviderError> {
    let response = http.get(url).send().await?;
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(ProviderError::Status { provider, status });
    }
    let body = response.text().await?;
    decode(&body, provider).map(Some)
}

pub(crate) fn decode<T: DeserializeOwned>(
    body: &str,
    provider: &'static str,
) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|source| ProviderError::Decode { provider, source })
}
