//! Lyrics lookup.
//!
//! This module provides:
//! - lyrics.ovh API client
//! - the "not found" fallback every failure collapses into

pub mod ovh;

pub use ovh::LyricsOvhClient;

use crate::error::Degraded;
use crate::providers::LyricsSource;
use crate::providers::models::CanonicalTrack;

/// Shown in place of lyrics whenever the lookup fails for any reason.
pub const NOT_FOUND: &str = "Lyrics not found.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LyricsOutcome {
    Found(String),
    NotFound,
}

impl LyricsOutcome {
    /// Displayable text; the placeholder for [`LyricsOutcome::NotFound`].
    pub fn into_text(self) -> String {
        match self {
            LyricsOutcome::Found(lyrics) => lyrics,
            LyricsOutcome::NotFound => NOT_FOUND.to_string(),
        }
    }
}

/// Get lyrics for a track. Never fails; see [`NOT_FOUND`].
pub async fn fetch_lyrics(source: &dyn LyricsSource, track: &CanonicalTrack) -> LyricsOutcome {
    match source.lyrics(&track.artist, &track.title).await {
        Ok(Some(raw)) => match clean(&raw) {
            Some(lyrics) => LyricsOutcome::Found(lyrics),
            None => {
                tracing::warn!("{}", Degraded::LyricsNotFound("empty lyrics".into()));
                LyricsOutcome::NotFound
            }
        },
        Ok(None) => {
            tracing::warn!(
                "{}",
                Degraded::LyricsNotFound(format!("{} - {}", track.artist, track.title))
            );
            LyricsOutcome::NotFound
        }
        Err(e) => {
            tracing::warn!("{}", Degraded::LyricsNotFound(e.to_string()));
            LyricsOutcome::NotFound
        }
    }
}

/// Normalize line endings and drop the banner lyrics.ovh sometimes prepends,
/// e.g. `Paroles de la chanson Yellow par Coldplay`.
fn clean(raw: &str) -> Option<String> {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    let mut body = text.as_str();
    if let Some(first) = body.lines().next()
        && first.trim_start().starts_with("Paroles de la chanson")
    {
        body = &body[first.len()..];
    }
    let body = body.trim();
    if body.is_empty() {
        None
    } else {
        Some(body.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use async_trait::async_trait;

    struct Fixed(Option<&'static str>, bool);

    #[async_trait]
    impl LyricsSource for Fixed {
        async fn lyrics(&self, _artist: &str, _title: &str) -> Result<Option<String>, ProviderError> {
            if self.1 {
                return Err(ProviderError::MissingApiKey("test"));
            }
            Ok(self.0.map(str::to_string))
        }
    }

    #[test]
    fn test_clean_strips_banner_and_crlf() {
        let raw = "Paroles de la chanson Yellow par Coldplay\r\nLook at the stars\r\nLook how they shine for you\r\n";
        assert_eq!(
            clean(raw).as_deref(),
            Some("Look at the stars\nLook how they shine for you")
        );
    }

    #[test]
    fn test_clean_blank_is_none() {
        assert_eq!(clean("  \r\n "), None);
    }

    #[tokio::test]
    async fn test_failures_collapse_to_placeholder() {
        let track = CanonicalTrack::new("Coldplay", "Yellow");
        assert_eq!(fetch_lyrics(&Fixed(None, false), &track).await, LyricsOutcome::NotFound);
        assert_eq!(fetch_lyrics(&Fixed(Some(" "), false), &track).await, LyricsOutcome::NotFound);
        let failed = fetch_lyrics(&Fixed(None, true), &track).await;
        assert_eq!(failed.into_text(), NOT_FOUND);
    }

    #[tokio::test]
    async fn test_found() {
        let track = CanonicalTrack::new("Coldplay", "Yellow");
        let got = fetch_lyrics(&Fixed(Some("Look at the stars"), false), &track).await;
        assert_eq!(got, LyricsOutcome::Found("Look at the stars".into()));
    }
}
