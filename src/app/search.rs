//! Search lifecycle: resolve the track, then fetch lyrics and video side by
//! side.
//!
//! The event loop owns [`SessionState`]. A submitted search bumps the
//! generation and clears the old media synchronously; the network work runs
//! in a spawned task that reports back through the event channel, tagging
//! every result with its generation. Results for anything but the current
//! generation are dropped in [`SearchOrchestrator::apply`].

use super::events::{Event, NetworkEvent};
use super::state::SessionState;
use crate::lyrics::fetch_lyrics;
use crate::providers::models::{Generation, SearchQuery};
use crate::providers::{Providers, fetch_video, resolve};
use std::sync::Arc;
use tokio::sync::mpsc;

/// What an applied network result changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Track,
    Lyrics,
    /// Carries the new video id, `None` when no video was found.
    Video(Option<String>),
}

pub struct SearchOrchestrator {
    providers: Providers,
}

impl SearchOrchestrator {
    pub fn new(providers: Providers) -> Self {
        Self { providers }
    }

    /// Start a new search, superseding any in flight.
    pub fn submit(
        &self,
        state: &mut SessionState,
        query: SearchQuery,
        tx: &mpsc::Sender<Event>,
    ) -> Generation {
        let generation = state.begin_search(&query);
        tracing::info!(%generation, artist = %query.raw_artist, song = %query.raw_song, "search submitted");
        tokio::spawn(run_search(
            self.providers.clone(),
            generation,
            query,
            tx.clone(),
        ));
        generation
    }

    /// Fold one result into the session, unless it belongs to a superseded
    /// search.
    pub fn apply(state: &mut SessionState, event: NetworkEvent) -> Option<Applied> {
        let generation = event.generation();
        if !state.is_current(generation) {
            tracing::debug!(%generation, current = %state.generation, "discarding stale search result");
            return None;
        }

        match event {
            NetworkEvent::TrackResolved { track, resolved, .. } => {
                state.status = if resolved {
                    format!("{} - {}", track.artist, track.title)
                } else {
                    format!("{} - {} (unresolved)", track.artist, track.title)
                };
                state.track = Some(track);
                Some(Applied::Track)
            }
            NetworkEvent::LyricsLoaded { lyrics, .. } => {
                state.media.lyrics = Some(lyrics.into_text());
                Some(Applied::Lyrics)
            }
            NetworkEvent::VideoLocated { video, .. } => match video {
                Some(video) => {
                    state.media.video_id = Some(video.video_id.clone());
                    state.media.artwork_url = video.artwork_url;
                    Some(Applied::Video(Some(video.video_id)))
                }
                None => Some(Applied::Video(None)),
            },
        }
    }
}

/// The network half of one search.
///
/// The canonical track is sent before either fetcher starts, and both
/// fetchers receive that same track. Each fetcher reports as soon as it
/// finishes; neither waits on the other.
pub async fn run_search(
    providers: Providers,
    generation: Generation,
    query: SearchQuery,
    tx: mpsc::Sender<Event>,
) {
    let (track, resolved) = match resolve(providers.metadata.as_ref(), &query).await {
        Some(track) => (track, true),
        None => (query.as_canonical(), false),
    };
    let track = Arc::new(track);

    let published = tx
        .send(Event::Network(NetworkEvent::TrackResolved {
            generation,
            track: track.clone(),
            resolved,
        }))
        .await;
    if published.is_err() {
        return;
    }

    let lyrics = async {
        let lyrics = fetch_lyrics(providers.lyrics.as_ref(), &track).await;
        let _ = tx
            .send(Event::Network(NetworkEvent::LyricsLoaded { generation, lyrics }))
            .await;
    };
    let video = async {
        let video = fetch_video(providers.video.as_ref(), &track).await;
        let _ = tx
            .send(Event::Network(NetworkEvent::VideoLocated { generation, video }))
            .await;
    };
    tokio::join!(lyrics, video);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::lyrics::{LyricsOutcome, NOT_FOUND};
    use crate::providers::models::{CanonicalTrack, VideoMatch};
    use crate::providers::{LyricsSource, MetadataSource, VideoSource};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records every call and answers after a fixed delay.
    #[derive(Default)]
    pub(crate) struct FakeProviders {
        pub resolved: Option<CanonicalTrack>,
        pub lyrics: Option<String>,
        pub lyrics_fail: bool,
        /// Answer with `"{artist} {title}"` instead of `lyrics`.
        pub lyrics_echo: bool,
        pub video: Option<VideoMatch>,
        pub resolve_delay: Duration,
        pub lyrics_delay: Duration,
        pub video_delay: Duration,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeProviders {
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn into_providers(self) -> (Providers, Arc<FakeProviders>) {
            let fake = Arc::new(self);
            let providers = Providers {
                metadata: fake.clone(),
                lyrics: fake.clone(),
                video: fake.clone(),
            };
            (providers, fake)
        }
    }

    #[async_trait]
    impl MetadataSource for FakeProviders {
        async fn search_song(&self, term: &str) -> Result<Option<CanonicalTrack>, ProviderError> {
            self.calls.lock().unwrap().push(format!("resolve:{term}"));
            tokio::time::sleep(self.resolve_delay).await;
            Ok(self.resolved.clone())
        }
    }

    #[async_trait]
    impl LyricsSource for FakeProviders {
        async fn lyrics(&self, artist: &str, title: &str) -> Result<Option<String>, ProviderError> {
            self.calls.lock().unwrap().push(format!("lyrics:{artist}|{title}"));
            tokio::time::sleep(self.lyrics_delay).await;
            if self.lyrics_fail {
                return Err(ProviderError::MissingApiKey("lyrics"));
            }
            if self.lyrics_echo {
                return Ok(Some(format!("{artist} {title}")));
            }
            Ok(self.lyrics.clone())
        }
    }

    #[async_trait]
    impl VideoSource for FakeProviders {
        async fn search_video(&self, query: &str) -> Result<Option<VideoMatch>, ProviderError> {
            self.calls.lock().unwrap().push(format!("video:{query}"));
            tokio::time::sleep(self.video_delay).await;
            Ok(self.video.clone())
        }
    }

    fn yellow_video() -> VideoMatch {
        VideoMatch {
            video_id: "yKNxeF4KMsY".into(),
            artwork_url: Some("https://i.ytimg.com/vi/yKNxeF4KMsY/hqdefault.jpg".into()),
        }
    }

    async fn collect(providers: Providers, query: SearchQuery) -> Vec<NetworkEvent> {
        let (tx, mut rx) = mpsc::channel(16);
        run_search(providers, Generation::default().next(), query, tx).await;
        let mut out = Vec::new();
        while let Ok(Event::Network(ev)) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[tokio::test]
    async fn test_resolved_track_feeds_both_fetchers() {
        let (providers, fake) = FakeProviders {
            resolved: Some(CanonicalTrack::new("Coldplay", "Yellow")),
            lyrics: Some("Look at the stars".into()),
            video: Some(yellow_video()),
            ..Default::default()
        }
        .into_providers();

        let events = collect(providers, SearchQuery::new("coldplay", "yelo")).await;

        let calls = fake.calls();
        assert_eq!(calls[0], "resolve:coldplay yelo");
        assert!(calls.contains(&"lyrics:Coldplay|Yellow".to_string()));
        assert!(calls.contains(&"video:Coldplay Yellow audio".to_string()));

        let NetworkEvent::TrackResolved { track, resolved, .. } = &events[0] else {
            panic!("track must be published first, got {:?}", events[0]);
        };
        assert!(*resolved);
        assert_eq!(**track, CanonicalTrack::new("Coldplay", "Yellow"));
        assert_eq!(events.len(), 3);
    }

    #[tokio::test]
    async fn test_unresolved_uses_raw_input_verbatim() {
        let (providers, fake) = FakeProviders::default().into_providers();

        let events = collect(providers, SearchQuery::new("xyz123", "qqq")).await;

        let NetworkEvent::TrackResolved { track, resolved, .. } = &events[0] else {
            panic!("expected track first");
        };
        assert!(!resolved);
        assert_eq!(**track, CanonicalTrack::new("xyz123", "qqq"));
        let calls = fake.calls();
        assert!(calls.contains(&"lyrics:xyz123|qqq".to_string()));
        assert!(calls.contains(&"video:xyz123 qqq audio".to_string()));
    }

    #[tokio::test]
    async fn test_lyrics_failure_does_not_block_video() {
        let (providers, _) = FakeProviders {
            lyrics_fail: true,
            video: Some(yellow_video()),
            ..Default::default()
        }
        .into_providers();

        let mut state = SessionState::new();
        state.begin_search(&SearchQuery::new("coldplay", "yellow"));
        for ev in collect(providers, SearchQuery::new("coldplay", "yellow")).await {
            SearchOrchestrator::apply(&mut state, ev);
        }
        assert_eq!(state.media.lyrics.as_deref(), Some(NOT_FOUND));
        assert_eq!(state.media.video_id.as_deref(), Some("yKNxeF4KMsY"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetchers_run_concurrently() {
        let (providers, _) = FakeProviders {
            lyrics: Some("la la".into()),
            video: Some(yellow_video()),
            resolve_delay: Duration::from_millis(50),
            lyrics_delay: Duration::from_millis(300),
            video_delay: Duration::from_millis(100),
            ..Default::default()
        }
        .into_providers();

        let start = tokio::time::Instant::now();
        let events = collect(providers, SearchQuery::new("a", "b")).await;
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_millis(350));
        assert!(elapsed < Duration::from_millis(450), "fetchers ran sequentially: {elapsed:?}");
        // Video finished first and was reported without waiting for lyrics.
        assert!(matches!(events[1], NetworkEvent::VideoLocated { .. }));
        assert!(matches!(events[2], NetworkEvent::LyricsLoaded { .. }));
    }

    #[test]
    fn test_stale_results_are_discarded() {
        let mut state = SessionState::new();
        let old = state.begin_search(&SearchQuery::new("old", "song"));
        let new = state.begin_search(&SearchQuery::new("new", "song"));

        let fresh = NetworkEvent::LyricsLoaded {
            generation: new,
            lyrics: LyricsOutcome::Found("new lyrics".into()),
        };
        assert_eq!(SearchOrchestrator::apply(&mut state, fresh), Some(Applied::Lyrics));

        let stale = [
            NetworkEvent::LyricsLoaded {
                generation: old,
                lyrics: LyricsOutcome::Found("old lyrics".into()),
            },
            NetworkEvent::VideoLocated {
                generation: old,
                video: Some(yellow_video()),
            },
            NetworkEvent::TrackResolved {
                generation: old,
                track: Arc::new(CanonicalTrack::new("Old", "Song")),
                resolved: true,
            },
        ];
        for ev in stale {
            assert_eq!(SearchOrchestrator::apply(&mut state, ev), None);
        }
        assert_eq!(state.media.lyrics.as_deref(), Some("new lyrics"));
        assert!(state.media.video_id.is_none());
        assert!(state.track.is_none());
    }

    #[test]
    fn test_missing_video_leaves_media_empty() {
        let mut state = SessionState::new();
        let generation = state.begin_search(&SearchQuery::new("a", "b"));
        let applied = SearchOrchestrator::apply(
            &mut state,
            NetworkEvent::VideoLocated {
                generation,
                video: None,
            },
        );
        assert_eq!(applied, Some(Applied::Video(None)));
        assert!(state.media.video_id.is_none());
        assert!(state.media.artwork_url.is_none());
    }
}
