use crate::providers::models::{CanonicalTrack, Generation, SearchQuery, TrackMedia};
use std::sync::Arc;

/// Everything shown for the current search. Written only by the event loop.
#[derive(Debug, Default)]
pub struct SessionState {
    pub generation: Generation,
    /// Published before either fetcher starts.
    pub track: Option<Arc<CanonicalTrack>>,
    pub media: TrackMedia,
    pub status: String,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supersede the previous search. Lyrics and all other media are gone
    /// before this returns.
    pub fn begin_search(&mut self, query: &SearchQuery) -> Generation {
        self.generation = self.generation.next();
        self.media.clear();
        self.track = None;
        self.status = format!("Searching: {} {}", query.raw_artist, query.raw_song);
        self.generation
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation == self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_search_supersedes() {
        let mut state = SessionState::new();
        let first = state.begin_search(&SearchQuery::new("a", "b"));
        state.media.lyrics = Some("old lyrics".into());
        state.media.video_id = Some("old".into());
        state.track = Some(Arc::new(CanonicalTrack::new("A", "B")));

        let second = state.begin_search(&SearchQuery::new("c", "d"));
        assert!(second > first);
        assert!(!state.is_current(first));
        assert!(state.is_current(second));
        assert_eq!(state.status, "Searching: c d");
        assert_eq!(state.media, TrackMedia::default());
        assert!(state.track.is_none());
    }
}
