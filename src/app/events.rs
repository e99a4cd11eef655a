use crate::lyrics::LyricsOutcome;
use crate::player::{InstanceTag, PlayStatus, PlayerHandle};
use crate::providers::models::{CanonicalTrack, Generation, SearchQuery, VideoMatch};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Event {
    Input(InputEvent),
    Network(NetworkEvent),
    Player(PlayerEvent),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Search(SearchQuery),
    Toggle,
    Quit,
}

/// Results of one search, each tagged with the generation it was started for.
#[derive(Debug, Clone)]
pub enum NetworkEvent {
    TrackResolved {
        generation: Generation,
        track: Arc<CanonicalTrack>,
        /// False when the raw input was used as-is.
        resolved: bool,
    },
    LyricsLoaded {
        generation: Generation,
        lyrics: LyricsOutcome,
    },
    VideoLocated {
        generation: Generation,
        video: Option<VideoMatch>,
    },
}

impl NetworkEvent {
    pub fn generation(&self) -> Generation {
        match self {
            NetworkEvent::TrackResolved { generation, .. }
            | NetworkEvent::LyricsLoaded { generation, .. }
            | NetworkEvent::VideoLocated { generation, .. } => *generation,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlayerEvent {
    pub tag: InstanceTag,
    pub kind: PlayerEventKind,
}

#[derive(Debug, Clone)]
pub enum PlayerEventKind {
    Ready(Arc<dyn PlayerHandle>),
    Status(PlayStatus),
    Error(String),
}
