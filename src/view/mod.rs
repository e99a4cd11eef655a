//! Plain-text rendering of the session for the terminal.

use crate::app::state::SessionState;
use crate::player::PlaybackPhase;
use crate::providers::models::CanonicalTrack;

pub const IDLE_PROMPT: &str = "START YOUR SEARCH";

/// Title upper-cased over the artist.
pub fn header(track: &CanonicalTrack) -> String {
    format!("{}\n{}", track.title.to_uppercase(), track.artist)
}

/// Lyrics only once they are in; nothing while loading.
pub fn lyrics(state: &SessionState) -> Option<&str> {
    state.media.lyrics.as_deref().filter(|l| !l.is_empty())
}

/// The play/pause control only exists once a video has been found.
pub fn control(phase: PlaybackPhase) -> Option<&'static str> {
    match phase {
        PlaybackPhase::Idle => None,
        PlaybackPhase::Loading => Some("[ .. ] loading"),
        PlaybackPhase::ReadyPaused => Some("[ >  ] paused"),
        PlaybackPhase::ReadyPlaying => Some("[ || ] playing"),
    }
}

pub fn artwork(state: &SessionState) -> Option<String> {
    state
        .media
        .artwork_url
        .as_deref()
        .map(|url| format!("artwork: {url}"))
}

/// Full snapshot, used by the headless `lookup` command.
pub fn snapshot(state: &SessionState) -> String {
    let Some(track) = &state.track else {
        return IDLE_PROMPT.to_string();
    };
    let mut out = header(track);
    if let Some(lyrics) = lyrics(state) {
        out.push_str("\n\n");
        out.push_str(lyrics);
    }
    if let Some(video_id) = &state.media.video_id {
        out.push_str(&format!("\n\nvideo: {video_id}"));
    }
    if let Some(artwork) = artwork(state) {
        out.push('\n');
        out.push_str(&artwork);
    }
    out
}
