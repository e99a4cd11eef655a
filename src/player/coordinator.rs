//! One logical play/pause state over two player instances.
//!
//! Each video gets two instances (silent and visible), each reporting status
//! on its own schedule. The coordinator keeps a single `playing` flag:
//!
//! - `Idle` until a video id is loaded, then `Loading`.
//! - The first ready instance moves it to `ReadyPlaying` (ready implies an
//!   autoplay attempt).
//! - After that the last status notification from either instance wins.
//! - `toggle()` flips the flag immediately and commands every ready
//!   instance, so rapid toggles alternate even before any notification.
//!
//! Commands we issued are remembered per instance until the matching
//! notification arrives. A notification that only acknowledges an older
//! command, while a newer one is still outstanding on that instance, is not
//! allowed to roll the flag back.

use super::{
    InstanceTag, MountRequest, PlayStatus, PlayerBackend, PlayerHandle, Surface,
};
use crate::app::events::{PlayerEvent, PlayerEventKind};
use crate::config::{PlayerConfig, SurfaceOptions};
use crate::error::Degraded;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    Idle,
    Loading,
    ReadyPaused,
    ReadyPlaying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Play,
    Pause,
    NotReady,
}

#[derive(Debug)]
struct ReadyInstance {
    surface: Surface,
    handle: Arc<dyn PlayerHandle>,
    pending: VecDeque<PlayStatus>,
}

impl ReadyInstance {
    async fn command(&mut self, play: bool) {
        let expected = if play {
            PlayStatus::Playing
        } else {
            PlayStatus::Paused
        };
        self.pending.push_back(expected);
        let result = if play {
            self.handle.play().await
        } else {
            self.handle.pause().await
        };
        if let Err(e) = result {
            // No notification will follow a command that never went out.
            self.pending.pop_back();
            tracing::warn!(surface = self.surface.label(), "player command failed: {e:#}");
        }
    }

    /// Whether `status` should update the shared flag.
    fn accept(&mut self, status: PlayStatus) -> bool {
        match self.pending.front() {
            Some(&expected) if expected == status => {
                self.pending.pop_front();
                self.pending.is_empty()
            }
            Some(_) => {
                self.pending.clear();
                true
            }
            None => true,
        }
    }
}

#[derive(Debug)]
struct LoadedVideo {
    video_id: String,
    load: u64,
    /// In ready order; never holds two instances of one surface.
    ready: Vec<ReadyInstance>,
    playing: bool,
}

pub struct PlaybackCoordinator {
    backend: Arc<dyn PlayerBackend>,
    silent: SurfaceOptions,
    visible: SurfaceOptions,
    load_seq: u64,
    current: Option<LoadedVideo>,
}

impl PlaybackCoordinator {
    pub fn new(backend: Arc<dyn PlayerBackend>, cfg: &PlayerConfig) -> Self {
        Self {
            backend,
            silent: cfg.silent,
            visible: cfg.visible,
            load_seq: 0,
            current: None,
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        match &self.current {
            None => PlaybackPhase::Idle,
            Some(v) if v.ready.is_empty() => PlaybackPhase::Loading,
            Some(v) if v.playing => PlaybackPhase::ReadyPlaying,
            Some(_) => PlaybackPhase::ReadyPaused,
        }
    }

    #[cfg(test)]
    pub fn is_playing(&self) -> bool {
        self.phase() == PlaybackPhase::ReadyPlaying
    }

    #[cfg(test)]
    pub fn video_id(&self) -> Option<&str> {
        self.current.as_ref().map(|v| v.video_id.as_str())
    }

    /// Drop everything for the current video and go back to `Idle`.
    pub fn reset(&mut self) {
        if let Some(old) = self.current.take() {
            tracing::debug!(video_id = %old.video_id, "playback reset");
        }
    }

    /// Start loading a new video, superseding whatever was loaded.
    pub fn load(&mut self, video_id: &str) {
        self.load_seq += 1;
        let load = self.load_seq;
        self.current = Some(LoadedVideo {
            video_id: video_id.to_string(),
            load,
            ready: Vec::new(),
            playing: false,
        });
        tracing::info!(%video_id, load, "loading player instances");

        for surface in Surface::ALL {
            let options = match surface {
                Surface::Silent => self.silent,
                Surface::Visible => self.visible,
            };
            self.backend.mount(MountRequest {
                tag: InstanceTag { load, surface },
                video_id: video_id.to_string(),
                options,
            });
        }
    }

    /// Apply one instance notification. Returns whether the phase changed.
    pub async fn handle(&mut self, event: PlayerEvent) -> bool {
        let PlayerEvent { tag, kind } = event;
        let before = self.phase();
        let Some(video) = self.current.as_mut().filter(|v| v.load == tag.load) else {
            tracing::debug!(load = tag.load, surface = tag.surface.label(), "discarding stale player event");
            return false;
        };

        match kind {
            PlayerEventKind::Ready(handle) => {
                if video.ready.iter().any(|i| i.surface == tag.surface) {
                    tracing::debug!(surface = tag.surface.label(), "duplicate ready ignored");
                    return false;
                }
                // The first instance starts playback; later ones follow the
                // shared flag.
                let play = video.ready.is_empty() || video.playing;
                video.playing = play;
                let mut instance = ReadyInstance {
                    surface: tag.surface,
                    handle,
                    pending: VecDeque::new(),
                };
                instance.command(play).await;
                video.ready.push(instance);
            }
            PlayerEventKind::Status(status) => {
                let any_ready = !video.ready.is_empty();
                match video.ready.iter_mut().find(|i| i.surface == tag.surface) {
                    Some(instance) => {
                        if !instance.accept(status) {
                            tracing::debug!(?status, "acknowledgement of a superseded command");
                            return false;
                        }
                    }
                    None if !any_ready => {
                        tracing::debug!(?status, "status before any instance is ready");
                        return false;
                    }
                    None => {}
                }
                video.playing = status == PlayStatus::Playing;
            }
            PlayerEventKind::Error(e) => {
                tracing::warn!(surface = tag.surface.label(), "player instance error: {e}");
            }
        }

        self.phase() != before
    }

    /// Flip play/pause on every ready instance.
    pub async fn toggle(&mut self) -> ToggleOutcome {
        let Some(video) = self.current.as_mut().filter(|v| !v.ready.is_empty()) else {
            tracing::warn!("{}", Degraded::PlayerNotReady);
            return ToggleOutcome::NotReady;
        };

        let play = !video.playing;
        video.playing = play;
        for instance in &mut video.ready {
            instance.command(play).await;
        }
        if play {
            ToggleOutcome::Play
        } else {
            ToggleOutcome::Pause
        }
    }
}
