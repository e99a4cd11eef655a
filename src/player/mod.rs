//! Embedded player instances and the coordinator that presents them as one
//! play/pause control.

pub mod coordinator;
pub mod mpv;
pub mod resolve;

pub use coordinator::{PlaybackCoordinator, PlaybackPhase, ToggleOutcome};

use crate::config::SurfaceOptions;
use async_trait::async_trait;

/// Which of the two instances mounted per video an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    /// Hidden, autoplaying.
    Silent,
    /// Bound to the on-screen control.
    Visible,
}

impl Surface {
    pub const ALL: [Surface; 2] = [Surface::Silent, Surface::Visible];

    pub fn label(self) -> &'static str {
        match self {
            Surface::Silent => "silent",
            Surface::Visible => "visible",
        }
    }
}

/// Identifies one mounted instance: the load sequence it was created for and
/// its surface. Events from an older load are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceTag {
    pub load: u64,
    pub surface: Surface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayStatus {
    Playing,
    Paused,
    Ended,
}

/// Controllable handle delivered with an instance's ready notification.
#[async_trait]
pub trait PlayerHandle: Send + Sync + std::fmt::Debug {
    async fn play(&self) -> anyhow::Result<()>;
    async fn pause(&self) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct MountRequest {
    pub tag: InstanceTag,
    pub video_id: String,
    pub options: SurfaceOptions,
}

/// Creates player instances.
pub trait PlayerBackend: Send + Sync {
    /// Start an instance for `request.video_id` and return immediately.
    /// Readiness, status changes and failures are reported later as
    /// [`crate::app::events::PlayerEvent`]s tagged with `request.tag`.
    fn mount(&self, request: MountRequest);
}
