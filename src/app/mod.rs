pub mod events;
pub mod search;
pub mod state;

use crate::config::PlayerConfig;
use crate::player::{PlaybackCoordinator, PlayerBackend, ToggleOutcome};
use crate::providers::Providers;
use crate::providers::models::SearchQuery;
use crate::view;
use events::{Event, InputEvent, NetworkEvent, PlayerEvent};
use search::{Applied, SearchOrchestrator};
use state::SessionState;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc;

/// The single writer of session and playback state. Every network result,
/// player notification and user command is applied here, one at a time.
pub struct App<W: Write> {
    state: SessionState,
    search: SearchOrchestrator,
    playback: PlaybackCoordinator,
    out: W,
    should_quit: bool,
}

impl<W: Write> App<W> {
    pub fn new(
        providers: Providers,
        backend: Arc<dyn PlayerBackend>,
        player: &PlayerConfig,
        out: W,
    ) -> Self {
        Self {
            state: SessionState::new(),
            search: SearchOrchestrator::new(providers),
            playback: PlaybackCoordinator::new(backend, player),
            out,
            should_quit: false,
        }
    }

    pub async fn run(
        &mut self,
        tx: mpsc::Sender<Event>,
        mut rx: mpsc::Receiver<Event>,
        initial: Option<SearchQuery>,
    ) -> anyhow::Result<()> {
        match initial {
            Some(query) => self.submit(query, &tx),
            None => self.show(view::IDLE_PROMPT),
        }

        while let Some(ev) = rx.recv().await {
            self.handle(ev, &tx).await;
            if self.should_quit {
                break;
            }
        }

        self.playback.reset();
        Ok(())
    }

    async fn handle(&mut self, ev: Event, tx: &mpsc::Sender<Event>) {
        match ev {
            Event::Input(input) => self.handle_input(input, tx).await,
            Event::Network(ne) => self.handle_network(ne),
            Event::Player(pe) => self.handle_player(pe).await,
        }
    }

    fn submit(&mut self, query: SearchQuery, tx: &mpsc::Sender<Event>) {
        // A new search replaces the old track outright, audio included.
        self.playback.reset();
        self.search.submit(&mut self.state, query, tx);
        let status = self.state.status.clone();
        self.show(status);
    }

    async fn handle_input(&mut self, input: InputEvent, tx: &mpsc::Sender<Event>) {
        match input {
            InputEvent::Search(query) => self.submit(query, tx),
            InputEvent::Toggle => {
                if self.playback.toggle().await != ToggleOutcome::NotReady {
                    self.show_control();
                }
            }
            InputEvent::Quit => self.should_quit = true,
        }
    }

    fn handle_network(&mut self, ne: NetworkEvent) {
        match SearchOrchestrator::apply(&mut self.state, ne) {
            Some(Applied::Track) => {
                if let Some(track) = self.state.track.clone() {
                    self.show(view::header(&track));
                }
            }
            Some(Applied::Lyrics) => {
                if let Some(lyrics) = view::lyrics(&self.state).map(str::to_string) {
                    self.show(format!("\n{lyrics}\n"));
                }
            }
            Some(Applied::Video(Some(video_id))) => {
                self.playback.load(&video_id);
                if let Some(artwork) = view::artwork(&self.state) {
                    self.show(artwork);
                }
                self.show_control();
            }
            Some(Applied::Video(None)) | None => {}
        }
    }

    async fn handle_player(&mut self, pe: PlayerEvent) {
        if self.playback.handle(pe).await {
            self.show_control();
        }
    }

    fn show_control(&mut self) {
        if let Some(control) = view::control(self.playback.phase()) {
            self.show(control);
        }
    }

    fn show(&mut self, text: impl std::fmt::Display) {
        let _ = writeln!(self.out, "{text}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults;
    use crate::player::coordinator::tests::{FakeBackend, FakeHandle};
    use crate::player::{InstanceTag, PlayStatus, PlaybackPhase, Surface};
    use crate::providers::models::VideoMatch;
    use events::PlayerEventKind;
    use search::tests::FakeProviders;
    use std::time::Duration;

    fn app(fake: FakeProviders) -> (App<Vec<u8>>, Arc<FakeBackend>) {
        let (providers, _) = fake.into_providers();
        let backend = Arc::new(FakeBackend::default());
        let app = App::new(providers, backend.clone(), &defaults::defaults().player, Vec::new());
        (app, backend)
    }

    fn video() -> VideoMatch {
        VideoMatch {
            video_id: "yKNxeF4KMsY".into(),
            artwork_url: None,
        }
    }

    async fn step(app: &mut App<Vec<u8>>, rx: &mut mpsc::Receiver<Event>, tx: &mpsc::Sender<Event>) {
        let ev = rx.recv().await.unwrap();
        app.handle(ev, tx).await;
    }

    #[tokio::test]
    async fn test_search_renders_header_and_loads_player() {
        let (mut app, backend) = app(FakeProviders {
            resolved: Some(crate::providers::models::CanonicalTrack::new("Coldplay", "Yellow")),
            lyrics: Some("Look at the stars".into()),
            video: Some(video()),
            ..Default::default()
        });
        let (tx, mut rx) = mpsc::channel(64);

        app.submit(SearchQuery::new("coldplay", "yelo"), &tx);
        for _ in 0..3 {
            step(&mut app, &mut rx, &tx).await;
        }

        let out = String::from_utf8(app.out.clone()).unwrap();
        assert!(out.contains("YELLOW\nColdplay"));
        assert!(out.contains("Look at the stars"));
        assert_eq!(app.playback.phase(), PlaybackPhase::Loading);
        assert_eq!(backend.mounts.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_search_supersedes_old() {
        let (mut app, backend) = app(FakeProviders {
            lyrics_echo: true,
            video: Some(video()),
            lyrics_delay: Duration::from_millis(200),
            video_delay: Duration::from_millis(10),
            ..Default::default()
        });
        let (tx, mut rx) = mpsc::channel(64);

        app.submit(SearchQuery::new("old", "song"), &tx);
        step(&mut app, &mut rx, &tx).await; // track
        step(&mut app, &mut rx, &tx).await; // video
        assert_eq!(app.playback.phase(), PlaybackPhase::Loading);
        let handle = Arc::new(FakeHandle::default());
        app.handle(
            Event::Player(PlayerEvent {
                tag: InstanceTag { load: 1, surface: Surface::Silent },
                kind: PlayerEventKind::Ready(handle.clone()),
            }),
            &tx,
        )
        .await;
        assert!(app.playback.is_playing());

        app.submit(SearchQuery::new("new", "song"), &tx);
        assert!(app.state.media.lyrics.is_none());
        assert_eq!(app.playback.phase(), PlaybackPhase::Idle);

        // The first search's lyrics land first and must be dropped.
        while app.state.media.lyrics.is_none() {
            step(&mut app, &mut rx, &tx).await;
        }
        assert_eq!(app.state.media.lyrics.as_deref(), Some("new song"));
        assert_eq!(
            app.state.track.as_deref(),
            Some(&crate::providers::models::CanonicalTrack::new("new", "song"))
        );
        assert_eq!(backend.mounts.lock().unwrap().len(), 4);

        // Late notification from the first video's instance changes nothing.
        app.handle(
            Event::Player(PlayerEvent {
                tag: InstanceTag { load: 1, surface: Surface::Silent },
                kind: PlayerEventKind::Status(PlayStatus::Paused),
            }),
            &tx,
        )
        .await;
        assert_eq!(app.playback.phase(), PlaybackPhase::Loading);
    }

    #[tokio::test]
    async fn test_toggle_before_ready_and_quit() {
        let (mut app, _) = app(FakeProviders::default());
        let (tx, _rx) = mpsc::channel(8);

        app.handle(Event::Input(InputEvent::Toggle), &tx).await;
        assert_eq!(app.playback.phase(), PlaybackPhase::Idle);
        assert!(app.out.is_empty());

        app.handle(Event::Input(InputEvent::Quit), &tx).await;
        assert!(app.should_quit);
    }
}
