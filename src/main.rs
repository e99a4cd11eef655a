mod app;
mod config;
mod error;
mod input;
mod lyrics;
mod player;
mod providers;
mod view;

use anyhow::Context;
use app::events::Event;
use app::search::SearchOrchestrator;
use app::state::SessionState;
use clap::{Parser, Subcommand};
use providers::Providers;
use providers::models::SearchQuery;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "vinyl", version, about = "Look up a song, read its lyrics, hear it")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive session on stdin (default).
    Play {
        artist: Option<String>,
        song: Option<String>,
    },
    /// Resolve, fetch lyrics and locate a video, then print (headless).
    Lookup { artist: String, song: String },
    /// Print the canonical artist and title only (headless).
    Resolve { artist: String, song: String },
    /// List mpv audio devices.
    AudioDevices,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    match cli.command.unwrap_or(Command::Play {
        artist: None,
        song: None,
    }) {
        Command::Play { artist, song } => {
            let providers = Providers::from_config(&cfg)?;
            let initial = match (artist, song) {
                (Some(artist), Some(song)) => Some(SearchQuery::new(artist, song)),
                (Some(_), None) => anyhow::bail!("give both an artist and a song, or neither"),
                _ => None,
            };

            let (tx, rx) = mpsc::channel::<Event>(256);
            let backend = Arc::new(player::mpv::MpvBackend::new(cfg.player.clone(), tx.clone()));
            let mut app = app::App::new(providers, backend, &cfg.player, std::io::stdout());
            input::spawn_input_task(tx.clone());
            app.run(tx, rx, initial).await?;
        }
        Command::Lookup { artist, song } => {
            let providers = Providers::from_config(&cfg)?;
            let mut state = SessionState::new();
            let query = SearchQuery::new(artist, song);
            let generation = state.begin_search(&query);

            let (tx, mut rx) = mpsc::channel::<Event>(16);
            tokio::spawn(app::search::run_search(providers, generation, query, tx));
            while let Some(ev) = rx.recv().await {
                if let Event::Network(ne) = ev {
                    SearchOrchestrator::apply(&mut state, ne);
                }
            }
            println!("{}", view::snapshot(&state));
        }
        Command::Resolve { artist, song } => {
            let sources = Providers::from_config(&cfg)?;
            let query = SearchQuery::new(artist, song);
            let track = providers::resolve(sources.metadata.as_ref(), &query)
                .await
                .unwrap_or_else(|| query.as_canonical());
            println!("{}", view::header(&track));
        }
        Command::AudioDevices => {
            let out = tokio::process::Command::new(&cfg.player.mpv_path)
                .args(["--audio-device=help", "--no-video", "--idle=no"])
                .output()
                .await
                .with_context(|| format!("run {} --audio-device=help", cfg.player.mpv_path))?;
            // mpv prints help to stdout.
            print!("{}", String::from_utf8_lossy(&out.stdout));
            eprint!("{}", String::from_utf8_lossy(&out.stderr));
        }
    }

    Ok(())
}
