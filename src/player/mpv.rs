use super::{
    InstanceTag, MountRequest, PlayStatus, PlayerBackend, PlayerHandle, Surface,
    resolve::resolve_audio_url,
};
use crate::app::events::{Event, PlayerEvent, PlayerEventKind};
use crate::config::{PlayerConfig, SurfaceOptions};
use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader},
    net::UnixStream,
    process::{Child, Command},
    sync::{Mutex, OnceCell, mpsc, oneshot},
};

/// Outcome of the first file load: `Err` carries mpv's reason.
type LoadResult = Result<(), String>;

/// Mounts each player instance as its own mpv process.
#[derive(Debug, Clone)]
pub struct MpvBackend {
    cfg: Arc<PlayerConfig>,
    event_tx: mpsc::Sender<Event>,
    streams: Arc<StreamCache>,
}

impl MpvBackend {
    pub fn new(cfg: PlayerConfig, event_tx: mpsc::Sender<Event>) -> Self {
        Self {
            cfg: Arc::new(cfg),
            event_tx,
            streams: Arc::new(StreamCache::default()),
        }
    }
}

impl PlayerBackend for MpvBackend {
    fn mount(&self, request: MountRequest) {
        let cfg = self.cfg.clone();
        let event_tx = self.event_tx.clone();
        let streams = self.streams.clone();
        tokio::spawn(async move {
            let tag = request.tag;
            if let Err(e) = mount_instance(&cfg, &streams, request, event_tx.clone()).await {
                let _ = event_tx
                    .send(Event::Player(PlayerEvent {
                        tag,
                        kind: PlayerEventKind::Error(format!("{e:#}")),
                    }))
                    .await;
            }
        });
    }
}

/// Stream URL of the current load, shared by both of its instances so
/// yt-dlp runs once per video.
#[derive(Debug, Default)]
struct StreamCache {
    current: Mutex<Option<(u64, Arc<OnceCell<String>>)>>,
}

impl StreamCache {
    async fn cell(&self, load: u64) -> Arc<OnceCell<String>> {
        let mut current = self.current.lock().await;
        match current.as_ref() {
            Some((l, cell)) if *l == load => cell.clone(),
            _ => {
                let cell = Arc::new(OnceCell::new());
                *current = Some((load, cell.clone()));
                cell
            }
        }
    }
}

async fn mount_instance(
    cfg: &PlayerConfig,
    streams: &StreamCache,
    request: MountRequest,
    event_tx: mpsc::Sender<Event>,
) -> anyhow::Result<()> {
    let tag = request.tag;
    let cell = streams.cell(tag.load).await;
    let url = cell
        .get_or_try_init(|| resolve_audio_url(&cfg.ytdlp_path, &request.video_id))
        .await?
        .clone();

    // The handle lives on this stack until ready; any error below drops it,
    // which kills the process.
    let (handle, loaded) = MpvHandle::spawn(cfg, tag, request.options, event_tx.clone()).await?;
    handle.load_url(&url).await?;

    // No timeout: readiness may take arbitrarily long.
    loaded
        .await
        .context("mpv went away before the file loaded")?
        .map_err(anyhow::Error::msg)?;

    tracing::debug!(surface = tag.surface.label(), load = tag.load, "mpv instance ready");
    event_tx
        .send(Event::Player(PlayerEvent {
            tag,
            kind: PlayerEventKind::Ready(Arc::new(handle)),
        }))
        .await
        .map_err(|_| anyhow::anyhow!("event loop closed"))?;
    Ok(())
}

#[derive(Debug)]
pub struct MpvHandle {
    child: Child,
    socket_path: PathBuf,
    writer: Mutex<tokio::io::WriteHalf<UnixStream>>,
    request_id: AtomicU64,
    /// Set while mpv sits paused on the last frame (`--keep-open`).
    at_eof: Arc<AtomicBool>,
}

impl MpvHandle {
    /// Spawn an idle mpv and connect to its IPC socket. The receiver fires
    /// once the first file has loaded or failed to.
    pub async fn spawn(
        cfg: &PlayerConfig,
        tag: InstanceTag,
        options: SurfaceOptions,
        event_tx: mpsc::Sender<Event>,
    ) -> anyhow::Result<(Self, oneshot::Receiver<LoadResult>)> {
        let socket_path = std::env::temp_dir().join(format!(
            "vinyl-mpv-{}-{}-{}.sock",
            std::process::id(),
            tag.load,
            tag.surface.label()
        ));
        let _ = std::fs::remove_file(&socket_path);

        let child = Command::new(&cfg.mpv_path)
            .args(mpv_args(cfg, tag.surface, options))
            .arg(format!("--input-ipc-server={}", socket_path.display()))
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .context("spawn mpv")?;

        // Connect (mpv creates the socket shortly after starting).
        let stream = connect_with_retry(&socket_path).await?;
        let (reader, writer) = tokio::io::split(stream);

        let at_eof = Arc::new(AtomicBool::new(false));
        let (loaded_tx, loaded_rx) = oneshot::channel();
        tokio::spawn(read_events_loop(reader, tag, loaded_tx, at_eof.clone(), event_tx));

        let this = Self {
            child,
            socket_path,
            writer: Mutex::new(writer),
            request_id: AtomicU64::new(1),
            at_eof,
        };

        this.command(json!({"command":["request_log_messages", "warn"]}))
            .await?;
        this.command(json!({"command":["observe_property", 1, "pause"]}))
            .await?;
        this.command(json!({"command":["observe_property", 2, "eof-reached"]}))
            .await?;

        Ok((this, loaded_rx))
    }

    async fn load_url(&self, url: &str) -> anyhow::Result<()> {
        self.command(json!({"command":["loadfile", url, "replace"]}))
            .await
    }

    async fn command(&self, mut v: serde_json::Value) -> anyhow::Result<()> {
        // Tag requests so we can get structured errors back on the IPC stream.
        if v.get("request_id").is_none() {
            let id = self.request_id.fetch_add(1, Ordering::Relaxed);
            if let serde_json::Value::Object(ref mut o) = v {
                o.insert("request_id".to_string(), serde_json::Value::from(id));
            }
        }
        let mut w = self.writer.lock().await;
        let mut line = serde_json::to_vec(&v).context("encode mpv json")?;
        line.push(b'\n');
        w.write_all(&line).await.context("write mpv ipc")?;
        w.flush().await.context("flush mpv ipc")?;
        Ok(())
    }
}

#[async_trait]
impl PlayerHandle for MpvHandle {
    async fn play(&self) -> anyhow::Result<()> {
        for cmd in play_commands(self.at_eof.load(Ordering::Relaxed)) {
            self.command(cmd).await?;
        }
        Ok(())
    }

    async fn pause(&self) -> anyhow::Result<()> {
        self.command(json!({"command":["set_property", "pause", true]}))
            .await
    }
}

/// Unpausing at the end of a kept-open file does nothing, so start over.
fn play_commands(at_eof: bool) -> Vec<serde_json::Value> {
    let mut cmds = Vec::with_capacity(2);
    if at_eof {
        cmds.push(json!({"command":["seek", 0, "absolute"]}));
    }
    cmds.push(json!({"command":["set_property", "pause", false]}));
    cmds
}

impl Drop for MpvHandle {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

fn mpv_args(cfg: &PlayerConfig, surface: Surface, options: SurfaceOptions) -> Vec<String> {
    let mut args: Vec<String> = [
        "--idle=yes",
        "--keep-open=yes",
        "--input-terminal=no",
        "--really-quiet",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    match surface {
        Surface::Silent => args.push("--no-video".into()),
        Surface::Visible => args.push("--force-window=yes".into()),
    }
    if !options.autoplay {
        args.push("--pause=yes".into());
    }
    if !options.controls {
        args.push("--osc=no".into());
    }
    if !options.keyboard {
        args.push("--no-input-default-bindings".into());
    }
    if options.fullscreen && !options.inline {
        args.push("--fullscreen=yes".into());
    }
    if let Some(dev) = &cfg.audio_device {
        args.push(format!("--audio-device={dev}"));
    }
    args.push(format!("--volume={}", cfg.volume.min(100)));
    args
}

async fn connect_with_retry(path: &PathBuf) -> anyhow::Result<UnixStream> {
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
    loop {
        match UnixStream::connect(path).await {
            Ok(s) => return Ok(s),
            Err(e) => {
                if tokio::time::Instant::now() > deadline {
                    return Err(e).with_context(|| format!("connect to mpv ipc {}", path.display()));
                }
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
        }
    }
}

async fn read_events_loop<R: AsyncRead + Unpin>(
    reader: R,
    tag: InstanceTag,
    loaded_tx: oneshot::Sender<LoadResult>,
    at_eof: Arc<AtomicBool>,
    event_tx: mpsc::Sender<Event>,
) {
    let mut loaded_tx = Some(loaded_tx);
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let Ok(v) = serde_json::from_str::<serde_json::Value>(&line) else {
            continue;
        };
        let kind = match map_mpv_event(&v) {
            Some(MpvSignal::FileLoaded) => {
                at_eof.store(false, Ordering::Relaxed);
                if let Some(tx) = loaded_tx.take() {
                    let _ = tx.send(Ok(()));
                }
                None
            }
            // Before the first load this is reported through the mount
            // instead, which then tears the instance down.
            Some(MpvSignal::LoadFailed(e)) => match loaded_tx.take() {
                Some(tx) => {
                    let _ = tx.send(Err(e));
                    None
                }
                None => Some(PlayerEventKind::Error(e)),
            },
            Some(MpvSignal::EndReached(eof)) => {
                at_eof.store(eof, Ordering::Relaxed);
                (eof && loaded_tx.is_none()).then_some(PlayerEventKind::Status(PlayStatus::Ended))
            }
            // The pause property is reported as soon as it is observed; only
            // status after the file has loaded means anything.
            Some(MpvSignal::Status(status)) if loaded_tx.is_none() => {
                Some(PlayerEventKind::Status(status))
            }
            Some(MpvSignal::Status(_)) => None,
            Some(MpvSignal::Error(e)) => Some(PlayerEventKind::Error(e)),
            None => None,
        };
        if let Some(kind) = kind
            && event_tx
                .send(Event::Player(PlayerEvent { tag, kind }))
                .await
                .is_err()
        {
            break;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum MpvSignal {
    FileLoaded,
    LoadFailed(String),
    /// `eof-reached` changed.
    EndReached(bool),
    Status(PlayStatus),
    Error(String),
}

fn map_mpv_event(v: &serde_json::Value) -> Option<MpvSignal> {
    // mpv command replies: {"request_id":..., "error":"..."}
    if let (Some(_rid), Some(err)) = (v.get("request_id"), v.get("error"))
        && let Some(err_s) = err.as_str()
        && err_s != "success"
    {
        return Some(MpvSignal::Error(format!("mpv ipc error: {err_s}")));
    }

    match v.get("event")?.as_str()? {
        "file-loaded" => Some(MpvSignal::FileLoaded),
        "property-change" => match v.get("name")?.as_str()? {
            "pause" => {
                let paused = v.get("data")?.as_bool().unwrap_or(false);
                Some(MpvSignal::Status(if paused {
                    PlayStatus::Paused
                } else {
                    PlayStatus::Playing
                }))
            }
            "eof-reached" => Some(MpvSignal::EndReached(
                v.get("data").and_then(|d| d.as_bool()).unwrap_or(false),
            )),
            _ => None,
        },
        "end-file" => {
            // When mpv fails to play the stream, end-file comes with reason=error and an "error" string.
            match v.get("reason").and_then(|x| x.as_str()).unwrap_or("") {
                "error" => {
                    let err = v.get("error").and_then(|x| x.as_str()).unwrap_or("unknown");
                    Some(MpvSignal::LoadFailed(format!("mpv end-file error: {err}")))
                }
                "eof" => Some(MpvSignal::Status(PlayStatus::Ended)),
                _ => None,
            }
        }
        "log-message" => {
            let level = v.get("level")?.as_str().unwrap_or("info");
            let text = v.get("text")?.as_str().unwrap_or("").trim();
            if (level == "warn" || level == "error") && !text.is_empty() {
                Some(MpvSignal::Error(format!("mpv {level}: {text}")))
            } else {
                None
            }
        }
        _ => None,
    }
}
