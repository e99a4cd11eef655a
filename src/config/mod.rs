use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Path, PathBuf};

pub mod defaults;

/// Environment variable that overrides `youtube.api_key`.
pub const API_KEY_ENV: &str = "YOUTUBE_API_KEY";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub providers: ProvidersConfig,
    pub youtube: YoutubeConfig,
    pub player: PlayerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// iTunes-compatible song search endpoint.
    pub metadata_url: String,
    /// lyrics.ovh-compatible `/{artist}/{title}` base.
    pub lyrics_url: String,
    /// YouTube Data API v3 search endpoint.
    pub video_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// mpv binary to launch for each player instance.
    pub mpv_path: String,
    /// yt-dlp binary used to turn a video id into a stream URL.
    pub ytdlp_path: String,
    /// mpv audio device name (see `mpv --audio-device=help`)
    pub audio_device: Option<String>,
    /// Volume level (0-100)
    pub volume: u8,
    /// Hidden instance that starts the audio on its own.
    #[serde(deserialize_with = "silent_options")]
    pub silent: SurfaceOptions,
    /// Instance bound to the on-screen control.
    #[serde(deserialize_with = "visible_options")]
    pub visible: SurfaceOptions,
}

/// Options bag handed to the player for one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceOptions {
    pub autoplay: bool,
    pub inline: bool,
    pub controls: bool,
    pub keyboard: bool,
    pub fullscreen: bool,
}

/// A `[player.silent]` / `[player.visible]` table. Flags left out keep the
/// surface's built-in value.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SurfaceOverrides {
    autoplay: Option<bool>,
    inline: Option<bool>,
    controls: Option<bool>,
    keyboard: Option<bool>,
    fullscreen: Option<bool>,
}

impl SurfaceOverrides {
    fn over(self, base: SurfaceOptions) -> SurfaceOptions {
        SurfaceOptions {
            autoplay: self.autoplay.unwrap_or(base.autoplay),
            inline: self.inline.unwrap_or(base.inline),
            controls: self.controls.unwrap_or(base.controls),
            keyboard: self.keyboard.unwrap_or(base.keyboard),
            fullscreen: self.fullscreen.unwrap_or(base.fullscreen),
        }
    }
}

fn silent_options<'de, D: Deserializer<'de>>(d: D) -> Result<SurfaceOptions, D::Error> {
    Ok(SurfaceOverrides::deserialize(d)?.over(defaults::SILENT))
}

fn visible_options<'de, D: Deserializer<'de>>(d: D) -> Result<SurfaceOptions, D::Error> {
    Ok(SurfaceOverrides::deserialize(d)?.over(defaults::VISIBLE))
}

impl Default for Config {
    fn default() -> Self {
        defaults::defaults()
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        defaults::defaults().providers
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        defaults::defaults().player
    }
}

impl Config {
    /// Apply environment overrides on top of the file values.
    pub fn with_env(mut self) -> Self {
        self.apply_api_key(std::env::var(API_KEY_ENV).ok());
        self
    }

    fn apply_api_key(&mut self, from_env: Option<String>) {
        if let Some(key) = from_env.map(|k| k.trim().to_string())
            && !key.is_empty()
        {
            self.youtube.api_key = Some(key);
        }
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj = ProjectDirs::from("dev", "vinyl", "vinyl").context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

/// Load the config file. A missing file yields the defaults; nothing is
/// written back.
pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(defaults::defaults().with_env());
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg = toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg.with_env())
}
