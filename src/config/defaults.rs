use super::{Config, PlayerConfig, ProvidersConfig, SurfaceOptions, YoutubeConfig};

pub const SILENT: SurfaceOptions = SurfaceOptions {
    autoplay: true,
    inline: true,
    controls: true,
    keyboard: true,
    fullscreen: false,
};

pub const VISIBLE: SurfaceOptions = SurfaceOptions {
    autoplay: true,
    inline: true,
    controls: false,
    keyboard: false,
    fullscreen: false,
};

pub fn defaults() -> Config {
    Config {
        providers: ProvidersConfig {
            metadata_url: "https://itunes.apple.com/search".to_string(),
            lyrics_url: "https://api.lyrics.ovh/v1".to_string(),
            video_url: "https://www.googleapis.com/youtube/v3/search".to_string(),
            timeout_secs: 10,
            user_agent: concat!("vinyl/", env!("CARGO_PKG_VERSION")).to_string(),
        },
        youtube: YoutubeConfig { api_key: None },
        player: PlayerConfig {
            mpv_path: "mpv".to_string(),
            ytdlp_path: "yt-dlp".to_string(),
            audio_device: None,
            volume: 80,
            silent: SILENT,
            visible: VISIBLE,
        },
    }
}
