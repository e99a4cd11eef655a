use anyhow::Context;
use tokio::process::Command;

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Ask yt-dlp for a direct audio stream URL for a video id.
pub async fn resolve_audio_url(ytdlp: &str, video_id: &str) -> anyhow::Result<String> {
    let out = Command::new(ytdlp)
        .args(["-f", "bestaudio", "--get-url", "--no-playlist"])
        .arg(watch_url(video_id))
        .output()
        .await
        .context("run yt-dlp")?;
    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        anyhow::bail!("yt-dlp failed: {}", stderr.trim());
    }

    let stdout = String::from_utf8(out.stdout).context("decode yt-dlp stdout")?;
    first_url(&stdout)
        .map(str::to_string)
        .context("yt-dlp returned empty url")
}

fn first_url(stdout: &str) -> Option<&str> {
    stdout.lines().map(str::trim).find(|l| !l.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_url_skips_blank_lines() {
        let out = "\n  https://rr1.example/videoplayback?x=1 \nhttps://second\n";
        assert_eq!(first_url(out), Some("https://rr1.example/videoplayback?x=1"));
        assert_eq!(first_url("\n\n"), None);
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(watch_url("yKNxeF4KMsY"), "https://www.youtube.com/watch?v=yKNxeF4KMsY");
    }
}
