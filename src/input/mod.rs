use crate::app::events::{Event, InputEvent};
use crate::providers::models::SearchQuery;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Read commands from stdin, one per line, until EOF.
pub fn spawn_input_task(tx: mpsc::Sender<Event>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let Some(ev) = parse_command(&line) else {
                        tracing::warn!("unrecognised input {line:?}; try `artist - song`, `p` or `q`");
                        continue;
                    };
                    if tx.send(Event::Input(ev)).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    let _ = tx.send(Event::Input(InputEvent::Quit)).await;
                    break;
                }
                Err(e) => {
                    tracing::warn!("stdin read failed: {e}");
                    break;
                }
            }
        }
    });
}

/// `artist - song` searches, an empty line or `p` toggles, `q` quits.
pub fn parse_command(line: &str) -> Option<InputEvent> {
    let line = line.trim();
    match line {
        "" | "p" | "toggle" => return Some(InputEvent::Toggle),
        "q" | "quit" | "exit" => return Some(InputEvent::Quit),
        _ => {}
    }
    let (artist, song) = line.split_once(" - ").or_else(|| line.split_once('/'))?;
    Some(InputEvent::Search(SearchQuery::new(artist.trim(), song.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search() {
        assert_eq!(
            parse_command("coldplay - yelo"),
            Some(InputEvent::Search(SearchQuery::new("coldplay", "yelo")))
        );
        assert_eq!(
            parse_command(" AC/DC - Thunderstruck "),
            Some(InputEvent::Search(SearchQuery::new("AC/DC", "Thunderstruck")))
        );
        assert_eq!(
            parse_command("xyz123/qqq"),
            Some(InputEvent::Search(SearchQuery::new("xyz123", "qqq")))
        );
    }

    #[test]
    fn test_parse_controls() {
        assert_eq!(parse_command(""), Some(InputEvent::Toggle));
        assert_eq!(parse_command("p"), Some(InputEvent::Toggle));
        assert_eq!(parse_command("q"), Some(InputEvent::Quit));
        assert_eq!(parse_command("just words"), None);
    }
}
