/// What the user typed, untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub raw_artist: String,
    pub raw_song: String,
}

impl SearchQuery {
    pub fn new(raw_artist: impl Into<String>, raw_song: impl Into<String>) -> Self {
        Self {
            raw_artist: raw_artist.into(),
            raw_song: raw_song.into(),
        }
    }

    /// Combined free-text term, `"{artist} {song}"`.
    pub fn term(&self) -> String {
        format!("{} {}", self.raw_artist, self.raw_song)
    }

    /// The raw pair taken verbatim, used when metadata resolution fails.
    pub fn as_canonical(&self) -> CanonicalTrack {
        CanonicalTrack {
            artist: self.raw_artist.clone(),
            title: self.raw_song.clone(),
        }
    }
}

/// Artist/title pair every downstream lookup of one search uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalTrack {
    pub artist: String,
    pub title: String,
}

impl CanonicalTrack {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }

    pub fn video_query(&self) -> String {
        format!("{} {}", self.artist, self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMatch {
    pub video_id: String,
    pub artwork_url: Option<String>,
}

/// Media for the current track. Each slice is filled by its own fetcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMedia {
    pub lyrics: Option<String>,
    pub video_id: Option<String>,
    pub artwork_url: Option<String>,
}

impl TrackMedia {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Monotonic tag identifying which search an in-flight request belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
