use crate::error::Result;
use crate::normalize;

/// An entry read from a source playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceItem {
    /// A catalog track with structured metadata (Spotify).
    Track {
        artist: Option<String>,
        title: String,
    },
    /// A video known only by its title (YouTube).
    Video { title: String },
}

impl SourceItem {
    /// The search query to run against the destination catalog, or `None`
    /// when nothing searchable is left.
    pub fn query(&self) -> Option<String> {
        let query = match self {
            SourceItem::Track {
                artist: Some(artist),
                title,
            } if !artist.trim().is_empty() => format!("{} - {}", artist.trim(), title.trim()),
            SourceItem::Track { title, .. } => title.trim().to_string(),
            SourceItem::Video { title } => normalize::song_query(title),
        };

        if query.is_empty() { None } else { Some(query) }
    }

    pub fn title(&self) -> &str {
        match self {
            SourceItem::Track { title, .. } | SourceItem::Video { title } => title,
        }
    }
}

/// The first search hit on the destination catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Track URI on Spotify, video ID on YouTube.
    pub id: String,
    /// Human readable description of the hit, used for logging.
    pub label: String,
}

/// The destination playlist a migration writes into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistTarget {
    Existing(String),
    /// Reused when a playlist with this name (case-insensitive) exists,
    /// created otherwise.
    Named { name: String, description: String },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Source: Send + Sync {
    /// All items of a playlist, in playlist order, across every page.
    async fn list_items(&self, playlist_id: &str) -> Result<Vec<SourceItem>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Destination: Send + Sync {
    async fn search(&self, query: &str) -> Result<Option<Match>>;

    async fn find_playlist(&self, name: &str) -> Result<Option<String>>;

    /// Create a private playlist and return its ID.
    async fn create_playlist(&self, name: &str, description: &str) -> Result<String>;

    async fn playlist_item_ids(&self, playlist_id: &str) -> Result<Vec<String>>;

    /// Append one batch of items to a playlist.
    ///
    /// Returns the identifiers that could not be added when the destination
    /// writes items one at a time; an error means nothing in the batch was written.
    async fn add_items(&self, playlist_id: &str, ids: &[String]) -> Result<Vec<String>>;
}
