//! Library synchronization
//!
//! Pulls a user's saved playlists, albums, artists and tracks from the
//! streaming service into the [`LibraryStore`](crate::storage::LibraryStore).
//! The remote API sits behind [`LibrarySource`]; credentials are renewed
//! through [`TokenRefresher`] when the source reports an expired token.

pub mod clean;
pub mod pipeline;

pub use clean::{SyncAlbum, SyncArtist, SyncArtistRef, SyncPlaylist, SyncTrack};
pub use pipeline::{SyncPipeline, SyncReport};

use crate::core::error::SyncError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A paginated remote listing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RemoteResource {
    SavedPlaylists,
    SavedAlbums,
    FollowedArtists,
    SavedTracks,
    /// Tracks of one playlist, by its streaming-service id
    PlaylistTracks { playlist_id: String },
}

impl RemoteResource {
    pub fn name(&self) -> &'static str {
        match self {
            RemoteResource::SavedPlaylists => "playlists",
            RemoteResource::SavedAlbums => "albums",
            RemoteResource::FollowedArtists => "artists",
            RemoteResource::SavedTracks => "tracks",
            RemoteResource::PlaylistTracks { .. } => "playlist_tracks",
        }
    }
}

impl std::fmt::Display for RemoteResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteResource::PlaylistTracks { playlist_id } => {
                write!(f, "playlist_tracks({})", playlist_id)
            }
            other => f.write_str(other.name()),
        }
    }
}

/// One page of raw remote records
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemotePage {
    pub items: Vec<serde_json::Value>,
    /// Cursor for the following page, absent on the last one
    pub next: Option<String>,
}

/// Tokens returned by a successful refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    /// Some providers rotate the refresh token, others keep the old one
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds
    pub expires_in: i64,
}

/// Paginated read access to a user's remote library
#[async_trait]
pub trait LibrarySource: Send + Sync {
    /// Fetch one page of `resource`
    ///
    /// `cursor` is the `next` value of the previous page, `None` for the
    /// first one. Must return [`SyncError::ExpiredToken`] when the access
    /// token is no longer accepted.
    async fn fetch_page(
        &self,
        resource: &RemoteResource,
        access_token: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<RemotePage, SyncError>;
}

#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, SyncError>;
}
