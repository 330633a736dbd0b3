//! Playlists and their analyses

use crate::core::entity::RecordMeta;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A playlist mirrored from the streaming service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub spotify_id: String,
    pub name: String,
    /// Remote snapshot id; changes whenever the playlist is edited
    pub version: Option<String>,
    pub image_url: Option<String>,
    pub public: Option<bool>,
    /// Collaborative flag
    pub shared: Option<bool>,
    pub description: Option<String>,
    /// Streaming-service id of the owner
    pub owner_id: String,
    pub owner_name: Option<String>,
    /// Local user that owns the playlist, when the owner has an account
    pub user_id: Option<Uuid>,
    pub is_synced: bool,
}

impl_spotify_entity!(Playlist, "playlists");

impl Playlist {
    pub fn new(
        spotify_id: impl Into<String>,
        name: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            meta: RecordMeta::new(),
            spotify_id: spotify_id.into(),
            name: name.into(),
            version: None,
            image_url: None,
            public: None,
            shared: None,
            description: None,
            owner_id: owner_id.into(),
            owner_name: None,
            user_id: None,
            is_synced: false,
        }
    }
}

/// Audio-feature analysis computed for a playlist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub playlist_id: Uuid,
}

impl_entity!(Analysis, "analyses");

impl Analysis {
    pub fn new(playlist_id: Uuid) -> Self {
        Self {
            meta: RecordMeta::new(),
            playlist_id,
        }
    }
}
