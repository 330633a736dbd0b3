//! Tracks, albums, artists and genres

use crate::core::entity::RecordMeta;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub spotify_id: String,
    pub name: String,
    pub duration_ms: u64,
    pub album_id: Option<Uuid>,
    pub is_synced: bool,
}

impl_spotify_entity!(Track, "tracks");

impl Track {
    pub fn new(spotify_id: impl Into<String>, name: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            meta: RecordMeta::new(),
            spotify_id: spotify_id.into(),
            name: name.into(),
            duration_ms,
            album_id: None,
            is_synced: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub spotify_id: String,
    pub name: String,
    /// `album`, `single` or `compilation`
    pub album_type: Option<String>,
    pub image_url: Option<String>,
    pub label: Option<String>,
    pub copyright: Option<String>,
    pub release_year: i32,
    pub is_synced: bool,
}

impl_spotify_entity!(Album, "albums");

impl Album {
    pub fn new(spotify_id: impl Into<String>, name: impl Into<String>, release_year: i32) -> Self {
        Self {
            meta: RecordMeta::new(),
            spotify_id: spotify_id.into(),
            name: name.into(),
            album_type: None,
            image_url: None,
            label: None,
            copyright: None,
            release_year,
            is_synced: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub spotify_id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub follower_count: Option<u64>,
    pub is_synced: bool,
}

impl_spotify_entity!(Artist, "artists");

impl Artist {
    pub fn new(spotify_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            meta: RecordMeta::new(),
            spotify_id: spotify_id.into(),
            name: name.into(),
            image_url: None,
            follower_count: None,
            is_synced: false,
        }
    }
}

/// Genre names are unique, case-sensitive as delivered by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genre {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
}

impl_entity!(Genre, "genres");

impl Genre {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: RecordMeta::new(),
            name: name.into(),
        }
    }
}
