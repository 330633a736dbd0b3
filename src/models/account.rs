//! Users and their libraries

use crate::core::entity::RecordMeta;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An application user linked to a streaming-service account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppUser {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub email: String,
    pub spotify_id: String,
    pub display_name: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: String,
    #[serde(skip_serializing)]
    pub refresh_token: String,
    pub token_expiry: DateTime<Utc>,
}

impl_entity!(AppUser, "users");

impl AppUser {
    pub fn new(
        email: impl Into<String>,
        spotify_id: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            meta: RecordMeta::new(),
            email: email.into(),
            spotify_id: spotify_id.into(),
            display_name: None,
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            token_expiry: Utc::now() + Duration::hours(1),
        }
    }

    pub fn token_expired(&self, now: DateTime<Utc>) -> bool {
        self.token_expiry <= now
    }
}

/// The set of playlists, albums, artists and tracks a user has saved
///
/// Each user owns exactly one library; membership lives in the store's join
/// tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Library {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub user_id: Uuid,
}

impl_entity!(Library, "libraries");

impl Library {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            meta: RecordMeta::new(),
            user_id,
        }
    }
}
