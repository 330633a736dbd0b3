//! Entity traits shared by every persisted record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity and timestamps carried by every record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecordMeta {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Bump `updated_at`
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Take over the identity of an already-stored record
    pub fn adopt(&mut self, existing: &RecordMeta) {
        self.id = existing.id;
        self.created_at = existing.created_at;
        self.touch();
    }
}

impl Default for RecordMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// Base trait for all records in the store
pub trait Entity: Clone + Send + Sync + 'static {
    /// The plural resource name (e.g., "playlists")
    fn resource_name() -> &'static str;

    fn meta(&self) -> &RecordMeta;

    fn meta_mut(&mut self) -> &mut RecordMeta;

    fn id(&self) -> Uuid {
        self.meta().id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.meta().created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.meta().updated_at
    }
}

/// Records mirrored from the streaming service
///
/// They are keyed remotely by `spotify_id` and track whether the last
/// synchronization run completed for them.
pub trait SpotifyEntity: Entity {
    fn spotify_id(&self) -> &str;

    fn name(&self) -> &str;

    fn is_synced(&self) -> bool;

    fn set_synced(&mut self, synced: bool);
}
