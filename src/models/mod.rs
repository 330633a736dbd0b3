//! Persisted record types
//!
//! Relationships between records (library membership, playlist tracks,
//! album artists, genres) are not stored on the records themselves; they
//! live in join tables inside [`crate::storage::Tables`].

macro_rules! impl_entity {
    ($type:ident, $resource:expr) => {
        impl $crate::core::entity::Entity for $type {
            fn resource_name() -> &'static str {
                $resource
            }

            fn meta(&self) -> &$crate::core::entity::RecordMeta {
                &self.meta
            }

            fn meta_mut(&mut self) -> &mut $crate::core::entity::RecordMeta {
                &mut self.meta
            }
        }
    };
}

macro_rules! impl_spotify_entity {
    ($type:ident, $resource:expr) => {
        impl_entity!($type, $resource);

        impl $crate::core::entity::SpotifyEntity for $type {
            fn spotify_id(&self) -> &str {
                &self.spotify_id
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn is_synced(&self) -> bool {
                self.is_synced
            }

            fn set_synced(&mut self, synced: bool) {
                self.is_synced = synced;
            }
        }
    };
}

pub mod account;
pub mod catalog;
pub mod playlist;

pub use account::{AppUser, Library};
pub use catalog::{Album, Artist, Genre, Track};
pub use playlist::{Analysis, Playlist};
