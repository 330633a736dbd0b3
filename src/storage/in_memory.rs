//! In-memory record store

use crate::core::entity::{Entity, SpotifyEntity};
use crate::core::error::{DashResult, StorageError};
use crate::models::{Analysis, AppUser, Genre, Library};
use crate::storage::collection::Collection;
use crate::storage::tables::{LibraryItem, Membership, Model, Tables};
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// Shared handle to every table
///
/// Cloning is cheap; all clones see the same data. Uses an `RwLock` so that
/// readers materializing collections never block each other.
#[derive(Clone, Default)]
pub struct LibraryStore {
    tables: Arc<RwLock<Tables>>,
}

impl std::fmt::Debug for LibraryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryStore").finish_non_exhaustive()
    }
}

impl LibraryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self) -> DashResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|e| {
            StorageError::LockPoisoned {
                mode: "read".to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    pub fn write(&self) -> DashResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|e| {
            StorageError::LockPoisoned {
                mode: "write".to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Lazy collection over every record of type `T`
    pub fn all<T: Model>(&self) -> Collection<T> {
        Collection::new(self.clone())
    }

    pub fn insert<T: Model>(&self, record: T) -> DashResult<T> {
        let mut tables = self.write()?;
        T::table_mut(&mut tables).insert(record.id(), record.clone());
        Ok(record)
    }

    pub fn get<T: Model>(&self, id: Uuid) -> DashResult<Option<T>> {
        let tables = self.read()?;
        Ok(T::table(&tables).get(&id).cloned())
    }

    /// Like [`get`](Self::get), but a missing record is an error
    pub fn require<T: Model>(&self, id: Uuid) -> DashResult<T> {
        self.get(id)?.ok_or_else(|| {
            StorageError::NotFound {
                resource: T::resource_name().to_string(),
                id,
            }
            .into()
        })
    }

    pub fn find_by_spotify_id<T: Model + SpotifyEntity>(
        &self,
        spotify_id: &str,
    ) -> DashResult<Option<T>> {
        let tables = self.read()?;
        Ok(T::table(&tables)
            .values()
            .find(|record| record.spotify_id() == spotify_id)
            .cloned())
    }

    /// Insert a record, or replace the stored record with the same
    /// `spotify_id`
    ///
    /// A replaced record keeps its `id`, `created_at` and `is_synced`.
    pub fn upsert<T: Model + SpotifyEntity>(&self, mut record: T) -> DashResult<T> {
        let mut tables = self.write()?;
        let table = T::table_mut(&mut tables);

        let existing = table
            .values()
            .find(|stored| stored.spotify_id() == record.spotify_id())
            .map(|stored| (stored.meta().clone(), stored.is_synced()));

        match existing {
            Some((meta, synced)) => {
                record.meta_mut().adopt(&meta);
                record.set_synced(synced);
                tracing::debug!(
                    resource = T::resource_name(),
                    spotify_id = record.spotify_id(),
                    "updating record"
                );
            }
            None => {
                tracing::debug!(
                    resource = T::resource_name(),
                    spotify_id = record.spotify_id(),
                    "creating record"
                );
            }
        }

        table.insert(record.id(), record.clone());
        Ok(record)
    }

    pub fn mark_synced<T: Model + SpotifyEntity>(&self, id: Uuid) -> DashResult<()> {
        let mut tables = self.write()?;
        let record = T::table_mut(&mut tables).get_mut(&id).ok_or_else(|| {
            StorageError::NotFound {
                resource: T::resource_name().to_string(),
                id,
            }
        })?;
        record.set_synced(true);
        record.meta_mut().touch();
        Ok(())
    }

    // --- users and libraries ---

    /// Store a user and create their library
    pub fn insert_user(&self, user: AppUser) -> DashResult<AppUser> {
        let user = self.insert(user)?;
        self.ensure_library(user.id())?;
        Ok(user)
    }

    pub fn get_user(&self, user_id: Uuid) -> DashResult<AppUser> {
        self.require(user_id)
    }

    pub fn update_user_tokens(
        &self,
        user_id: Uuid,
        access_token: &str,
        refresh_token: Option<&str>,
        token_expiry: DateTime<Utc>,
    ) -> DashResult<AppUser> {
        let mut tables = self.write()?;
        let user = tables.users.get_mut(&user_id).ok_or_else(|| {
            StorageError::NotFound {
                resource: AppUser::resource_name().to_string(),
                id: user_id,
            }
        })?;

        user.access_token = access_token.to_string();
        if let Some(refresh_token) = refresh_token {
            user.refresh_token = refresh_token.to_string();
        }
        user.token_expiry = token_expiry;
        user.meta.touch();
        Ok(user.clone())
    }

    pub fn ensure_library(&self, user_id: Uuid) -> DashResult<Library> {
        let mut tables = self.write()?;
        let library = tables
            .libraries
            .entry(user_id)
            .or_insert_with(|| Library::new(user_id));
        Ok(library.clone())
    }

    /// Save an item to a user's library, creating the library if needed
    pub fn add_to_library<T: LibraryItem>(&self, user_id: Uuid, item_id: Uuid) -> DashResult<bool> {
        let library_id = self.ensure_library(user_id)?.id();
        self.link(T::library_links_mut, library_id, item_id)
    }

    // --- relationships ---

    pub fn link_playlist_track(&self, playlist_id: Uuid, track_id: Uuid) -> DashResult<bool> {
        self.link(|t| &mut t.playlist_tracks, playlist_id, track_id)
    }

    pub fn link_album_artist(&self, album_id: Uuid, artist_id: Uuid) -> DashResult<bool> {
        self.link(|t| &mut t.album_artists, album_id, artist_id)
    }

    pub fn link_track_artist(&self, track_id: Uuid, artist_id: Uuid) -> DashResult<bool> {
        self.link(|t| &mut t.track_artists, track_id, artist_id)
    }

    pub fn link_artist_genre(&self, artist_id: Uuid, genre_id: Uuid) -> DashResult<bool> {
        self.link(|t| &mut t.artist_genres, artist_id, genre_id)
    }

    pub fn link_album_genre(&self, album_id: Uuid, genre_id: Uuid) -> DashResult<bool> {
        self.link(|t| &mut t.album_genres, album_id, genre_id)
    }

    fn link(
        &self,
        select: impl FnOnce(&mut Tables) -> &mut Membership,
        owner: Uuid,
        member: Uuid,
    ) -> DashResult<bool> {
        let mut tables = self.write()?;
        Ok(select(&mut *tables).insert(owner, member))
    }

    /// Return the genre with this name, creating it if needed
    pub fn upsert_genre(&self, name: &str) -> DashResult<Genre> {
        let mut tables = self.write()?;
        if let Some(genre) = tables.genre_named(name) {
            return Ok(genre.clone());
        }
        let genre = Genre::new(name);
        tables.genres.insert(genre.id(), genre.clone());
        Ok(genre)
    }

    /// Attach an analysis to a playlist, replacing any earlier one
    pub fn record_analysis(&self, playlist_id: Uuid) -> DashResult<Analysis> {
        let mut tables = self.write()?;
        if !tables.playlists.contains_key(&playlist_id) {
            return Err(StorageError::NotFound {
                resource: "playlists".to_string(),
                id: playlist_id,
            }
            .into());
        }
        let analysis = Analysis::new(playlist_id);
        tables.analyses.insert(playlist_id, analysis.clone());
        Ok(analysis)
    }
}
