//! Shared fixtures for integration tests
//!
//! ```rust,ignore
//! mod harness;
//! use harness::*;
//! ```

#![allow(dead_code)]

use dashspot::prelude::*;

/// A store with one signed-in user and helpers to fill their library
pub struct Fixture {
    pub store: LibraryStore,
    pub user: AppUser,
    pub principal: Principal,
}

impl Fixture {
    pub fn new() -> Self {
        let store = LibraryStore::new();
        let user = store
            .insert_user(AppUser::new("listener@example.com", "listener", "access", "refresh"))
            .unwrap();
        Self {
            principal: Principal::from(&user),
            user,
            store,
        }
    }

    pub fn auth(&self) -> AuthContext {
        AuthContext::from(self.principal.clone())
    }

    pub fn filters(&self) -> FilterSets {
        FilterSets::new(&self.store, &AppConfig::default()).unwrap()
    }

    /// Insert a playlist and save it to the user's library
    pub fn saved_playlist(&self, playlist: Playlist) -> Playlist {
        let playlist = self.store.insert(playlist).unwrap();
        self.store
            .add_to_library::<Playlist>(self.user.id(), playlist.id())
            .unwrap();
        playlist
    }

    pub fn saved_album(&self, album: Album) -> Album {
        let album = self.store.insert(album).unwrap();
        self.store
            .add_to_library::<Album>(self.user.id(), album.id())
            .unwrap();
        album
    }

    pub fn saved_artist(&self, artist: Artist) -> Artist {
        let artist = self.store.insert(artist).unwrap();
        self.store
            .add_to_library::<Artist>(self.user.id(), artist.id())
            .unwrap();
        artist
    }

    /// Insert `count` tracks and link them to `playlist`
    pub fn fill_playlist(&self, playlist: &Playlist, count: usize) {
        for n in 0..count {
            let track = self
                .store
                .insert(Track::new(format!("{}-{n}", playlist.spotify_id), format!("Track {n}"), 180_000))
                .unwrap();
            self.store.link_playlist_track(playlist.id(), track.id()).unwrap();
        }
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

pub fn params(query: &str) -> ParameterSet {
    ParameterSet::from_query_str(query)
}
