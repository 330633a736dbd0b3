//! Record tables and join tables held by the store

use crate::core::entity::{Entity, SpotifyEntity};
use crate::models::{Album, Analysis, AppUser, Artist, Genre, Library, Playlist, Track};
use indexmap::{IndexMap, IndexSet};
use std::cmp::Ordering;
use uuid::Uuid;

/// A many-to-many relationship, keyed by the owning side
#[derive(Debug, Clone, Default)]
pub struct Membership {
    links: IndexMap<Uuid, IndexSet<Uuid>>,
}

impl Membership {
    /// Returns `false` when the pair was already linked
    pub fn insert(&mut self, owner: Uuid, member: Uuid) -> bool {
        self.links.entry(owner).or_default().insert(member)
    }

    pub fn contains(&self, owner: Uuid, member: Uuid) -> bool {
        self.links
            .get(&owner)
            .is_some_and(|members| members.contains(&member))
    }

    pub fn members(&self, owner: Uuid) -> impl Iterator<Item = Uuid> + '_ {
        self.links
            .get(&owner)
            .into_iter()
            .flat_map(|members| members.iter().copied())
    }

    pub fn count(&self, owner: Uuid) -> usize {
        self.links.get(&owner).map_or(0, IndexSet::len)
    }
}

/// Every table in the store
///
/// Record tables keep insertion order, which is the final tiebreak of every
/// ordering.
#[derive(Debug, Default)]
pub struct Tables {
    pub users: IndexMap<Uuid, AppUser>,
    /// Keyed by user id: one library per user
    pub libraries: IndexMap<Uuid, Library>,
    pub playlists: IndexMap<Uuid, Playlist>,
    pub tracks: IndexMap<Uuid, Track>,
    pub albums: IndexMap<Uuid, Album>,
    pub artists: IndexMap<Uuid, Artist>,
    pub genres: IndexMap<Uuid, Genre>,
    /// Keyed by playlist id: at most one analysis per playlist
    pub analyses: IndexMap<Uuid, Analysis>,

    pub library_playlists: Membership,
    pub library_albums: Membership,
    pub library_artists: Membership,
    pub library_tracks: Membership,
    pub playlist_tracks: Membership,
    pub album_artists: Membership,
    pub track_artists: Membership,
    pub artist_genres: Membership,
    pub album_genres: Membership,
}

impl Tables {
    pub fn library_of(&self, user_id: Uuid) -> Option<&Library> {
        self.libraries.get(&user_id)
    }

    /// Whether `item_id` is saved in the library of `user_id`
    pub fn in_library<T: LibraryItem>(&self, user_id: Uuid, item_id: Uuid) -> bool {
        self.library_of(user_id)
            .is_some_and(|library| T::library_links(self).contains(library.id(), item_id))
    }

    pub fn has_analysis(&self, playlist_id: Uuid) -> bool {
        self.analyses.contains_key(&playlist_id)
    }

    pub fn playlist_track_count(&self, playlist_id: Uuid) -> usize {
        self.playlist_tracks.count(playlist_id)
    }

    pub fn playlist_tracks(&self, playlist_id: Uuid) -> impl Iterator<Item = &Track> {
        resolve(&self.tracks, self.playlist_tracks.members(playlist_id))
    }

    pub fn album_of(&self, track: &Track) -> Option<&Album> {
        track.album_id.and_then(|id| self.albums.get(&id))
    }

    pub fn album_artists(&self, album_id: Uuid) -> impl Iterator<Item = &Artist> {
        resolve(&self.artists, self.album_artists.members(album_id))
    }

    pub fn track_artists(&self, track_id: Uuid) -> impl Iterator<Item = &Artist> {
        resolve(&self.artists, self.track_artists.members(track_id))
    }

    pub fn artist_genres(&self, artist_id: Uuid) -> impl Iterator<Item = &Genre> {
        resolve(&self.genres, self.artist_genres.members(artist_id))
    }

    pub fn album_genres(&self, album_id: Uuid) -> impl Iterator<Item = &Genre> {
        resolve(&self.genres, self.album_genres.members(album_id))
    }

    pub fn genre_named(&self, name: &str) -> Option<&Genre> {
        self.genres.values().find(|genre| genre.name == name)
    }
}

fn resolve<'a, T>(
    table: &'a IndexMap<Uuid, T>,
    ids: impl Iterator<Item = Uuid> + 'a,
) -> impl Iterator<Item = &'a T> {
    ids.filter_map(move |id| table.get(&id))
}

/// A record type with its own table in [`Tables`]
pub trait Model: Entity {
    fn table(tables: &Tables) -> &IndexMap<Uuid, Self>;

    fn table_mut(tables: &mut Tables) -> &mut IndexMap<Uuid, Self>;

    /// Ordering used when a collection has no explicit sort
    fn default_ordering(_a: &Self, _b: &Self, _tables: &Tables) -> Ordering {
        Ordering::Equal
    }
}

/// A record type users can save to their library
pub trait LibraryItem: Model + SpotifyEntity {
    fn library_links(tables: &Tables) -> &Membership;

    fn library_links_mut(tables: &mut Tables) -> &mut Membership;
}

macro_rules! impl_model {
    ($type:ident, $table:ident) => {
        impl Model for $type {
            fn table(tables: &Tables) -> &IndexMap<Uuid, Self> {
                &tables.$table
            }

            fn table_mut(tables: &mut Tables) -> &mut IndexMap<Uuid, Self> {
                &mut tables.$table
            }
        }
    };
    ($type:ident, $table:ident, library = $links:ident) => {
        impl_model!($type, $table);

        impl LibraryItem for $type {
            fn library_links(tables: &Tables) -> &Membership {
                &tables.$links
            }

            fn library_links_mut(tables: &mut Tables) -> &mut Membership {
                &mut tables.$links
            }
        }
    };
}

impl_model!(Track, tracks, library = library_tracks);
impl_model!(Album, albums, library = library_albums);
impl_model!(Artist, artists, library = library_artists);
impl_model!(Genre, genres);
impl_model!(AppUser, users);

impl Model for Playlist {
    fn table(tables: &Tables) -> &IndexMap<Uuid, Self> {
        &tables.playlists
    }

    fn table_mut(tables: &mut Tables) -> &mut IndexMap<Uuid, Self> {
        &mut tables.playlists
    }

    /// Synced first, then analyzed, then most recently updated and created
    fn default_ordering(a: &Self, b: &Self, tables: &Tables) -> Ordering {
        b.is_synced
            .cmp(&a.is_synced)
            .then_with(|| tables.has_analysis(b.id()).cmp(&tables.has_analysis(a.id())))
            .then_with(|| b.updated_at().cmp(&a.updated_at()))
            .then_with(|| b.created_at().cmp(&a.created_at()))
    }
}

impl LibraryItem for Playlist {
    fn library_links(tables: &Tables) -> &Membership {
        &tables.library_playlists
    }

    fn library_links_mut(tables: &mut Tables) -> &mut Membership {
        &mut tables.library_playlists
    }
}
