//! Track filters
//!
//! Tracks are not library-scoped by default; a playlist listing passes
//! [`TrackFilterSet::playlist_tracks`] as the base collection instead.

use crate::core::auth::Principal;
use crate::core::entity::Entity;
use crate::core::error::{ConfigError, DashResult};
use crate::core::field::parse_uuid;
use crate::core::query::SortDirection;
use crate::filters::dispatch::FilterSet;
use crate::filters::lookups::{boolean, contains};
use crate::filters::registry::{FilterMeta, FilterRegistry, Handlers};
use crate::models::Track;
use crate::storage::{Collection, LibraryStore};
use uuid::Uuid;

type Tracks = Collection<Track>;

pub const FILTER_FIELDS: &[&str] = &["name", "album", "artist", "playlist", "in_library", "is_synced"];
pub const SEARCH_FIELDS: &[&str] = &[];
pub const SORT_FIELDS: &[&str] = &["name", "duration", "album"];

pub struct TrackFilterSet {
    registry: FilterRegistry<Track>,
}

impl TrackFilterSet {
    pub fn new(store: &LibraryStore) -> Result<Self, ConfigError> {
        Self::with_meta(store, Self::meta())
    }

    pub fn with_meta(store: &LibraryStore, meta: FilterMeta) -> Result<Self, ConfigError> {
        Ok(Self {
            registry: FilterRegistry::new(store.all(), meta, Self::handlers())?,
        })
    }

    pub fn meta() -> FilterMeta {
        FilterMeta::new(FILTER_FIELDS, SEARCH_FIELDS, SORT_FIELDS)
    }

    pub fn handlers() -> Handlers<Track> {
        Handlers::new()
            .filter("name", filter_name)
            .filter("album", filter_album)
            .filter("artist", filter_artist)
            .filter("playlist", filter_playlist)
            .filter("in_library", filter_in_library)
            .filter("is_synced", filter_is_synced)
            .sort("name", sort_name)
            .sort("duration", sort_duration)
            .sort("album", sort_album)
    }

    /// Tracks of one playlist, in the order they were added
    pub fn playlist_tracks(&self, playlist_id: Uuid) -> Tracks {
        self.registry
            .default_queryset()
            .filter(move |track, tables| tables.playlist_tracks.contains(playlist_id, track.id()))
    }
}

impl FilterSet for TrackFilterSet {
    type Model = Track;

    fn registry(&self) -> &FilterRegistry<Track> {
        &self.registry
    }
}

pub fn filter_name(qs: Tracks, value: &str, _: &Principal) -> DashResult<Tracks> {
    Ok(contains(qs, value, |t, _, matches| matches(&t.name)))
}

/// Album name contains the value
pub fn filter_album(qs: Tracks, value: &str, _: &Principal) -> DashResult<Tracks> {
    Ok(contains(qs, value, |t, tables, matches| {
        tables.album_of(t).is_some_and(|album| matches(&album.name))
    }))
}

pub fn filter_artist(qs: Tracks, value: &str, _: &Principal) -> DashResult<Tracks> {
    Ok(contains(qs, value, |t, tables, matches| {
        tables.track_artists(t.id()).any(|artist| matches(&artist.name))
    }))
}

/// Value is a playlist id
pub fn filter_playlist(qs: Tracks, value: &str, _: &Principal) -> DashResult<Tracks> {
    let playlist_id = parse_uuid("playlist", value)?;
    Ok(qs.filter(move |t, tables| tables.playlist_tracks.contains(playlist_id, t.id())))
}

pub fn filter_in_library(qs: Tracks, value: &str, principal: &Principal) -> DashResult<Tracks> {
    let user_id = principal.user_id;
    boolean(qs, "in_library", value, move |t, tables| {
        tables.in_library::<Track>(user_id, t.id())
    })
}

pub fn filter_is_synced(qs: Tracks, value: &str, _: &Principal) -> DashResult<Tracks> {
    boolean(qs, "is_synced", value, |t, _| t.is_synced)
}

pub fn sort_name(qs: Tracks, direction: SortDirection, _: &Principal) -> DashResult<Tracks> {
    Ok(qs.order_by_key(|t, _| t.name.to_lowercase(), direction))
}

pub fn sort_duration(qs: Tracks, direction: SortDirection, _: &Principal) -> DashResult<Tracks> {
    Ok(qs.order_by_key(|t, _| t.duration_ms, direction))
}

/// Tracks without an album sort first
pub fn sort_album(qs: Tracks, direction: SortDirection, _: &Principal) -> DashResult<Tracks> {
    Ok(qs.order_by_key(
        |t, tables| tables.album_of(t).map(|album| album.name.to_lowercase()),
        direction,
    ))
}
