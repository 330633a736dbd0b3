//! Playlist filters

use crate::core::auth::{AuthContext, Principal};
use crate::core::entity::Entity;
use crate::core::error::{ConfigError, DashResult};
use crate::core::field::parse_int;
use crate::core::query::SortDirection;
use crate::filters::dispatch::FilterSet;
use crate::filters::lookups::{boolean, contains, in_library};
use crate::filters::registry::{FilterMeta, FilterRegistry, Handlers};
use crate::models::Playlist;
use crate::storage::{Collection, LibraryStore};

type Playlists = Collection<Playlist>;

pub const FILTER_FIELDS: &[&str] = &[
    "name",
    "public",
    "collaborative",
    "private",
    "my_playlist",
    "is_analyzed",
    "is_synced",
    "num_tracks",
    "track_name",
];
pub const SEARCH_FIELDS: &[&str] = &["description", "owner"];
pub const SORT_FIELDS: &[&str] = &["name", "num_tracks", "created_at", "updated_at"];

/// Filters over the playlists in the viewer's library
pub struct PlaylistFilterSet {
    registry: FilterRegistry<Playlist>,
}

impl PlaylistFilterSet {
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

    pub fn handlers() -> Handlers<Playlist> {
        Handlers::new()
            .filter("name", filter_name)
            .filter("public", filter_public)
            .filter("collaborative", filter_collaborative)
            .filter("private", filter_private)
            .filter("my_playlist", filter_my_playlist)
            .filter("is_analyzed", filter_is_analyzed)
            .filter("is_synced", filter_is_synced)
            .filter("num_tracks", filter_num_tracks)
            .filter("track_name", filter_track_name)
            .search("description", search_description)
            .search("owner", search_owner)
            .sort("name", sort_name)
            .sort("num_tracks", sort_num_tracks)
            .sort("created_at", sort_created_at)
            .sort("updated_at", sort_updated_at)
    }
}

impl FilterSet for PlaylistFilterSet {
    type Model = Playlist;

    fn registry(&self) -> &FilterRegistry<Playlist> {
        &self.registry
    }

    fn get_queryset(&self, auth: &AuthContext, base: Option<Playlists>) -> DashResult<Playlists> {
        let principal = auth.principal()?;
        let base = base.unwrap_or_else(|| self.registry.default_queryset());
        Ok(in_library(base, principal))
    }
}

pub fn filter_name(qs: Playlists, value: &str, _: &Principal) -> DashResult<Playlists> {
    Ok(contains(qs, value, |p, _, matches| matches(&p.name)))
}

pub fn filter_public(qs: Playlists, value: &str, _: &Principal) -> DashResult<Playlists> {
    boolean(qs, "public", value, |p, _| p.public.unwrap_or(false))
}

pub fn filter_collaborative(qs: Playlists, value: &str, _: &Principal) -> DashResult<Playlists> {
    boolean(qs, "collaborative", value, |p, _| p.shared.unwrap_or(false))
}

/// `private=true` keeps playlists that are not public
pub fn filter_private(qs: Playlists, value: &str, _: &Principal) -> DashResult<Playlists> {
    boolean(qs, "private", value, |p, _| !p.public.unwrap_or(false))
}

/// `my_playlist=true` keeps playlists owned by the viewer's account
pub fn filter_my_playlist(qs: Playlists, value: &str, principal: &Principal) -> DashResult<Playlists> {
    let me = principal.spotify_id.clone();
    boolean(qs, "my_playlist", value, move |p, _| p.owner_id == me)
}

pub fn filter_is_analyzed(qs: Playlists, value: &str, _: &Principal) -> DashResult<Playlists> {
    boolean(qs, "is_analyzed", value, |p, tables| tables.has_analysis(p.id()))
}

pub fn filter_is_synced(qs: Playlists, value: &str, _: &Principal) -> DashResult<Playlists> {
    boolean(qs, "is_synced", value, |p, _| p.is_synced)
}

/// At least this many tracks
pub fn filter_num_tracks(qs: Playlists, value: &str, _: &Principal) -> DashResult<Playlists> {
    let minimum: usize = parse_int("num_tracks", value)?;
    Ok(qs.filter(move |p, tables| tables.playlist_track_count(p.id()) >= minimum))
}

pub fn filter_track_name(qs: Playlists, value: &str, _: &Principal) -> DashResult<Playlists> {
    Ok(contains(qs, value, |p, tables, matches| {
        tables.playlist_tracks(p.id()).any(|track| matches(&track.name))
    }))
}

pub fn search_description(qs: Playlists, value: &str, _: &Principal) -> DashResult<Playlists> {
    Ok(contains(qs, value, |p, _, matches| {
        p.description.as_deref().is_some_and(matches)
    }))
}

pub fn search_owner(qs: Playlists, value: &str, _: &Principal) -> DashResult<Playlists> {
    Ok(contains(qs, value, |p, _, matches| {
        matches(&p.owner_id) || p.owner_name.as_deref().is_some_and(matches)
    }))
}

pub fn sort_name(qs: Playlists, direction: SortDirection, _: &Principal) -> DashResult<Playlists> {
    Ok(qs.order_by_key(|p, _| p.name.to_lowercase(), direction))
}

pub fn sort_num_tracks(
    qs: Playlists,
    direction: SortDirection,
    _: &Principal,
) -> DashResult<Playlists> {
    Ok(qs.order_by_key(|p, tables| tables.playlist_track_count(p.id()), direction))
}

pub fn sort_created_at(
    qs: Playlists,
    direction: SortDirection,
    _: &Principal,
) -> DashResult<Playlists> {
    Ok(qs.order_by_key(|p, _| p.created_at(), direction))
}

pub fn sort_updated_at(
    qs: Playlists,
    direction: SortDirection,
    _: &Principal,
) -> DashResult<Playlists> {
    Ok(qs.order_by_key(|p, _| p.updated_at(), direction))
}
