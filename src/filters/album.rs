//! Album filters
//!
//! Year bounds are exclusive: `released_before=Y` keeps albums from years
//! strictly before `Y`, `released_after=Y` strictly after. Albums released
//! in `Y` itself only match `release_year=Y`.

use crate::core::auth::{AuthContext, Principal};
use crate::core::entity::Entity;
use crate::core::error::{ConfigError, DashResult};
use crate::core::field::{iexact, parse_int};
use crate::core::query::SortDirection;
use crate::filters::dispatch::FilterSet;
use crate::filters::lookups::{boolean, contains, in_library};
use crate::filters::registry::{FilterMeta, FilterRegistry, Handlers};
use crate::models::Album;
use crate::storage::{Collection, LibraryStore};

type Albums = Collection<Album>;

pub const FILTER_FIELDS: &[&str] = &[
    "release_year",
    "released_before",
    "released_after",
    "album_type",
    "artist",
    "genre",
    "is_synced",
];
pub const SEARCH_FIELDS: &[&str] = &["name", "label"];
pub const SORT_FIELDS: &[&str] = &["name", "release_year"];

/// Filters over the albums in the viewer's library
pub struct AlbumFilterSet {
    registry: FilterRegistry<Album>,
}

impl AlbumFilterSet {
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

    pub fn handlers() -> Handlers<Album> {
        Handlers::new()
            .filter("release_year", filter_release_year)
            .filter("released_before", filter_released_before)
            .filter("released_after", filter_released_after)
            .filter("album_type", filter_album_type)
            .filter("artist", filter_artist)
            .filter("genre", filter_genre)
            .filter("is_synced", filter_is_synced)
            .search("name", search_name)
            .search("label", search_label)
            .sort("name", sort_name)
            .sort("release_year", sort_release_year)
    }
}

impl FilterSet for AlbumFilterSet {
    type Model = Album;

    fn registry(&self) -> &FilterRegistry<Album> {
        &self.registry
    }

    fn get_queryset(&self, auth: &AuthContext, base: Option<Albums>) -> DashResult<Albums> {
        let principal = auth.principal()?;
        let base = base.unwrap_or_else(|| self.registry.default_queryset());
        Ok(in_library(base, principal))
    }
}

pub fn filter_release_year(qs: Albums, value: &str, _: &Principal) -> DashResult<Albums> {
    let year: i32 = parse_int("release_year", value)?;
    Ok(qs.filter(move |a, _| a.release_year == year))
}

pub fn filter_released_before(qs: Albums, value: &str, _: &Principal) -> DashResult<Albums> {
    let year: i32 = parse_int("released_before", value)?;
    Ok(qs.filter(move |a, _| a.release_year < year))
}

pub fn filter_released_after(qs: Albums, value: &str, _: &Principal) -> DashResult<Albums> {
    let year: i32 = parse_int("released_after", value)?;
    Ok(qs.filter(move |a, _| a.release_year > year))
}

pub fn filter_album_type(qs: Albums, value: &str, _: &Principal) -> DashResult<Albums> {
    let wanted = value.trim().to_string();
    Ok(qs.filter(move |a, _| a.album_type.as_deref().is_some_and(|t| iexact(t, &wanted))))
}

pub fn filter_artist(qs: Albums, value: &str, _: &Principal) -> DashResult<Albums> {
    Ok(contains(qs, value, |a, tables, matches| {
        tables.album_artists(a.id()).any(|artist| matches(&artist.name))
    }))
}

/// Genre of the album or of any of its artists
pub fn filter_genre(qs: Albums, value: &str, _: &Principal) -> DashResult<Albums> {
    let wanted = value.trim().to_string();
    Ok(qs.filter(move |a, tables| {
        tables.album_genres(a.id()).any(|g| iexact(&g.name, &wanted))
            || tables
                .album_artists(a.id())
                .any(|artist| tables.artist_genres(artist.id()).any(|g| iexact(&g.name, &wanted)))
    }))
}

pub fn filter_is_synced(qs: Albums, value: &str, _: &Principal) -> DashResult<Albums> {
    boolean(qs, "is_synced", value, |a, _| a.is_synced)
}

pub fn search_name(qs: Albums, value: &str, _: &Principal) -> DashResult<Albums> {
    Ok(contains(qs, value, |a, _, matches| matches(&a.name)))
}

pub fn search_label(qs: Albums, value: &str, _: &Principal) -> DashResult<Albums> {
    Ok(contains(qs, value, |a, _, matches| a.label.as_deref().is_some_and(matches)))
}

pub fn sort_name(qs: Albums, direction: SortDirection, _: &Principal) -> DashResult<Albums> {
    Ok(qs.order_by_key(|a, _| a.name.to_lowercase(), direction))
}

pub fn sort_release_year(qs: Albums, direction: SortDirection, _: &Principal) -> DashResult<Albums> {
    Ok(qs.order_by_key(|a, _| a.release_year, direction))
}
