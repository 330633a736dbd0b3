//! Artist filters

use crate::core::auth::{AuthContext, Principal};
use crate::core::entity::Entity;
use crate::core::error::{ConfigError, DashResult};
use crate::core::field::{iexact, parse_int};
use crate::core::query::SortDirection;
use crate::filters::dispatch::FilterSet;
use crate::filters::lookups::{boolean, contains, in_library};
use crate::filters::registry::{FilterMeta, FilterRegistry, Handlers};
use crate::models::Artist;
use crate::storage::{Collection, LibraryStore};

type Artists = Collection<Artist>;

pub const FILTER_FIELDS: &[&str] = &["genre", "min_followers", "is_synced"];
pub const SEARCH_FIELDS: &[&str] = &["name"];
pub const SORT_FIELDS: &[&str] = &["name", "followers"];

/// Filters over the artists the viewer follows
pub struct ArtistFilterSet {
    registry: FilterRegistry<Artist>,
}

impl ArtistFilterSet {
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

    pub fn handlers() -> Handlers<Artist> {
        Handlers::new()
            .filter("genre", filter_genre)
            .filter("min_followers", filter_min_followers)
            .filter("is_synced", filter_is_synced)
            .search("name", search_name)
            .sort("name", sort_name)
            .sort("followers", sort_followers)
    }
}

impl FilterSet for ArtistFilterSet {
    type Model = Artist;

    fn registry(&self) -> &FilterRegistry<Artist> {
        &self.registry
    }

    fn get_queryset(&self, auth: &AuthContext, base: Option<Artists>) -> DashResult<Artists> {
        let principal = auth.principal()?;
        let base = base.unwrap_or_else(|| self.registry.default_queryset());
        Ok(in_library(base, principal))
    }
}

pub fn filter_genre(qs: Artists, value: &str, _: &Principal) -> DashResult<Artists> {
    let wanted = value.trim().to_string();
    Ok(qs.filter(move |a, tables| tables.artist_genres(a.id()).any(|g| iexact(&g.name, &wanted))))
}

/// Unknown follower counts count as zero
pub fn filter_min_followers(qs: Artists, value: &str, _: &Principal) -> DashResult<Artists> {
    let minimum: u64 = parse_int("min_followers", value)?;
    Ok(qs.filter(move |a, _| a.follower_count.unwrap_or(0) >= minimum))
}

pub fn filter_is_synced(qs: Artists, value: &str, _: &Principal) -> DashResult<Artists> {
    boolean(qs, "is_synced", value, |a, _| a.is_synced)
}

pub fn search_name(qs: Artists, value: &str, _: &Principal) -> DashResult<Artists> {
    Ok(contains(qs, value, |a, _, matches| matches(&a.name)))
}

pub fn sort_name(qs: Artists, direction: SortDirection, _: &Principal) -> DashResult<Artists> {
    Ok(qs.order_by_key(|a, _| a.name.to_lowercase(), direction))
}

pub fn sort_followers(qs: Artists, direction: SortDirection, _: &Principal) -> DashResult<Artists> {
    Ok(qs.order_by_key(|a, _| a.follower_count.unwrap_or(0), direction))
}
