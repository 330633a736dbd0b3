//! Declarative query filtering
//!
//! Each resource declares which query parameters it understands in a
//! [`FilterRegistry`]: filter keys, search keys and sort keys, each bound
//! to a typed handler. [`FilterSet::apply`] turns a [`ParameterSet`] into a
//! narrowed, sorted, still-lazy [`Collection`](crate::storage::Collection).
//!
//! ```rust,ignore
//! let filters = FilterSets::new(&store, &config)?;
//! let params = ParameterSet::from_query_str("name=chill&is_synced=true&sort=name");
//! let page = filters
//!     .playlists
//!     .apply(&auth, &params, None)?
//!     .paginate(PageRequest::from_params(&params, &config.pagination)?)?;
//! ```
//!
//! [`ParameterSet`]: crate::core::query::ParameterSet

pub mod album;
pub mod artist;
pub mod dispatch;
pub mod lookups;
pub mod playlist;
pub mod registry;
pub mod track;

pub use album::AlbumFilterSet;
pub use artist::ArtistFilterSet;
pub use dispatch::{FilterSet, dispatch};
pub use playlist::PlaylistFilterSet;
pub use registry::{FilterHandler, FilterMeta, FilterRegistry, Handlers, Route, SortHandler};
pub use track::TrackFilterSet;

use crate::config::AppConfig;
use crate::core::error::ConfigError;
use crate::storage::LibraryStore;

/// Resources that accept filter configuration
pub const RESOURCES: &[&str] = &["playlists", "tracks", "albums", "artists"];

/// Every resource's filter set, built and validated together at startup
pub struct FilterSets {
    pub playlists: PlaylistFilterSet,
    pub tracks: TrackFilterSet,
    pub albums: AlbumFilterSet,
    pub artists: ArtistFilterSet,
}

impl FilterSets {
    /// Build all registries, applying configured key overrides
    ///
    /// Fails on the first resource whose declared keys cannot all be
    /// resolved to handlers, or when the configuration names an unknown
    /// resource.
    pub fn new(store: &LibraryStore, config: &AppConfig) -> Result<Self, ConfigError> {
        if let Some(resource) = config
            .filters
            .keys()
            .find(|resource| !RESOURCES.contains(&resource.as_str()))
        {
            return Err(ConfigError::UnknownResource {
                resource: resource.clone(),
            });
        }

        let overrides = |resource: &str| config.filter_fields(resource);

        Ok(Self {
            playlists: PlaylistFilterSet::with_meta(
                store,
                PlaylistFilterSet::meta().with_overrides(overrides("playlists")),
            )?,
            tracks: TrackFilterSet::with_meta(
                store,
                TrackFilterSet::meta().with_overrides(overrides("tracks")),
            )?,
            albums: AlbumFilterSet::with_meta(
                store,
                AlbumFilterSet::meta().with_overrides(overrides("albums")),
            )?,
            artists: ArtistFilterSet::with_meta(
                store,
                ArtistFilterSet::meta().with_overrides(overrides("artists")),
            )?,
        })
    }
}
