//! # dashspot
//!
//! Library browsing for a music-streaming dashboard: a store of the
//! playlists, albums, artists and tracks a user has saved, declarative
//! query-string filtering over them, and a sync pipeline that mirrors the
//! remote library into the store.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dashspot::prelude::*;
//!
//! let config = AppConfig::from_yaml_file("config/dashspot.yaml")?;
//! init_tracing(&config.logging);
//!
//! let store = LibraryStore::new();
//! let filters = FilterSets::new(&store, &config)?;
//!
//! // GET /playlists?is_synced=true&sort=num_tracks&num_tracks_dir=desc
//! let params = ParameterSet::from_query_str("is_synced=true&sort=num_tracks&num_tracks_dir=desc");
//! let page = filters
//!     .playlists
//!     .apply(&auth, &params, None)?
//!     .paginate(PageRequest::from_params(&params, &config.pagination)?)?;
//! ```

pub mod config;
pub mod core;
pub mod filters;
pub mod models;
pub mod storage;
pub mod sync;

/// Re-exports of commonly used types and traits
pub mod prelude {
    pub use crate::config::{AppConfig, FilterFieldsConfig, PaginationConfig, SyncConfig, init_tracing};

    pub use crate::core::{
        auth::{AuthContext, Principal},
        entity::{Entity, RecordMeta, SpotifyEntity},
        error::{
            ConfigError, DashError, DashResult, RequestError, StorageError, SyncError,
            ValidationError,
        },
        query::{Page, PageRequest, PaginationMeta, ParameterSet, SortDirection},
    };

    pub use crate::filters::{
        AlbumFilterSet, ArtistFilterSet, FilterMeta, FilterRegistry, FilterSet, FilterSets,
        Handlers, PlaylistFilterSet, TrackFilterSet,
    };

    pub use crate::models::{Album, Analysis, AppUser, Artist, Genre, Library, Playlist, Track};

    pub use crate::storage::{Collection, LibraryItem, LibraryStore, Model, Tables};

    pub use crate::sync::{
        LibrarySource, RemotePage, RemoteResource, SyncPipeline, SyncReport, TokenRefresher,
        TokenSet,
    };

    pub use async_trait::async_trait;
    pub use uuid::Uuid;
}
