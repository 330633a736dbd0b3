//! Core types shared by the store, the filters and the sync pipeline

pub mod auth;
pub mod entity;
pub mod error;
pub mod field;
pub mod query;

pub use auth::{AuthContext, Principal};
pub use entity::{Entity, RecordMeta, SpotifyEntity};
pub use error::{DashError, DashResult};
pub use query::{Page, PageRequest, PaginationMeta, ParameterSet, SortDirection};
