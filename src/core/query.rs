//! Query parameters and pagination utilities

use crate::config::PaginationConfig;
use crate::core::error::ValidationError;
use crate::core::field::parse_int;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::convert::Infallible;

/// Parameter holding the list of sort fields
pub const SORT_KEY: &str = "sort";

/// Ordered, multi-valued query parameters
///
/// Keys keep the position of their first occurrence. Repeated keys collect
/// every value; single-value reads see the last one, matching how form
/// decoders usually resolve duplicates.
///
/// # Example
/// ```rust,ignore
/// GET /playlists?name=chill&is_synced=true&sort=name,num_tracks&name_dir=desc
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    entries: IndexMap<String, Vec<String>>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a raw `application/x-www-form-urlencoded` query string
    pub fn from_query_str(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        url::form_urlencoded::parse(query.as_bytes())
            .filter(|(key, _)| !key.is_empty())
            .fold(Self::new(), |mut params, (key, value)| {
                params.append(key.into_owned(), value.into_owned());
                params
            })
    }

    /// Append a value, keeping any earlier values for the same key
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.entry(key.into()).or_default().push(value.into());
    }

    /// Builder form of [`append`](Self::append)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(key, value);
        self
    }

    /// The last value given for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove a key, preserving the order of the remaining entries
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.entries.shift_remove(key)
    }

    /// Remove the `sort` entry and return its field names in order
    ///
    /// Both repeated keys (`sort=a&sort=b`) and comma-separated lists
    /// (`sort=a,b`) are accepted. Blank entries are dropped.
    pub fn take_sort(&mut self) -> Vec<String> {
        self.remove(SORT_KEY)
            .unwrap_or_default()
            .iter()
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Iterate `(key, last value)` pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter_map(|(key, values)| {
            values.last().map(|value| (key.as_str(), value.as_str()))
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.append(key, value);
        }
        params
    }
}

impl<S> FromRequestParts<S> for ParameterSet
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_query_str(parts.uri.query().unwrap_or_default()))
    }
}

/// Direction attached to a sort field through `<field>_dir`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Parse the value of `<field>_dir`
    pub fn parse(field: &str, raw: &str) -> Result<Self, ValidationError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(ValidationError::InvalidDirection {
                field: field.to_string(),
                value: raw.to_string(),
            }),
        }
    }

    /// Key holding the direction for `field`
    pub fn key_for(field: &str) -> String {
        format!("{field}_dir")
    }

    /// Orient an ascending comparison result
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Requested page of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number (starts at 1)
    pub page: usize,
    pub page_size: usize,
}

impl PageRequest {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    /// Read `page` and `page_size` from the parameters
    ///
    /// Missing values fall back to the configured defaults; `page_size` is
    /// clamped to the configured maximum.
    pub fn from_params(
        params: &ParameterSet,
        config: &PaginationConfig,
    ) -> Result<Self, ValidationError> {
        let page = match params.get("page") {
            Some(raw) => parse_int::<usize>("page", raw)?,
            None => 1,
        };
        let page_size = match params.get("page_size") {
            Some(raw) => parse_int::<usize>("page_size", raw)?,
            None => config.default_page_size,
        };
        Ok(Self::new(page, page_size.min(config.max_page_size)))
    }

    /// Rows to skip; saturates for page numbers far past any real data
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    /// Total number of items (after filters)
    pub total: usize,
    pub per_page: usize,
    /// Current page number (starts at 1)
    pub page: usize,
    pub num_pages: usize,
}

impl PaginationMeta {
    pub fn new(page: usize, per_page: usize, total: usize) -> Self {
        let per_page = per_page.max(1);
        let num_pages = if total == 0 { 0 } else { total.div_ceil(per_page) };
        Self {
            total,
            per_page,
            page,
            num_pages,
        }
    }
}
