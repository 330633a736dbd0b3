//! Per-resource filter declarations and their handlers

use crate::config::FilterFieldsConfig;
use crate::core::auth::Principal;
use crate::core::error::{ConfigError, DashResult};
use crate::core::query::SortDirection;
use crate::storage::{Collection, Model};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Narrows a collection using one raw parameter value
pub type FilterHandler<T> =
    Arc<dyn Fn(Collection<T>, &str, &Principal) -> DashResult<Collection<T>> + Send + Sync>;

/// Orders a collection by one field
pub type SortHandler<T> =
    Arc<dyn Fn(Collection<T>, SortDirection, &Principal) -> DashResult<Collection<T>> + Send + Sync>;

/// Which parameter names a resource exposes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterMeta {
    pub filter_fields: Vec<String>,
    pub search_fields: Vec<String>,
    pub sort_fields: Vec<String>,
}

impl FilterMeta {
    pub fn new(filter_fields: &[&str], search_fields: &[&str], sort_fields: &[&str]) -> Self {
        let owned = |fields: &[&str]| fields.iter().map(|f| f.to_string()).collect();
        Self {
            filter_fields: owned(filter_fields),
            search_fields: owned(search_fields),
            sort_fields: owned(sort_fields),
        }
    }

    /// Replace the lists a configuration override provides
    pub fn with_overrides(mut self, overrides: Option<&FilterFieldsConfig>) -> Self {
        if let Some(overrides) = overrides {
            if let Some(fields) = &overrides.filter_fields {
                self.filter_fields = fields.clone();
            }
            if let Some(fields) = &overrides.search_fields {
                self.search_fields = fields.clone();
            }
            if let Some(fields) = &overrides.sort_fields {
                self.sort_fields = fields.clone();
            }
        }
        self
    }
}

/// Handler table for one resource, keyed by parameter name
pub struct Handlers<T: Model> {
    filters: HashMap<String, FilterHandler<T>>,
    searches: HashMap<String, FilterHandler<T>>,
    sorts: HashMap<String, SortHandler<T>>,
}

impl<T: Model> Default for Handlers<T> {
    fn default() -> Self {
        Self {
            filters: HashMap::new(),
            searches: HashMap::new(),
            sorts: HashMap::new(),
        }
    }
}

impl<T: Model> Handlers<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter<F>(mut self, key: &str, handler: F) -> Self
    where
        F: Fn(Collection<T>, &str, &Principal) -> DashResult<Collection<T>> + Send + Sync + 'static,
    {
        self.filters.insert(key.to_string(), Arc::new(handler));
        self
    }

    pub fn search<F>(mut self, key: &str, handler: F) -> Self
    where
        F: Fn(Collection<T>, &str, &Principal) -> DashResult<Collection<T>> + Send + Sync + 'static,
    {
        self.searches.insert(key.to_string(), Arc::new(handler));
        self
    }

    pub fn sort<F>(mut self, key: &str, handler: F) -> Self
    where
        F: Fn(Collection<T>, SortDirection, &Principal) -> DashResult<Collection<T>>
            + Send
            + Sync
            + 'static,
    {
        self.sorts.insert(key.to_string(), Arc::new(handler));
        self
    }
}

/// Where a parameter key is dispatched
pub enum Route<'a, T: Model> {
    Filter(&'a FilterHandler<T>),
    Search(&'a FilterHandler<T>),
}

/// Immutable, validated filter configuration for one resource
///
/// Built once at startup. Construction fails if any declared key lacks a
/// handler, so a registry that exists can always dispatch every key it
/// declares.
pub struct FilterRegistry<T: Model> {
    default_queryset: Collection<T>,
    meta: FilterMeta,
    filters: IndexMap<String, FilterHandler<T>>,
    searches: IndexMap<String, FilterHandler<T>>,
    sorts: IndexMap<String, SortHandler<T>>,
}

impl<T: Model> FilterRegistry<T> {
    pub fn new(
        default_queryset: Collection<T>,
        meta: FilterMeta,
        handlers: Handlers<T>,
    ) -> Result<Self, ConfigError> {
        let resource = T::resource_name();
        let filters = resolve(resource, "filter", &meta.filter_fields, &handlers.filters)?;
        let searches = resolve(resource, "search", &meta.search_fields, &handlers.searches)?;
        let sorts = resolve(resource, "sort", &meta.sort_fields, &handlers.sorts)?;

        for key in searches.keys().filter(|key| filters.contains_key(*key)) {
            tracing::warn!(
                resource,
                key = key.as_str(),
                "key declared as both filter and search; the filter handler wins"
            );
        }

        tracing::debug!(
            resource,
            filters = filters.len(),
            searches = searches.len(),
            sorts = sorts.len(),
            "filter registry built"
        );

        Ok(Self {
            default_queryset,
            meta,
            filters,
            searches,
            sorts,
        })
    }

    pub fn resource(&self) -> &'static str {
        T::resource_name()
    }

    pub fn default_queryset(&self) -> Collection<T> {
        self.default_queryset.clone()
    }

    pub fn meta(&self) -> &FilterMeta {
        &self.meta
    }

    /// Filter fields take precedence over search fields
    pub fn route(&self, key: &str) -> Option<Route<'_, T>> {
        if let Some(handler) = self.filters.get(key) {
            return Some(Route::Filter(handler));
        }
        self.searches.get(key).map(Route::Search)
    }

    pub fn sort_handler(&self, key: &str) -> Option<&SortHandler<T>> {
        self.sorts.get(key)
    }
}

fn resolve<H: Clone>(
    resource: &str,
    kind: &str,
    declared: &[String],
    handlers: &HashMap<String, H>,
) -> Result<IndexMap<String, H>, ConfigError> {
    declared
        .iter()
        .map(|field| {
            handlers
                .get(field)
                .map(|handler| (field.clone(), handler.clone()))
                .ok_or_else(|| ConfigError::MissingHandler {
                    resource: resource.to_string(),
                    kind: kind.to_string(),
                    field: field.clone(),
                })
        })
        .collect()
}
