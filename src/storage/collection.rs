//! Lazy, re-filterable views over a table

use crate::core::entity::Entity;
use crate::core::error::DashResult;
use crate::core::query::{Page, PageRequest, PaginationMeta, SortDirection};
use crate::storage::in_memory::LibraryStore;
use crate::storage::tables::{Model, Tables};
use std::cmp::Ordering;
use std::sync::Arc;
use uuid::Uuid;

/// Row predicate; receives the tables so it can follow relationships
pub type Predicate<T> = Arc<dyn Fn(&T, &Tables) -> bool + Send + Sync>;

/// Ascending row comparison
pub type Comparator<T> = Arc<dyn Fn(&T, &T, &Tables) -> Ordering + Send + Sync>;

/// An ordered, lazily-evaluated view over records of one type
///
/// Narrowing and ordering build new views and never touch the store or the
/// view they were called on. Nothing is read until a materializing method
/// (`to_vec`, `count`, `paginate`, ...) runs, and each of those works on a
/// single consistent read snapshot.
///
/// Predicates are conjunctive, so the order in which they were added does
/// not affect the result. Comparators chain: the first one added is the
/// primary key, later ones break ties. Without any comparator the model's
/// default ordering applies; insertion order breaks every remaining tie.
pub struct Collection<T: Model> {
    store: LibraryStore,
    predicates: Vec<Predicate<T>>,
    ordering: Vec<Comparator<T>>,
}

impl<T: Model> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            predicates: self.predicates.clone(),
            ordering: self.ordering.clone(),
        }
    }
}

impl<T: Model> std::fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("resource", &T::resource_name())
            .field("predicates", &self.predicates.len())
            .field("ordering", &self.ordering.len())
            .finish()
    }
}

impl<T: Model> Collection<T> {
    pub fn new(store: LibraryStore) -> Self {
        Self {
            store,
            predicates: Vec::new(),
            ordering: Vec::new(),
        }
    }

    pub fn store(&self) -> &LibraryStore {
        &self.store
    }

    /// Keep only rows matching `predicate`
    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&T, &Tables) -> bool + Send + Sync + 'static,
    {
        let mut next = self.clone();
        next.predicates.push(Arc::new(predicate));
        next
    }

    /// Drop rows matching `predicate`
    pub fn exclude<F>(&self, predicate: F) -> Self
    where
        F: Fn(&T, &Tables) -> bool + Send + Sync + 'static,
    {
        self.filter(move |row, tables| !predicate(row, tables))
    }

    /// Add a sort key given as an ascending comparison
    pub fn order_by<F>(&self, compare: F, direction: SortDirection) -> Self
    where
        F: Fn(&T, &T, &Tables) -> Ordering + Send + Sync + 'static,
    {
        let mut next = self.clone();
        next.ordering.push(Arc::new(move |a: &T, b: &T, tables: &Tables| {
            direction.apply(compare(a, b, tables))
        }));
        next
    }

    /// Add a sort key derived from each row
    pub fn order_by_key<K, F>(&self, key: F, direction: SortDirection) -> Self
    where
        K: Ord,
        F: Fn(&T, &Tables) -> K + Send + Sync + 'static,
    {
        self.order_by(move |a, b, tables| key(a, tables).cmp(&key(b, tables)), direction)
    }

    pub fn to_vec(&self) -> DashResult<Vec<T>> {
        self.with_rows(|rows, _| rows.into_iter().cloned().collect())
    }

    pub fn count(&self) -> DashResult<usize> {
        let tables = self.store.read()?;
        Ok(T::table(&tables)
            .values()
            .filter(|row| self.matches(row, &tables))
            .count())
    }

    pub fn exists(&self) -> DashResult<bool> {
        let tables = self.store.read()?;
        Ok(T::table(&tables)
            .values()
            .any(|row| self.matches(row, &tables)))
    }

    pub fn first(&self) -> DashResult<Option<T>> {
        self.with_rows(|rows, _| rows.first().map(|row| (*row).clone()))
    }

    pub fn ids(&self) -> DashResult<Vec<Uuid>> {
        self.with_rows(|rows, _| rows.iter().map(|row| row.id()).collect())
    }

    pub fn contains(&self, id: Uuid) -> DashResult<bool> {
        let tables = self.store.read()?;
        Ok(T::table(&tables)
            .get(&id)
            .is_some_and(|row| self.matches(row, &tables)))
    }

    /// Materialize one page; pages past the end are empty
    pub fn paginate(&self, request: PageRequest) -> DashResult<Page<T>> {
        self.with_rows(|rows, _| {
            let pagination = PaginationMeta::new(request.page, request.page_size, rows.len());
            let data = rows
                .into_iter()
                .skip(request.offset())
                .take(request.page_size)
                .cloned()
                .collect();
            Page { data, pagination }
        })
    }

    fn matches(&self, row: &T, tables: &Tables) -> bool {
        self.predicates.iter().all(|predicate| predicate(row, tables))
    }

    fn compare(&self, a: &T, b: &T, tables: &Tables) -> Ordering {
        if self.ordering.is_empty() {
            return T::default_ordering(a, b, tables);
        }
        self.ordering
            .iter()
            .map(|compare| compare(a, b, tables))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Run `f` over the matching rows, sorted, under one read lock
    fn with_rows<R>(&self, f: impl FnOnce(Vec<&T>, &Tables) -> R) -> DashResult<R> {
        let tables = self.store.read()?;
        let mut rows: Vec<&T> = T::table(&tables)
            .values()
            .filter(|row| self.matches(row, &tables))
            .collect();
        // stable: equal rows stay in insertion order
        rows.sort_by(|a, b| self.compare(a, b, &tables));
        Ok(f(rows, &tables))
    }
}
