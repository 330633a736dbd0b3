//! Building blocks shared by the per-resource handlers

use crate::core::auth::Principal;
use crate::core::entity::Entity;
use crate::core::error::DashResult;
use crate::core::field::{icontains, parse_bool};
use crate::storage::{Collection, LibraryItem, Model, Tables};

/// Keep rows whose flag equals the coerced boolean
pub fn boolean<T, F>(
    queryset: Collection<T>,
    field: &str,
    raw: &str,
    flag: F,
) -> DashResult<Collection<T>>
where
    T: Model,
    F: Fn(&T, &Tables) -> bool + Send + Sync + 'static,
{
    let wanted = parse_bool(field, raw)?;
    Ok(queryset.filter(move |row, tables| flag(row, tables) == wanted))
}

/// Keep rows for which `texts` finds `needle` in one of its fields
///
/// `texts` receives a matcher doing case-insensitive containment.
pub fn contains<T, F>(queryset: Collection<T>, needle: &str, texts: F) -> Collection<T>
where
    T: Model,
    F: Fn(&T, &Tables, &dyn Fn(&str) -> bool) -> bool + Send + Sync + 'static,
{
    let needle = needle.to_string();
    queryset.filter(move |row, tables| texts(row, tables, &|text: &str| icontains(text, &needle)))
}

/// Restrict to items saved in the principal's library
pub fn in_library<T: LibraryItem>(queryset: Collection<T>, principal: &Principal) -> Collection<T> {
    let user_id = principal.user_id;
    queryset.filter(move |row, tables| tables.in_library::<T>(user_id, row.id()))
}
