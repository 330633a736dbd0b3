//! Generic parameter dispatch

use crate::core::auth::{AuthContext, Principal};
use crate::core::error::DashResult;
use crate::core::query::{ParameterSet, SortDirection};
use crate::filters::registry::{FilterRegistry, Route};
use crate::storage::{Collection, Model};

/// Apply every recognized parameter to `queryset`
///
/// The `sort` entry is pulled out first. Remaining parameters are visited
/// in order: filter keys go to their filter handler, search keys to their
/// search handler, anything else is skipped. Sorts run last, one per listed
/// field, with the direction read from `<field>_dir` (ascending when
/// absent). Unknown sort fields are skipped as well.
///
/// The first handler error aborts the whole dispatch. The returned
/// collection is never materialized here.
pub fn dispatch<T: Model>(
    registry: &FilterRegistry<T>,
    mut queryset: Collection<T>,
    principal: &Principal,
    params: &ParameterSet,
) -> DashResult<Collection<T>> {
    let resource = registry.resource();
    let mut params = params.clone();
    let sort_fields = params.take_sort();

    for (key, value) in params.iter() {
        queryset = match registry.route(key) {
            Some(Route::Filter(handler)) => {
                tracing::debug!(resource, key, value, "applying filter");
                handler(queryset, value, principal)?
            }
            Some(Route::Search(handler)) => {
                tracing::debug!(resource, key, value, "applying search");
                handler(queryset, value, principal)?
            }
            None => {
                tracing::debug!(resource, key, "ignoring unrecognized parameter");
                queryset
            }
        };
    }

    for field in &sort_fields {
        let Some(handler) = registry.sort_handler(field) else {
            tracing::debug!(resource, field = field.as_str(), "ignoring unknown sort field");
            continue;
        };
        let direction = match params.get(&SortDirection::key_for(field)) {
            Some(raw) => SortDirection::parse(field, raw)?,
            None => SortDirection::Asc,
        };
        tracing::debug!(resource, field = field.as_str(), ?direction, "applying sort");
        queryset = handler(queryset, direction, principal)?;
    }

    Ok(queryset)
}

/// A resource's filter entry point
///
/// Implementors only provide the registry; `get_queryset` can be overridden
/// to narrow the base collection (for example to the viewer's library).
pub trait FilterSet: Send + Sync {
    type Model: Model;

    fn registry(&self) -> &FilterRegistry<Self::Model>;

    /// Resolve the base collection: the caller's if given, else the
    /// registry default
    fn get_queryset(
        &self,
        _auth: &AuthContext,
        base: Option<Collection<Self::Model>>,
    ) -> DashResult<Collection<Self::Model>> {
        Ok(base.unwrap_or_else(|| self.registry().default_queryset()))
    }

    /// Filter and sort a collection from request parameters
    ///
    /// Fails with `Unauthenticated` when `auth` carries no principal.
    fn apply(
        &self,
        auth: &AuthContext,
        params: &ParameterSet,
        base: Option<Collection<Self::Model>>,
    ) -> DashResult<Collection<Self::Model>> {
        let principal = auth.principal()?;
        let queryset = self.get_queryset(auth, base)?;
        dispatch(self.registry(), queryset, principal, params)
    }
}
