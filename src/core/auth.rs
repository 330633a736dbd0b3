//! Request principals
//!
//! Authentication itself happens upstream (token verification is not part of
//! this crate). Whatever authenticates the request inserts a [`Principal`]
//! into the request extensions; handlers then extract an [`AuthContext`] and
//! ask it for the principal when an operation requires one.

use crate::core::error::{DashResult, RequestError};
use crate::models::AppUser;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use uuid::Uuid;

/// The authenticated actor behind a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    /// Streaming-service account id, used for "mine" filters
    pub spotify_id: String,
    pub email: String,
}

impl From<&AppUser> for Principal {
    fn from(user: &AppUser) -> Self {
        Self {
            user_id: user.meta.id,
            spotify_id: user.spotify_id.clone(),
            email: user.email.clone(),
        }
    }
}

/// Authorization context extracted from a request
#[derive(Debug, Clone, Default)]
pub enum AuthContext {
    /// Authenticated user
    User(Principal),

    /// No authentication
    #[default]
    Anonymous,
}

impl AuthContext {
    /// Resolve the principal, failing with `Unauthenticated` when there is none
    pub fn principal(&self) -> DashResult<&Principal> {
        match self {
            AuthContext::User(principal) => Ok(principal),
            AuthContext::Anonymous => Err(RequestError::Unauthenticated.into()),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            AuthContext::User(principal) => Some(principal.user_id),
            AuthContext::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthContext::User(_))
    }
}

impl From<Principal> for AuthContext {
    fn from(principal: Principal) -> Self {
        AuthContext::User(principal)
    }
}

impl From<Option<Principal>> for AuthContext {
    fn from(principal: Option<Principal>) -> Self {
        principal.map(AuthContext::User).unwrap_or_default()
    }
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Principal>().cloned().into())
    }
}
