//! Authentication and authorization for every inbound request.
//!
//! Requests flow through four pieces, leaf to root:
//!
//! - [`token`]: signs and verifies bearer tokens (HS256, 24h expiry).
//! - [`access`]: the immutable route table. Each route is public, merely
//!   authenticated, or restricted to a set of roles. Unlisted routes are protected.
//! - [`gate`]: middleware that skips public routes and otherwise requires a valid
//!   `Authorization: Bearer <token>` header, attaching the decoded [`Identity`].
//! - [`policy`]: middleware that checks the attached identity against the route's
//!   allowed roles.
//!
//! Handlers read the caller through the [`AuthUser`] extractor.

use axum::{
    Router,
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{StatusCode, request::Parts},
    middleware,
    response::{IntoResponse, Response},
};
use std::{convert::Infallible, sync::Arc};
use thiserror::Error;

use crate::{error::error_response, models::Role};

pub mod access;
pub mod gate;
pub mod policy;
pub mod token;

pub use access::{AccessRule, RouteKey, RouteTable, RouteTableBuilder};
pub use policy::permits;
pub use token::{Claims, TokenCodec, TokenError};

/// Identity
///
/// The verified caller of a single request, decoded from its bearer token. Attached to
/// the request extensions by the gate; fields are read-only so nothing downstream can
/// alter who the caller is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user_id: String,
    email: String,
    role: Option<Role>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>, role: Option<Role>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            role,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }
}

/// AuthError
///
/// Every way the gate or the policy can turn a request away. The display strings are
/// the exact messages sent to the caller; verification diagnostics are logged instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization header is missing.")]
    MissingAuthHeader,
    #[error("Invalid authorization header format.")]
    MalformedAuthHeader,
    #[error("Invalid or expired token.")]
    InvalidCredentials,
    #[error("User not authenticated.")]
    NotAuthenticated,
    /// Carries the allowed roles, e.g. `"ADMIN or EDITOR only"`.
    #[error("Access denied. {0}.")]
    Forbidden(String),
}

impl AuthError {
    /// 401 for authentication failures, 403 for authorization failures.
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::MalformedAuthHeader
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::NotAuthenticated | AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        error_response(self.status(), self.to_string())
    }
}

/// AuthUser Extractor
///
/// Hands the caller's [`Identity`] to a handler. Only the gate inserts identities, so on a
/// protected route this always succeeds; a handler that requires `AuthUser` on a public
/// route rejects with `NotAuthenticated`. Public handlers take `Option<AuthUser>`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(AuthUser)
            .ok_or(AuthError::NotAuthenticated)
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<Identity>().cloned().map(AuthUser))
    }
}

/// AccessGuard
///
/// The shared, read-only state of the gate and policy middleware: the route table and
/// the token codec. Both are built once at startup.
#[derive(Clone)]
pub struct AccessGuard {
    routes: Arc<RouteTable>,
    tokens: Arc<TokenCodec>,
}

impl AccessGuard {
    pub fn new(routes: RouteTable, tokens: Arc<TokenCodec>) -> Self {
        Self {
            routes: Arc::new(routes),
            tokens,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }

    /// Wraps every route of `router` with the gate, then the policy.
    ///
    /// Uses `route_layer` so both run after routing, when `MatchedPath` is known.
    /// Must be called after all routes are registered.
    pub fn apply<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router
            // Inner layer: runs second.
            .route_layer(middleware::from_fn_with_state(
                self.clone(),
                policy::authorize,
            ))
            // Outer layer: runs first.
            .route_layer(middleware::from_fn_with_state(self, gate::authenticate))
    }
}
