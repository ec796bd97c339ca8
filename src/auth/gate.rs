use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{AccessGuard, AuthError, Identity, RouteKey, RouteTable, TokenCodec};

/// GateOutcome
///
/// What the gate decided for a request that it let through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Public route; no token was inspected and no identity is attached.
    Public,
    Authenticated(Identity),
}

/// bearer_token
///
/// Pulls the token out of `Authorization: Bearer <token>`. The scheme is matched
/// case-insensitively; anything other than a single non-empty token after it is malformed.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?;

    let value = value.to_str().map_err(|_| AuthError::MalformedAuthHeader)?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MalformedAuthHeader)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedAuthHeader);
    }

    let token = token.trim();
    if token.is_empty() || token.contains(' ') {
        return Err(AuthError::MalformedAuthHeader);
    }

    Ok(token)
}

/// authenticate_request
///
/// The gate's decision for one request, independent of the HTTP plumbing.
///
/// Public routes pass without looking at headers. Everything else needs a bearer token
/// that verifies; the reason a token failed is logged but never returned to the caller.
pub fn authenticate_request(
    headers: &HeaderMap,
    route: &RouteKey,
    routes: &RouteTable,
    tokens: &TokenCodec,
) -> Result<GateOutcome, AuthError> {
    if routes.is_public(route) {
        return Ok(GateOutcome::Public);
    }

    let token = bearer_token(headers)?;

    match tokens.verify(token) {
        Ok(identity) => {
            tracing::debug!(
                route = %route,
                user_id = identity.user_id(),
                role = ?identity.role(),
                "request authenticated"
            );
            Ok(GateOutcome::Authenticated(identity))
        }
        Err(e) => {
            tracing::warn!(route = %route, error = %e, "rejected bearer token");
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// authenticate
///
/// Middleware form of [`authenticate_request`]. On success the [`Identity`] is stored in
/// the request extensions for the policy and the handlers.
pub async fn authenticate(
    State(guard): State<AccessGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    let route = RouteKey::for_request(&request);

    match authenticate_request(request.headers(), &route, guard.routes(), guard.tokens()) {
        Ok(GateOutcome::Public) => next.run(request).await,
        Ok(GateOutcome::Authenticated(identity)) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(rejection) => rejection.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::access::ADMIN_ONLY, models::Role};
    use axum::http::{HeaderValue, Method};
    use chrono::Duration;

    const SECRET: &str = "gate-test-secret-at-least-32-characters";

    fn table() -> RouteTable {
        let mut builder = RouteTable::builder();
        builder
            .mark_public(RouteKey::new(Method::POST, "/user/login"))
            .mark_authenticated(RouteKey::new(Method::GET, "/user"))
            .require_roles(RouteKey::new(Method::GET, "/role"), ADMIN_ONLY);
        builder.build()
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn viewer() -> Identity {
        Identity::new("user-7", "viewer@example.com", Some(Role::Viewer))
    }

    #[test]
    fn test_public_route_ignores_headers() {
        let codec = TokenCodec::new(SECRET);
        let route = RouteKey::new(Method::POST, "/user/login");

        let outcome =
            authenticate_request(&headers_with("Bearer garbage"), &route, &table(), &codec);

        assert_eq!(outcome, Ok(GateOutcome::Public));
    }

    #[test]
    fn test_missing_header_on_protected_route() {
        let codec = TokenCodec::new(SECRET);
        let route = RouteKey::new(Method::GET, "/user");

        let outcome = authenticate_request(&HeaderMap::new(), &route, &table(), &codec);

        assert_eq!(outcome, Err(AuthError::MissingAuthHeader));
    }

    #[test]
    fn test_unregistered_route_requires_token() {
        let codec = TokenCodec::new(SECRET);
        let route = RouteKey::new(Method::GET, "/not-registered");

        let outcome = authenticate_request(&HeaderMap::new(), &route, &table(), &codec);

        assert_eq!(outcome, Err(AuthError::MissingAuthHeader));
    }

    #[test]
    fn test_valid_token_yields_identity() {
        let codec = TokenCodec::new(SECRET);
        let token = codec.issue(&viewer()).unwrap();
        let route = RouteKey::new(Method::GET, "/role");

        let outcome = authenticate_request(
            &headers_with(&format!("Bearer {token}")),
            &route,
            &table(),
            &codec,
        );

        // The gate only authenticates; role checks happen in the policy.
        assert_eq!(outcome, Ok(GateOutcome::Authenticated(viewer())));
    }

    #[test]
    fn test_expired_token_is_invalid_credentials() {
        let codec = TokenCodec::with_ttl(SECRET, Duration::seconds(-60));
        let token = codec.issue(&viewer()).unwrap();
        let route = RouteKey::new(Method::GET, "/user");

        let outcome = authenticate_request(
            &headers_with(&format!("Bearer {token}")),
            &route,
            &table(),
            &codec,
        );

        assert_eq!(outcome, Err(AuthError::InvalidCredentials));
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def")), Ok("abc.def"));
        assert_eq!(bearer_token(&headers_with("bearer abc.def")), Ok("abc.def"));
        assert_eq!(
            bearer_token(&headers_with("Basic dXNlcjpwYXNz")),
            Err(AuthError::MalformedAuthHeader)
        );
        assert_eq!(
            bearer_token(&headers_with("Bearer")),
            Err(AuthError::MalformedAuthHeader)
        );
        assert_eq!(
            bearer_token(&headers_with("Bearer ")),
            Err(AuthError::MalformedAuthHeader)
        );
        assert_eq!(
            bearer_token(&headers_with("abc.def")),
            Err(AuthError::MalformedAuthHeader)
        );
        assert_eq!(
            bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingAuthHeader)
        );
    }

    #[test]
    fn test_non_ascii_header_is_malformed() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xfftoken").unwrap(),
        );

        assert_eq!(bearer_token(&headers), Err(AuthError::MalformedAuthHeader));
    }
}
