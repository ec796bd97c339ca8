use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{AccessGuard, AuthError, Identity, RouteKey};
use crate::models::Role;

/// permits
///
/// Whether `identity` may use a route restricted to `allowed`.
///
/// A missing identity is `NotAuthenticated`. A caller without a role, or with a role not
/// in `allowed`, is `Forbidden`. An empty `allowed` set admits nobody.
pub fn permits(identity: Option<&Identity>, allowed: &[Role]) -> Result<(), AuthError> {
    let identity = identity.ok_or(AuthError::NotAuthenticated)?;

    match identity.role() {
        Some(role) if allowed.contains(&role) => Ok(()),
        _ => Err(AuthError::Forbidden(describe(allowed))),
    }
}

/// "ADMIN only", "ADMIN or EDITOR only", "ADMIN, EDITOR or VIEWER only".
fn describe(allowed: &[Role]) -> String {
    let names: Vec<&str> = allowed.iter().map(Role::as_str).collect();
    let joined = match names.as_slice() {
        [] => return "No role may access this resource".to_string(),
        [only] => (*only).to_string(),
        [init @ .., last] => format!("{} or {}", init.join(", "), last),
    };
    format!("{joined} only")
}

/// authorize
///
/// Middleware that enforces the route's role restriction. Routes without one pass
/// through. Denials are logged with the caller and the route.
pub async fn authorize(State(guard): State<AccessGuard>, request: Request, next: Next) -> Response {
    let route = RouteKey::for_request(&request);

    let Some(allowed) = guard.routes().required_roles(&route) else {
        return next.run(request).await;
    };

    let identity = request.extensions().get::<Identity>();

    if let Err(denied) = permits(identity, allowed) {
        tracing::warn!(
            route = %route,
            user_id = identity.map(Identity::user_id),
            role = ?identity.and_then(Identity::role),
            reason = %denied,
            "access denied"
        );
        return denied.into_response();
    }

    next.run(request).await
}
