use axum::http::Method;

use super::RouteRegistrar;
use crate::{AppState, auth::access::ADMIN_ONLY, handlers::users};

/// User Router Module
///
/// Sign-up and login are public. Reading users needs any valid token; creating, changing
/// and deleting users is ADMIN only.
pub fn register(registrar: RouteRegistrar<AppState>) -> RouteRegistrar<AppState> {
    registrar
        .public(Method::POST, "/user/register", users::register_user)
        .public(Method::POST, "/user/login", users::login)
        .restricted(Method::POST, "/user/admin", users::create_user_by_admin, ADMIN_ONLY)
        .restricted(
            Method::PATCH,
            "/user/role/assign/{id}",
            users::assign_role,
            ADMIN_ONLY,
        )
        .authenticated(Method::GET, "/user", users::list_users)
        .authenticated(Method::GET, "/user/{id}", users::get_user)
        .restricted(Method::PATCH, "/user/{id}", users::update_user, ADMIN_ONLY)
        .restricted(Method::DELETE, "/user/{id}", users::delete_user, ADMIN_ONLY)
}
