use axum::http::Method;

use super::RouteRegistrar;
use crate::{AppState, auth::access::ADMIN_ONLY, handlers::roles};

/// Role Router Module
///
/// Role management, listing included, is ADMIN only.
pub fn register(registrar: RouteRegistrar<AppState>) -> RouteRegistrar<AppState> {
    registrar
        .restricted(Method::POST, "/role", roles::create_role, ADMIN_ONLY)
        .restricted(Method::GET, "/role", roles::list_roles, ADMIN_ONLY)
        .restricted(Method::GET, "/role/{id}", roles::get_role, ADMIN_ONLY)
        .restricted(Method::PATCH, "/role/{id}", roles::update_role, ADMIN_ONLY)
        .restricted(Method::DELETE, "/role/{id}", roles::delete_role, ADMIN_ONLY)
}
