//! Route registration.
//!
//! Every endpoint is added through [`RouteRegistrar`], which records the endpoint's
//! access rule in the same call that mounts its handler. A route therefore can't exist
//! without a rule, and the rule can't drift away from the route.

use axum::{
    Router,
    handler::Handler,
    http::Method,
    routing::{self, MethodFilter},
};

use crate::{
    auth::{RouteKey, RouteTable, RouteTableBuilder},
    models::Role,
};

/// Health check and API docs.
pub mod public;

/// `/user/*`: registration, login and user administration.
pub mod users;

/// `/role/*`: ADMIN only.
pub mod roles;

/// `/document/*`: uploads and downloads for editors, listing for every role.
pub mod documents;

/// RouteRegistrar
///
/// Builds the router and its [`RouteTable`] side by side.
pub struct RouteRegistrar<S = ()> {
    router: Router<S>,
    table: RouteTableBuilder,
}

impl<S> Default for RouteRegistrar<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> RouteRegistrar<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            table: RouteTable::builder(),
        }
    }

    /// Mounts a handler reachable without a token.
    pub fn public<H, T>(mut self, method: Method, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.table.mark_public(RouteKey::new(method.clone(), path));
        self.mount(method, path, handler)
    }

    /// Mounts a handler that any holder of a valid token may call.
    pub fn authenticated<H, T>(mut self, method: Method, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.table.mark_authenticated(RouteKey::new(method.clone(), path));
        self.mount(method, path, handler)
    }

    /// Mounts a handler restricted to callers holding one of `roles`.
    pub fn restricted<H, T>(mut self, method: Method, path: &str, handler: H, roles: &[Role]) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.table
            .require_roles(RouteKey::new(method.clone(), path), roles);
        self.mount(method, path, handler)
    }

    /// # Panics
    /// Panics on methods axum can't route by (e.g. `CONNECT`) and on overlapping
    /// routes, both of which are startup-time programming errors.
    fn mount<H, T>(mut self, method: Method, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        let filter = MethodFilter::try_from(method.clone())
            .unwrap_or_else(|_| panic!("cannot route method {method} for {path}"));
        self.router = self.router.route(path, routing::on(filter, handler));
        self
    }

    /// The finished router (state not yet provided) and its immutable access table.
    pub fn finish(self) -> (Router<S>, RouteTable) {
        (self.router, self.table.build())
    }
}

/// app_routes
///
/// Registers every endpoint of the service.
pub fn app_routes(registrar: RouteRegistrar<crate::AppState>) -> RouteRegistrar<crate::AppState> {
    let registrar = public::register(registrar);
    let registrar = users::register(registrar);
    let registrar = roles::register(registrar);
    documents::register(registrar)
}
