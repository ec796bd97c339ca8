use axum::{
    extract::MatchedPath,
    http::{Method, Request},
};
use std::{collections::HashMap, fmt};

use crate::models::Role;

/// Roles allowed to upload, download, rename and delete documents.
pub const DOCUMENT_EDITORS: &[Role] = &[Role::Admin, Role::Editor];
/// Roles allowed to list documents.
pub const DOCUMENT_READERS: &[Role] = &[Role::Admin, Role::Editor, Role::Viewer];
/// Role management and user administration.
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// RouteKey
///
/// Identifies a route by HTTP method and the route template it was registered under
/// (e.g. `GET /document/download/{id}`), not by the concrete request path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    method: Method,
    path: String,
}

impl RouteKey {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        // axum answers HEAD with the GET handler, so it must share GET's rule.
        let method = if method == Method::HEAD {
            Method::GET
        } else {
            method
        };
        Self {
            method,
            path: path.into(),
        }
    }

    /// The key of the route a request was routed to.
    ///
    /// Falls back to the raw URI path when no route template is attached; such a key
    /// is never registered, so the request is treated as protected.
    pub fn for_request<B>(request: &Request<B>) -> Self {
        let path = request
            .extensions()
            .get::<MatchedPath>()
            .map(|matched| matched.as_str().to_owned())
            .unwrap_or_else(|| request.uri().path().to_owned());
        Self::new(request.method().clone(), path)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// AccessRule
///
/// What a route demands of its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRule {
    /// No token needed; the gate lets the request through untouched.
    Public,
    /// Any valid token.
    Authenticated,
    /// A valid token whose role is one of these.
    Roles(Vec<Role>),
}

/// RouteTable
///
/// Immutable map from route to [`AccessRule`], built once while routes are registered.
/// A route that was never registered is protected.
#[derive(Debug, Default)]
pub struct RouteTable {
    rules: HashMap<RouteKey, AccessRule>,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    pub fn rule(&self, route: &RouteKey) -> Option<&AccessRule> {
        self.rules.get(route)
    }

    pub fn is_public(&self, route: &RouteKey) -> bool {
        matches!(self.rules.get(route), Some(AccessRule::Public))
    }

    /// The roles a route is restricted to, if it is restricted at all.
    pub fn required_roles(&self, route: &RouteKey) -> Option<&[Role]> {
        match self.rules.get(route) {
            Some(AccessRule::Roles(roles)) => Some(roles.as_slice()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// RouteTableBuilder
///
/// The only way to populate a [`RouteTable`]. Consumed by `build`, after which the
/// table can no longer change.
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    rules: HashMap<RouteKey, AccessRule>,
}

impl RouteTableBuilder {
    pub fn mark_public(&mut self, route: RouteKey) -> &mut Self {
        self.insert(route, AccessRule::Public)
    }

    pub fn mark_authenticated(&mut self, route: RouteKey) -> &mut Self {
        self.insert(route, AccessRule::Authenticated)
    }

    pub fn require_roles(&mut self, route: RouteKey, roles: &[Role]) -> &mut Self {
        self.insert(route, AccessRule::Roles(roles.to_vec()))
    }

    /// # Panics
    /// Panics if the route already has a rule. Registration happens at startup, and
    /// axum itself panics on duplicate method routes in the same way.
    fn insert(&mut self, route: RouteKey, rule: AccessRule) -> &mut Self {
        if let Some(existing) = self.rules.get(&route) {
            panic!("route `{route}` already registered as {existing:?}");
        }
        self.rules.insert(route, rule);
        self
    }

    pub fn build(self) -> RouteTable {
        RouteTable { rules: self.rules }
    }
}
