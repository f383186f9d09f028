use crate::server::SharedState;
use crate::views::{home, labeled};
use axum::{routing::get, routing::MethodRouter, Router};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Labeled,
}

impl View {
    fn handler(self) -> MethodRouter<SharedState> {
        match self {
            View::Home => get(home::show).post(home::detect),
            View::Labeled => get(labeled::show).post(labeled::save),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRecord {
    pub path: &'static str,
    pub name: &'static str,
    pub view: View,
}

pub const ROUTES: [RouteRecord; 2] = [
    RouteRecord {
        path: "/",
        name: "home",
        view: View::Home,
    },
    RouteRecord {
        path: "/labeled",
        name: "labeled",
        view: View::Labeled,
    },
];

/// `/app/`, `app` and ` /app ` all become `/app`; `/` and the empty string become `""`.
pub fn normalize_base(base_path: &str) -> String {
    let trimmed = base_path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// The application's routes mounted under a base path.
#[derive(Debug, Clone)]
pub struct RouteTable {
    base: String,
    routes: &'static [RouteRecord],
}

impl RouteTable {
    pub fn new(base_path: &str) -> Self {
        Self {
            base: normalize_base(base_path),
            routes: &ROUTES,
        }
    }

    pub fn base(&self) -> &str {
        if self.base.is_empty() {
            "/"
        } else {
            &self.base
        }
    }

    pub fn routes(&self) -> &'static [RouteRecord] {
        self.routes
    }

    fn full_path(&self, route: &RouteRecord) -> String {
        format!("{}{}", self.base, route.path)
    }

    pub fn href(&self, name: &str) -> Option<String> {
        self.routes
            .iter()
            .find(|route| route.name == name)
            .map(|route| self.full_path(route))
    }

    pub fn resolve(&self, location: &str) -> Option<&'static RouteRecord> {
        let path = location
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let rest = path.strip_prefix(self.base.as_str())?;
        let rest = match rest.trim_end_matches('/') {
            "" => "/",
            other if other.starts_with('/') => other,
            _ => return None,
        };

        self.routes.iter().find(|route| route.path == rest)
    }

    pub fn mount(&self) -> Router<SharedState> {
        self.routes.iter().fold(Router::new(), |router, route| {
            let path = self.full_path(route);
            tracing::debug!("Mounting view {} at {}", route.name, path);
            let router = router.route(&path, route.view.handler());
            // `/app` and `/app/` both reach the home view
            if route.path == "/" && !self.base.is_empty() {
                router.route(&self.base, route.view.handler())
            } else {
                router
            }
        })
    }
}
