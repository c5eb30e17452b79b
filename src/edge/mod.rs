//! Edge router: decides whether a request belongs to another deployed app.
//!
//! The decision is a pure function of the routing table and the request
//! line, so the same input and table always yield the same decision.
//! Loading the table is the only fallible step and it degrades to the
//! static fallback table instead of failing.

pub mod cache;
pub mod middleware;
pub mod proxy;
pub mod source;
pub mod table;

use serde::Serialize;
use std::sync::Arc;
use url::Url;

pub use cache::RoutingTableCache;
pub use middleware::edge_router_middleware;
pub use proxy::{ProxyError, ReverseProxy};
pub use source::{EdgeConfigSource, RoutingSource, SourceError, StaticRoutingSource};
pub use table::{RouteEntry, RouteTarget, RoutingTable, TableOrigin};

/// Query parameter telling the downstream app the user is signed in upstream
pub const SSO_PARAM: &str = "sso";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RouteDecision {
    /// Forward to another app's origin
    Proxy { prefix: String, url: Url },
    /// Known app, but its origin could not be resolved
    Unavailable { prefix: String, location: String },
    /// Handle locally
    PassThrough,
}

pub fn route(
    table: &RoutingTable,
    path: &str,
    query: Option<&str>,
    has_session: bool,
    unavailable_path: &str,
) -> RouteDecision {
    let Some((entry, suffix)) = table.lookup(path) else {
        return RouteDecision::PassThrough;
    };

    match &entry.target {
        RouteTarget::Origin(base) => RouteDecision::Proxy {
            prefix: entry.prefix.clone(),
            url: destination_url(base, suffix, query, has_session),
        },
        RouteTarget::Unavailable => RouteDecision::Unavailable {
            prefix: entry.prefix.clone(),
            location: format!("{}?app={}", unavailable_path, entry.prefix),
        },
    }
}

/// Join `suffix` onto the base path, keep the base's own query, append the
/// caller's query, then add `sso=true` unless an `sso` param already exists.
pub fn destination_url(base: &Url, suffix: &str, query: Option<&str>, has_session: bool) -> Url {
    let mut url = base.clone();

    let path = format!("{}{}", base.path().trim_end_matches('/'), suffix);
    url.set_path(if path.is_empty() { "/" } else { path.as_str() });

    let original = query.map(|q| q.trim_start_matches('?')).filter(|q| !q.is_empty());
    let merged = match (base.query().filter(|q| !q.is_empty()), original) {
        (Some(own), Some(extra)) => Some(format!("{}&{}", own, extra)),
        (Some(own), None) => Some(own.to_string()),
        (None, Some(extra)) => Some(extra.to_string()),
        (None, None) => None,
    };
    url.set_query(merged.as_deref());

    if has_session && !url.query_pairs().any(|(key, _)| key == SSO_PARAM) {
        url.query_pairs_mut().append_pair(SSO_PARAM, "true");
    }

    url
}

/// Routing table cache plus decision logic, shared through `AppState`
pub struct EdgeRouter {
    cache: RoutingTableCache,
    unavailable_path: String,
}

impl EdgeRouter {
    pub fn new(cache: RoutingTableCache, unavailable_path: impl Into<String>) -> Self {
        Self {
            cache,
            unavailable_path: unavailable_path.into(),
        }
    }

    pub async fn decide(&self, path: &str, query: Option<&str>, has_session: bool) -> RouteDecision {
        let table = self.cache.table().await;
        let decision = route(&table, path, query, has_session, &self.unavailable_path);
        tracing::debug!(path, ?decision, "edge routing decision");
        decision
    }

    pub async fn table(&self) -> Arc<RoutingTable> {
        self.cache.table().await
    }

    /// Drop the cached table and load a new one
    pub async fn refresh(&self) -> Arc<RoutingTable> {
        self.cache.invalidate().await;
        self.cache.table().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, &str)]) -> RoutingTable {
        RoutingTable::from_pairs(pairs.iter().copied()).0
    }

    fn proxied(decision: RouteDecision) -> String {
        match decision {
            RouteDecision::Proxy { url, .. } => url.to_string(),
            other => panic!("expected proxy decision, got {:?}", other),
        }
    }

    #[test]
    fn prefix_round_trip_keeps_query() {
        let t = table(&[("inventory", "https://app-a.example")]);
        let decision = route(&t, "/inventory/items", Some("x=1"), false, "/unavailable");
        assert_eq!(proxied(decision), "https://app-a.example/items?x=1");
    }

    #[test]
    fn origin_host_is_normalized() {
        let t = table(&[("inventory", "https://App-A.Example")]);
        let url = proxied(route(&t, "/inventory/items", Some("x=1"), false, "/unavailable"));
        assert_eq!(url, "https://app-a.example/items?x=1");
    }

    #[test]
    fn bare_prefix_goes_to_origin_root() {
        let t = table(&[("inventory", "https://app-a.example")]);
        assert_eq!(
            proxied(route(&t, "/inventory", None, false, "/unavailable")),
            "https://app-a.example/"
        );
    }

    #[test]
    fn base_path_is_preserved() {
        let t = table(&[("l10", "https://apps.example/eos/")]);
        assert_eq!(
            proxied(route(&t, "/l10/meetings/4", None, false, "/unavailable")),
            "https://apps.example/eos/meetings/4"
        );
    }

    #[test]
    fn unmatched_path_passes_through() {
        let t = table(&[("inventory", "https://app-a.example")]);
        assert_eq!(route(&t, "/health", None, true, "/unavailable"), RouteDecision::PassThrough);
        assert_eq!(route(&t, "/", None, true, "/unavailable"), RouteDecision::PassThrough);
    }

    #[test]
    fn session_adds_sso_marker() {
        let t = table(&[("inventory", "https://app-a.example")]);
        assert_eq!(
            proxied(route(&t, "/inventory/items", Some("x=1"), true, "/unavailable")),
            "https://app-a.example/items?x=1&sso=true"
        );
    }

    #[test]
    fn existing_sso_param_is_not_overwritten() {
        let t = table(&[("inventory", "https://app-a.example/?sso=false")]);
        assert_eq!(
            proxied(route(&t, "/inventory/items", None, true, "/unavailable")),
            "https://app-a.example/items?sso=false"
        );

        let t = table(&[("inventory", "https://app-a.example")]);
        assert_eq!(
            proxied(route(&t, "/inventory", Some("sso=false"), true, "/unavailable")),
            "https://app-a.example/?sso=false"
        );
    }

    #[test]
    fn no_session_no_marker() {
        let t = table(&[("inventory", "https://app-a.example")]);
        let url = proxied(route(&t, "/inventory", None, false, "/unavailable"));
        assert!(!url.contains("sso"));
    }

    #[test]
    fn decisions_are_idempotent() {
        let t = table(&[("inventory", "https://app-a.example"), ("meds", "https://meds.example")]);
        let first = route(&t, "/meds/auth/12", Some("tab=notes"), true, "/unavailable");
        let second = route(&t, "/meds/auth/12", Some("tab=notes"), true, "/unavailable");
        assert_eq!(first, second);
    }

    #[test]
    fn fallback_table_points_at_unavailable_page() {
        let t = RoutingTable::fallback();
        assert_eq!(
            route(&t, "/handouts/print", None, false, "/unavailable"),
            RouteDecision::Unavailable {
                prefix: "handouts".to_string(),
                location: "/unavailable?app=handouts".to_string(),
            }
        );
        assert_eq!(route(&t, "/api/routes", None, false, "/unavailable"), RouteDecision::PassThrough);
    }
}
