#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::OriginalUri,
    http::{header, HeaderMap, Request, Response},
    response::IntoResponse,
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use portal_gateway::audit::{AuditEvent, Auditor, MemoryAuditSink};
use portal_gateway::auth::{issue_token, Claims, JwtSessionResolver};
use portal_gateway::config::AppConfig;
use portal_gateway::database::{MemoryProfileStore, StaffProfile};
use portal_gateway::edge::source::AppUrls;
use portal_gateway::edge::{
    EdgeRouter, ReverseProxy, RoutingSource, RoutingTableCache, SourceError, StaticRoutingSource,
};
use portal_gateway::state::AppState;
use portal_gateway::store::MemoryKvStore;

pub const SECRET: &str = "integration-test-secret";

/// In-process gateway with in-memory collaborators the test can inspect
pub struct TestGateway {
    pub state: AppState,
    pub profiles: MemoryProfileStore,
    pub audit: MemoryAuditSink,
}

/// Set RUST_LOG to see gateway logs while debugging a test
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.auth.jwt_secret = SECRET.to_string();
    config.auth.lookup_timeout_ms = 500;
    config.routing.fetch_timeout_ms = 200;
    config.proxy.timeout_ms = 2_000;
    config
}

impl TestGateway {
    pub fn new(pairs: &[(&str, &str)]) -> Result<Self> {
        let pairs: AppUrls = pairs.iter().map(|(p, u)| (p.to_string(), u.to_string())).collect();
        Self::with_source(test_config(), Arc::new(StaticRoutingSource::new(pairs)))
    }

    pub fn with_source(config: AppConfig, source: Arc<dyn RoutingSource>) -> Result<Self> {
        init_tracing();

        let profiles = MemoryProfileStore::new();
        let audit = MemoryAuditSink::new();

        let cache = RoutingTableCache::new(
            source,
            Duration::from_secs(config.routing.cache_ttl_secs),
            Duration::from_millis(config.routing.fetch_timeout_ms),
        );
        let edge = EdgeRouter::new(cache, config.routing.unavailable_path.clone());
        let proxy = ReverseProxy::new(Duration::from_millis(config.proxy.timeout_ms), config.proxy.max_body_bytes)
            .context("failed to build proxy")?;
        let sessions = JwtSessionResolver::new(config.auth.jwt_secret.clone(), config.auth.session_cookie.clone());

        let state = AppState {
            config: Arc::new(config),
            edge: Arc::new(edge),
            proxy: Arc::new(proxy),
            sessions: Arc::new(sessions),
            profiles: Arc::new(profiles.clone()),
            auditor: Auditor::new(Arc::new(audit.clone())),
            kv: Arc::new(MemoryKvStore::new()),
            db: None,
        };

        Ok(Self { state, profiles, audit })
    }

    pub fn router(&self) -> Router {
        portal_gateway::app(self.state.clone())
    }

    /// Register an active profile and return a bearer token for it
    pub async fn staff(&self, role: &str) -> String {
        let profile = profile(role);
        let token = token_for(&profile);
        self.profiles.insert(profile).await;
        token
    }

    pub async fn send(&self, request: Request<Body>) -> Result<Response<Body>> {
        Ok(self.router().oneshot(request).await?)
    }

    /// Audit writes are spawned; poll until `count` events have landed
    pub async fn audit_events(&self, count: usize) -> Vec<AuditEvent> {
        for _ in 0..50 {
            let events = self.audit.events();
            if events.len() >= count {
                return events;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.audit.events()
    }
}

pub fn profile(role: &str) -> StaffProfile {
    let user_id = Uuid::new_v4();
    StaffProfile {
        user_id,
        email: format!("{}-{}@example.com", role, &user_id.to_string()[..8]),
        name: Some("Test User".to_string()),
        role: role.to_string(),
        department: None,
        locations: vec!["main".to_string()],
        permissions: vec![],
        is_active: true,
        app_permissions: Default::default(),
    }
}

pub fn token_for(profile: &StaffProfile) -> String {
    let claims = Claims::new(profile.user_id, profile.email.clone(), 1).expect("valid lifetime");
    issue_token(SECRET, &claims).expect("failed to mint test token")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("valid request")
}

pub fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .expect("valid request")
}

pub async fn body_json(response: Response<Body>) -> Result<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub async fn body_text(response: Response<Body>) -> Result<String> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}

/// Upstream app that echoes what it received and sets two cookies
pub async fn spawn_upstream() -> Result<String> {
    async fn echo(OriginalUri(uri): OriginalUri, headers: HeaderMap) -> impl IntoResponse {
        let forwarded_host = headers
            .get("x-forwarded-host")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut response = Json(json!({
            "path": uri.path(),
            "query": uri.query(),
            "forwarded_host": forwarded_host,
        }))
        .into_response();

        let cookies = response.headers_mut();
        cookies.append(header::SET_COOKIE, "a=1; Path=/".parse().expect("cookie"));
        cookies.append(header::SET_COOKIE, "b=2; Path=/".parse().expect("cookie"));
        response
    }

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let app = Router::new().fallback(echo);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(format!("http://{}", addr))
}

/// Address nothing is listening on
pub fn dead_upstream() -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    Ok(format!("http://127.0.0.1:{}", port))
}

/// Routing source that always fails
pub struct BrokenSource;

#[async_trait]
impl RoutingSource for BrokenSource {
    async fn get_app_urls(&self) -> Result<Option<AppUrls>, SourceError> {
        Err(SourceError::Malformed("store offline".to_string()))
    }

    fn describe(&self) -> String {
        "broken".to_string()
    }
}
