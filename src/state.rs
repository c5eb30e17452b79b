use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::PgPool;

use crate::audit::{Auditor, PgAuditSink, TracingAuditSink};
use crate::auth::{JwtSessionResolver, SessionResolver};
use crate::config::{AppConfig, AuditSinkKind};
use crate::database::{self, MemoryProfileStore, PgProfileStore, ProfileStore};
use crate::edge::{
    EdgeConfigSource, EdgeRouter, ReverseProxy, RoutingSource, RoutingTableCache, StaticRoutingSource,
};
use crate::store::{KvStore, MemoryKvStore};

/// Every collaborator the gateway talks to, built once at startup and
/// handed to handlers and middleware through axum state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub edge: Arc<EdgeRouter>,
    pub proxy: Arc<ReverseProxy>,
    pub sessions: Arc<dyn SessionResolver>,
    pub profiles: Arc<dyn ProfileStore>,
    pub auditor: Auditor,
    pub kv: Arc<dyn KvStore>,
    pub db: Option<PgPool>,
}

impl AppState {
    /// Wire production collaborators from configuration
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("failed to build HTTP client")?;

        let source = routing_source(&config, http)?;
        let cache = RoutingTableCache::new(
            source,
            Duration::from_secs(config.routing.cache_ttl_secs),
            Duration::from_millis(config.routing.fetch_timeout_ms),
        );
        let edge = EdgeRouter::new(cache, config.routing.unavailable_path.clone());

        let proxy = ReverseProxy::new(
            Duration::from_millis(config.proxy.timeout_ms),
            config.proxy.max_body_bytes,
        )
        .context("failed to build proxy client")?;

        let sessions = JwtSessionResolver::new(
            config.auth.jwt_secret.clone(),
            config.auth.session_cookie.clone(),
        );

        let db = match database::connect_lazy(&config.database) {
            Ok(pool) => Some(pool),
            Err(e) => {
                tracing::warn!("Staff directory database not configured ({}); using in-memory directory", e);
                None
            }
        };

        let profiles: Arc<dyn ProfileStore> = match &db {
            Some(pool) => Arc::new(PgProfileStore::new(pool.clone())),
            None => Arc::new(MemoryProfileStore::new()),
        };

        let auditor = match (config.audit.sink, &db) {
            (AuditSinkKind::None, _) => Auditor::disabled(),
            (AuditSinkKind::Database, Some(pool)) => Auditor::new(Arc::new(PgAuditSink::new(pool.clone()))),
            (AuditSinkKind::Database, None) => {
                tracing::warn!("Audit sink 'database' requested without DATABASE_URL; logging instead");
                Auditor::new(Arc::new(TracingAuditSink))
            }
            (AuditSinkKind::Log, _) => Auditor::new(Arc::new(TracingAuditSink)),
        };

        Ok(Self {
            config: Arc::new(config),
            edge: Arc::new(edge),
            proxy: Arc::new(proxy),
            sessions: Arc::new(sessions),
            profiles,
            auditor,
            kv: Arc::new(MemoryKvStore::new()),
            db,
        })
    }
}

pub fn routing_source(config: &AppConfig, http: reqwest::Client) -> anyhow::Result<Arc<dyn RoutingSource>> {
    if let Some(url) = &config.routing.store_url {
        return Ok(Arc::new(EdgeConfigSource::new(
            http,
            url.clone(),
            config.routing.store_key.clone(),
            config.routing.store_token.clone(),
        )));
    }

    if let Some(path) = &config.routing.static_table_file {
        let source = StaticRoutingSource::from_yaml_file(path)
            .with_context(|| format!("failed to load routing table from {}", path))?;
        return Ok(Arc::new(source));
    }

    Ok(Arc::new(StaticRoutingSource::new(config.routing.static_table.clone())))
}
