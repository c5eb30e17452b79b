use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub routing: RoutingConfig,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
    pub proxy: ProxyConfig,
    pub rate_limit: RateLimitConfig,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Base URL of the key-value config store; `None` means use `static_table`
    pub store_url: Option<String>,
    pub store_token: Option<String>,
    pub store_key: String,
    pub cache_ttl_secs: u64,
    pub fetch_timeout_ms: u64,
    /// Ordered `prefix=url` pairs used when no store is configured
    pub static_table: Vec<(String, String)>,
    /// YAML file with an ordered prefix -> url mapping, overrides `static_table`
    pub static_table_file: Option<String>,
    pub unavailable_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_cookie: String,
    pub login_url: String,
    pub lookup_timeout_ms: u64,
    pub token_expiry_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub timeout_ms: u64,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub requests: u64,
    pub window_secs: u64,
    /// Take the client address from `x-forwarded-for`; only safe behind a proxy that sets it
    pub trust_forwarded_for: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditSinkKind {
    Log,
    Database,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    pub sink: AuditSinkKind,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("PORTAL_HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("PORTAL_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Routing overrides
        if let Ok(v) = env::var("ROUTING_STORE_URL") {
            self.routing.store_url = non_empty(v);
        }
        if let Ok(v) = env::var("ROUTING_STORE_TOKEN") {
            self.routing.store_token = non_empty(v);
        }
        if let Ok(v) = env::var("ROUTING_STORE_KEY") {
            self.routing.store_key = v;
        }
        if let Ok(v) = env::var("ROUTING_CACHE_TTL_SECS") {
            self.routing.cache_ttl_secs = v.parse().unwrap_or(self.routing.cache_ttl_secs);
        }
        if let Ok(v) = env::var("ROUTING_FETCH_TIMEOUT_MS") {
            self.routing.fetch_timeout_ms = v.parse().unwrap_or(self.routing.fetch_timeout_ms);
        }
        if let Ok(v) = env::var("ROUTING_STATIC_TABLE") {
            self.routing.static_table = parse_pairs(&v);
        }
        if let Ok(v) = env::var("ROUTING_STATIC_TABLE_FILE") {
            self.routing.static_table_file = non_empty(v);
        }
        if let Ok(v) = env::var("ROUTING_UNAVAILABLE_PATH") {
            self.routing.unavailable_path = v;
        }

        // Auth overrides
        if let Ok(v) = env::var("AUTH_JWT_SECRET").or_else(|_| env::var("JWT_SECRET")) {
            self.auth.jwt_secret = v;
        }
        if let Ok(v) = env::var("AUTH_SESSION_COOKIE") {
            self.auth.session_cookie = v;
        }
        if let Ok(v) = env::var("AUTH_LOGIN_URL") {
            self.auth.login_url = v;
        }
        if let Ok(v) = env::var("AUTH_LOOKUP_TIMEOUT_MS") {
            self.auth.lookup_timeout_ms = v.parse().unwrap_or(self.auth.lookup_timeout_ms);
        }
        if let Ok(v) = env::var("AUTH_TOKEN_EXPIRY_HOURS") {
            self.auth.token_expiry_hours = v.parse().unwrap_or(self.auth.token_expiry_hours);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = non_empty(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }

        // Proxy overrides
        if let Ok(v) = env::var("PROXY_TIMEOUT_MS") {
            self.proxy.timeout_ms = v.parse().unwrap_or(self.proxy.timeout_ms);
        }
        if let Ok(v) = env::var("PROXY_MAX_BODY_BYTES") {
            self.proxy.max_body_bytes = v.parse().unwrap_or(self.proxy.max_body_bytes);
        }

        // Rate limit overrides
        if let Ok(v) = env::var("RATE_LIMIT_ENABLED") {
            self.rate_limit.enabled = v.parse().unwrap_or(self.rate_limit.enabled);
        }
        if let Ok(v) = env::var("RATE_LIMIT_REQUESTS") {
            self.rate_limit.requests = v.parse().unwrap_or(self.rate_limit.requests);
        }
        if let Ok(v) = env::var("RATE_LIMIT_WINDOW_SECS") {
            self.rate_limit.window_secs = v.parse().unwrap_or(self.rate_limit.window_secs);
        }
        if let Ok(v) = env::var("RATE_LIMIT_TRUST_FORWARDED_FOR") {
            self.rate_limit.trust_forwarded_for = v.parse().unwrap_or(self.rate_limit.trust_forwarded_for);
        }

        // Audit overrides
        if let Ok(v) = env::var("AUDIT_SINK") {
            self.audit.sink = match v.as_str() {
                "database" | "db" => AuditSinkKind::Database,
                "none" | "off" => AuditSinkKind::None,
                _ => AuditSinkKind::Log,
            };
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            routing: RoutingConfig {
                store_url: None,
                store_token: None,
                store_key: "appUrls".to_string(),
                cache_ttl_secs: 5,
                fetch_timeout_ms: 2000,
                static_table: Vec::new(),
                static_table_file: None,
                unavailable_path: "/unavailable".to_string(),
            },
            auth: AuthConfig {
                jwt_secret: "development-secret-change-me".to_string(),
                session_cookie: "sb-access-token".to_string(),
                login_url: "/auth/login".to_string(),
                lookup_timeout_ms: 3000,
                token_expiry_hours: 24 * 7, // 1 week
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
            },
            proxy: ProxyConfig {
                timeout_ms: 30_000,
                max_body_bytes: 10 * 1024 * 1024, // 10MB
            },
            rate_limit: RateLimitConfig {
                enabled: false,
                requests: 1000,
                window_secs: 60,
                trust_forwarded_for: false,
            },
            audit: AuditConfig {
                sink: AuditSinkKind::Log,
            },
        }
    }

    pub fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.server.host = "0.0.0.0".to_string();
        config.routing.cache_ttl_secs = 60;
        config.auth.jwt_secret = String::new();
        config.auth.token_expiry_hours = 24;
        config.database.max_connections = 10;
        config.proxy.max_body_bytes = 5 * 1024 * 1024; // 5MB
        config.rate_limit = RateLimitConfig {
            enabled: true,
            requests: 300,
            window_secs: 60,
            trust_forwarded_for: false,
        };
        config.audit.sink = AuditSinkKind::Database;
        config
    }

    pub fn production() -> Self {
        let mut config = Self::staging();
        config.environment = Environment::Production;
        config.routing.cache_ttl_secs = 300;
        config.auth.token_expiry_hours = 8;
        config.database.max_connections = 20;
        config.proxy.timeout_ms = 15_000;
        config.rate_limit.requests = 120;
        config
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn non_empty(v: String) -> Option<String> {
    let trimmed = v.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse `a=https://x,b=https://y` keeping declaration order
fn parse_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|pair| {
            let (prefix, url) = pair.split_once('=')?;
            let prefix = prefix.trim().trim_matches('/');
            let url = url.trim();
            if prefix.is_empty() || url.is_empty() {
                return None;
            }
            Some((prefix.to_string(), url.to_string()))
        })
        .collect()
}
