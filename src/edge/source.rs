use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Ordered `(prefix, destination base URL)` rows as stored upstream
pub type AppUrls = Vec<(String, String)>;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Config store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config store returned {0}")]
    Status(StatusCode),

    #[error("Malformed routing table: {0}")]
    Malformed(String),

    #[error("Failed to read routing file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse routing file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Read-only key-value configuration store holding the routing table
#[async_trait]
pub trait RoutingSource: Send + Sync {
    /// `Ok(None)` when the key is absent
    async fn get_app_urls(&self) -> Result<Option<AppUrls>, SourceError>;

    fn describe(&self) -> String;
}

/// HTTP key-value store (`GET {base}/item/{key}`), answering with a JSON
/// object of prefix -> URL
pub struct EdgeConfigSource {
    client: reqwest::Client,
    base_url: String,
    key: String,
    token: Option<String>,
}

impl EdgeConfigSource {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        key: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            key: key.into(),
            token,
        }
    }

    fn item_url(&self) -> String {
        format!("{}/item/{}", self.base_url.trim_end_matches('/'), self.key)
    }
}

#[async_trait]
impl RoutingSource for EdgeConfigSource {
    async fn get_app_urls(&self) -> Result<Option<AppUrls>, SourceError> {
        let mut request = self.client.get(self.item_url());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            status if !status.is_success() => return Err(SourceError::Status(status)),
            _ => {}
        }

        let body: Value = response.json().await?;
        parse_app_urls(body)
    }

    fn describe(&self) -> String {
        format!("config store {} (key '{}')", self.base_url, self.key)
    }
}

/// Object order is the registration order
pub fn parse_app_urls(value: Value) -> Result<Option<AppUrls>, SourceError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(map) => map
            .into_iter()
            .map(|(prefix, url)| match url {
                Value::String(url) => Ok((prefix, url)),
                other => Err(SourceError::Malformed(format!(
                    "destination for '{}' is not a string: {}",
                    prefix, other
                ))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        other => Err(SourceError::Malformed(format!("expected an object, got {}", other))),
    }
}

/// Fixed table from configuration
pub struct StaticRoutingSource {
    pairs: AppUrls,
}

impl StaticRoutingSource {
    pub fn new(pairs: AppUrls) -> Self {
        Self { pairs }
    }

    /// YAML mapping of prefix -> url; mapping order is kept
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, SourceError> {
        let mapping: serde_yaml::Mapping = serde_yaml::from_str(raw)?;
        let pairs = mapping
            .into_iter()
            .map(|(prefix, url)| match (prefix, url) {
                (serde_yaml::Value::String(prefix), serde_yaml::Value::String(url)) => Ok((prefix, url)),
                (prefix, _) => Err(SourceError::Malformed(format!(
                    "entry {:?} must map a string prefix to a string url",
                    prefix
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { pairs })
    }
}

#[async_trait]
impl RoutingSource for StaticRoutingSource {
    async fn get_app_urls(&self) -> Result<Option<AppUrls>, SourceError> {
        Ok(Some(self.pairs.clone()))
    }

    fn describe(&self) -> String {
        format!("static table ({} entries)", self.pairs.len())
    }
}
