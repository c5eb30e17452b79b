use async_trait::async_trait;
use axum::http::{header, HeaderMap};

use super::{decode_token, Session, SessionError};

/// Authentication provider seam: turns request credentials into a session
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// `Ok(None)` when the request carries no credential at all
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<Session>, SessionError>;
}

/// Validates HS256 access tokens locally with the provider's shared secret
pub struct JwtSessionResolver {
    secret: String,
    cookie_name: String,
}

impl JwtSessionResolver {
    pub fn new(secret: impl Into<String>, cookie_name: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            cookie_name: cookie_name.into(),
        }
    }
}

#[async_trait]
impl SessionResolver for JwtSessionResolver {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<Session>, SessionError> {
        let Some(token) = extract_credential(headers, &self.cookie_name) else {
            return Ok(None);
        };

        let claims = decode_token(&self.secret, &token)?;
        Ok(Some(Session::from(claims)))
    }
}

/// Bearer token first, then the session cookie
pub fn extract_credential(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_value(headers, cookie_name))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
