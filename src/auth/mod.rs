pub mod session;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use session::{extract_credential, JwtSessionResolver, SessionResolver};

/// Access token claims, shaped like the hosted auth provider's tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, email: impl Into<String>, expiry_hours: u64) -> Result<Self, SessionError> {
        let now = Utc::now();
        let exp = i64::try_from(expiry_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or(SessionError::InvalidExpiry(expiry_hours))?;

        Ok(Self {
            sub: user_id,
            email: email.into(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        })
    }
}

/// Authenticated principal. Owned by the auth provider; the gateway only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            issued_at: timestamp(claims.iat),
            expires_at: timestamp(claims.exp),
        }
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("Token lifetime of {0} hours is out of range")]
    InvalidExpiry(u64),

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

pub fn issue_token(secret: &str, claims: &Claims) -> Result<String, SessionError> {
    if secret.is_empty() {
        return Err(SessionError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| SessionError::TokenGeneration(e.to_string()))
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, SessionError> {
    if secret.is_empty() {
        return Err(SessionError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    // Provider tokens carry an `aud` we don't pin
    validation.validate_aud = false;

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| SessionError::InvalidToken(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_decodes_to_same_principal() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "tech@example.com", 1).unwrap();
        let token = issue_token("secret", &claims).unwrap();

        let session = Session::from(decode_token("secret", &token).unwrap());
        assert_eq!(session.user_id, user_id);
        assert_eq!(session.email, "tech@example.com");
        assert!(session.expires_at > session.issued_at);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = Claims::new(Uuid::new_v4(), "a@example.com", 1).unwrap();
        let token = issue_token("one", &claims).unwrap();
        assert!(matches!(decode_token("two", &token), Err(SessionError::InvalidToken(_))));
    }

    #[test]
    fn empty_secret_never_signs() {
        let claims = Claims::new(Uuid::new_v4(), "a@example.com", 1).unwrap();
        assert!(matches!(issue_token("", &claims), Err(SessionError::InvalidSecret)));
    }

    #[test]
    fn huge_lifetime_is_an_error() {
        assert!(matches!(
            Claims::new(Uuid::new_v4(), "a@example.com", u64::MAX),
            Err(SessionError::InvalidExpiry(u64::MAX))
        ));
        assert!(matches!(
            Claims::new(Uuid::new_v4(), "a@example.com", i64::MAX as u64),
            Err(SessionError::InvalidExpiry(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut claims = Claims::new(Uuid::new_v4(), "a@example.com", 1).unwrap();
        claims.iat -= 7200;
        claims.exp -= 7200;
        let token = issue_token("secret", &claims).unwrap();
        assert!(decode_token("secret", &token).is_err());
    }
}
