// HTTP API Error Types
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

/// Failure categories surfaced to clients as `errorKind`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    Unauthenticated,
    Forbidden,
    UpstreamProxyFailure,
    BadRequest,
    TooManyRequests,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthenticated => "Unauthenticated",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::UpstreamProxyFailure => "UpstreamProxyFailure",
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::TooManyRequests => "TooManyRequests",
            ErrorKind::Internal => "Internal",
        }
    }
}

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized, or 302 to the login page for page routes
    Unauthenticated {
        message: String,
        login_redirect: Option<String>,
    },

    // 403 Forbidden
    Forbidden(String),

    // 429 Too Many Requests
    TooManyRequests { message: String, retry_after_secs: u64 },

    // 500 Internal Server Error
    Internal(String),

    // 502 Bad Gateway (destination app unreachable)
    UpstreamProxyFailure(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::BadRequest(_) => ErrorKind::BadRequest,
            ApiError::Unauthenticated { .. } => ErrorKind::Unauthenticated,
            ApiError::Forbidden(_) => ErrorKind::Forbidden,
            ApiError::TooManyRequests { .. } => ErrorKind::TooManyRequests,
            ApiError::Internal(_) => ErrorKind::Internal,
            ApiError::UpstreamProxyFailure(_) => ErrorKind::UpstreamProxyFailure,
        }
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated {
                login_redirect: Some(_),
                ..
            } => StatusCode::FOUND,
            ApiError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::UpstreamProxyFailure(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthenticated { message, .. } => message,
            ApiError::Forbidden(msg) => msg,
            ApiError::TooManyRequests { message, .. } => message,
            ApiError::Internal(msg) => msg,
            ApiError::UpstreamProxyFailure(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "ok": false,
            "errorKind": self.kind().as_str(),
            "message": self.message(),
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::Unauthenticated {
            message: message.into(),
            login_redirect: None,
        }
    }

    /// Page routes send the browser to the login page instead of a bare 401
    pub fn login_required(message: impl Into<String>, login_url: impl Into<String>) -> Self {
        ApiError::Unauthenticated {
            message: message.into(),
            login_redirect: Some(login_url.into()),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn too_many_requests(message: impl Into<String>, retry_after_secs: u64) -> Self {
        ApiError::TooManyRequests {
            message: message.into(),
            retry_after_secs,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    pub fn upstream_unavailable() -> Self {
        ApiError::UpstreamProxyFailure("This section is temporarily unavailable".to_string())
    }
}

impl From<crate::edge::proxy::ProxyError> for ApiError {
    fn from(err: crate::edge::proxy::ProxyError) -> Self {
        match err {
            crate::edge::proxy::ProxyError::BodyTooLarge(limit) => {
                ApiError::bad_request(format!("Request body exceeds {} bytes", limit))
            }
            _ => ApiError::upstream_unavailable(),
        }
    }
}

impl From<crate::database::ProfileError> for ApiError {
    fn from(err: crate::database::ProfileError) -> Self {
        // Don't expose directory errors to clients
        tracing::error!("Staff directory error: {}", err);
        ApiError::forbidden("Unable to verify staff profile")
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            ApiError::Unauthenticated {
                login_redirect: Some(location),
                ..
            } => (status, [(header::LOCATION, location.clone())], Json(self.to_json())).into_response(),
            ApiError::TooManyRequests { retry_after_secs, .. } => (
                status,
                [(header::RETRY_AFTER, retry_after_secs.to_string())],
                Json(self.to_json()),
            )
                .into_response(),
            _ => (status, Json(self.to_json())).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_shape() {
        let body = ApiError::forbidden("Requires manager role (current: staff)").to_json();
        assert_eq!(body["ok"], false);
        assert_eq!(body["errorKind"], "Forbidden");
        assert_eq!(body["message"], "Requires manager role (current: staff)");
    }

    #[test]
    fn unauthenticated_status_depends_on_redirect() {
        assert_eq!(ApiError::unauthenticated("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::login_required("x", "/auth/login").status_code(),
            StatusCode::FOUND
        );
    }

    #[test]
    fn login_redirect_sets_location() {
        let response = ApiError::login_required("x", "/auth/login?redirect=%2Fdashboard").into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login?redirect=%2Fdashboard"
        );
    }
}
