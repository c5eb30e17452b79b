use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::time::Duration;

use crate::auth::Session;
use crate::error::ApiError;
use crate::state::AppState;

/// Fixed-window limiter over the injected `KvStore`. Keys on the user of a
/// valid session, else the client address. Unverified credentials never pick
/// the bucket.
pub async fn rate_limit_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let limits = &state.config.rate_limit;
    if !limits.enabled {
        return next.run(request).await;
    }

    let session = state.sessions.get_session(request.headers()).await.ok().flatten();
    let key = rate_limit_key(&request, session.as_ref(), limits.trust_forwarded_for);
    let window = Duration::from_secs(limits.window_secs);

    match state.kv.increment(&key, window).await {
        Ok(counter) if counter.count > limits.requests => {
            tracing::warn!("Rate limit exceeded for {} ({} requests)", key, counter.count);
            ApiError::too_many_requests("Rate limit exceeded", counter.resets_in.as_secs().max(1))
                .into_response()
        }
        Ok(_) => next.run(request).await,
        Err(e) => {
            // Fail open
            tracing::error!("Rate limit store error: {}", e);
            next.run(request).await
        }
    }
}

fn rate_limit_key(request: &Request, session: Option<&Session>, trust_forwarded_for: bool) -> String {
    if let Some(session) = session {
        return format!("ratelimit:user:{}", session.user_id);
    }

    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .filter(|_| trust_forwarded_for)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    format!(
        "ratelimit:ip:{}",
        forwarded.or(peer).unwrap_or_else(|| "unknown".to_string())
    )
}
