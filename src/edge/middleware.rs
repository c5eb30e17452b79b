use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::RouteDecision;
use crate::auth::extract_credential;
use crate::error::ApiError;
use crate::state::AppState;

/// Outermost layer: proxy requests that belong to another app, let the rest
/// through to the local router
pub async fn edge_router_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);
    let has_session = extract_credential(request.headers(), &state.config.auth.session_cookie).is_some();

    match state.edge.decide(&path, query.as_deref(), has_session).await {
        RouteDecision::PassThrough => next.run(request).await,
        RouteDecision::Proxy { prefix, url } => {
            match state.proxy.forward(request, url, &prefix).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(%path, %prefix, "proxy hop failed: {}", e);
                    ApiError::from(e).into_response()
                }
            }
        }
        RouteDecision::Unavailable { prefix, location } => {
            tracing::warn!(%path, %prefix, "no origin for app; redirecting to {}", location);
            Redirect::temporary(&location).into_response()
        }
    }
}
