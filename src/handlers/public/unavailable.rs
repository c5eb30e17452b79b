use axum::{
    extract::Query,
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct UnavailableParams {
    pub app: Option<String>,
}

/// GET /unavailable - landing page for apps whose origin can't be resolved
pub async fn unavailable(headers: HeaderMap, Query(params): Query<UnavailableParams>) -> Response {
    // Only echo names that look like a routing prefix
    let app = params
        .app
        .filter(|a| !a.is_empty() && a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));

    let message = match &app {
        Some(app) => format!("The {} section is temporarily unavailable", app),
        None => "This section is temporarily unavailable".to_string(),
    };

    let wants_json = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("application/json"))
        .unwrap_or(false);

    // Status notice, so no errorKind
    if wants_json {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "ok": false, "message": message })),
        )
            .into_response();
    }

    let page = format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"UTF-8\"><title>Staff Portal</title></head>\n\
         <body><main><h1>Service temporarily unavailable</h1><p>{}. Please try again in a few minutes.</p>\
         <p><a href=\"/\">Return to the staff portal</a></p></main></body>\n</html>\n",
        message
    );

    (StatusCode::SERVICE_UNAVAILABLE, Html(page)).into_response()
}
