use axum::{extract::OriginalUri, http::StatusCode, response::Json};
use serde_json::{json, Value};

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "ok": true,
        "data": {
            "name": "Staff Portal Gateway",
            "version": version,
            "description": "Routes staff to internal apps and gates portal APIs by role",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "routes": "/api/routes (public - routing table)",
                "refresh": "/api/routes/refresh (superadmin - reload routing table)",
                "whoami": "/api/auth/whoami (staff)",
                "access": "/api/access/check (staff)",
                "unavailable": "/unavailable (public)",
            }
        }
    }))
}

pub async fn not_found(OriginalUri(uri): OriginalUri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "ok": false,
            "errorKind": "NotFound",
            "message": format!("Route not found: {}", uri.path()),
        })),
    )
}
