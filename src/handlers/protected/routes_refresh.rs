use axum::{extract::State, Extension};

use crate::auth::Session;
use crate::handlers::public::routes::RouteListing;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /api/routes/refresh - drop the cached table and reload it
pub async fn routes_refresh(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<RouteListing> {
    let table = state.edge.refresh().await;

    tracing::info!(
        "Routing table refreshed by {} ({} routes, origin {:?})",
        session.email,
        table.len(),
        table.origin()
    );

    Ok(ApiResponse::success(RouteListing::from(table.as_ref())))
}
