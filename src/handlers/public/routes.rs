use axum::extract::State;
use serde::Serialize;

use crate::edge::{RouteTarget, RoutingTable, TableOrigin};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RouteListing {
    pub source: TableOrigin,
    pub routes: Vec<RouteItem>,
}

#[derive(Debug, Serialize)]
pub struct RouteItem {
    pub prefix: String,
    /// `None` while the app's origin is unknown
    pub destination: Option<String>,
}

impl From<&RoutingTable> for RouteListing {
    fn from(table: &RoutingTable) -> Self {
        Self {
            source: table.origin(),
            routes: table
                .entries()
                .iter()
                .map(|entry| RouteItem {
                    prefix: format!("/{}", entry.prefix),
                    destination: match &entry.target {
                        RouteTarget::Origin(url) => Some(url.to_string()),
                        RouteTarget::Unavailable => None,
                    },
                })
                .collect(),
        }
    }
}

/// GET /api/routes
pub async fn routes_list(State(state): State<AppState>) -> ApiResult<RouteListing> {
    let table = state.edge.table().await;
    Ok(ApiResponse::success(RouteListing::from(table.as_ref())))
}
