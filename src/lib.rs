pub mod audit;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod edge;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod rbac;
pub mod state;
pub mod store;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::edge::edge_router_middleware;
use crate::middleware::{rate_limit_middleware, require_access, AccessRequirement, Gate};
use crate::rbac::Role;
use crate::state::AppState;

/// Full gateway router. The edge layer wraps every route and the fallback, so
/// paths under a known app prefix are proxied instead of 404ing.
pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(handlers::public::root))
        .route("/health", get(handlers::public::health))
        .route("/api/routes", get(handlers::public::routes_list))
        .route("/unavailable", get(handlers::public::unavailable))
        // Protected API
        .merge(staff_routes(&state))
        .merge(admin_routes(&state))
        .fallback(handlers::public::not_found)
        // Global middleware
        .layer(from_fn_with_state(state.clone(), edge_router_middleware))
        .layer(from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn staff_routes(state: &AppState) -> Router<AppState> {
    use handlers::protected;

    let gate = Gate::new(state.clone(), AccessRequirement::authenticated());

    Router::new()
        .route("/api/auth/whoami", get(protected::whoami))
        .route("/api/access/check", get(protected::access_check))
        .route_layer(from_fn_with_state(gate, require_access))
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    use handlers::protected;

    let gate = Gate::new(
        state.clone(),
        AccessRequirement::role(Role::Superadmin).with_route_check().sensitive(),
    );

    Router::new()
        .route("/api/routes/refresh", post(protected::routes_refresh))
        .route_layer(from_fn_with_state(gate, require_access))
}
