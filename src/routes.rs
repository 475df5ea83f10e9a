//! HTTP router assembly.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, patch, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers, middleware, state::AppState};

/// Build the application router.
///
/// # Routes
///
/// - `GET /health` (public)
/// - `GET /cars`, `POST /cars`
/// - `PATCH /cars/{car_id}`, `DELETE /cars/{car_id}`
/// - `POST /cars/{car_id}/attachment`
pub fn build_router(state: AppState) -> Router {
    let authenticated_routes = Router::new()
        .route(
            "/cars",
            get(handlers::cars::list_cars).post(handlers::cars::create_car),
        )
        .route(
            "/cars/{car_id}",
            patch(handlers::cars::update_car).delete(handlers::cars::delete_car),
        )
        .route(
            "/cars/{car_id}/attachment",
            post(handlers::cars::generate_upload_url),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(authenticated_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
