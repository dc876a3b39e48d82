use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::verification::LocationVerifier;

use super::handlers::{
    country_supported, geolocate, health_check, verify_browser, verify_hybrid, verify_ip, AppState,
};

pub fn create_router(verifier: Arc<LocationVerifier>) -> Router {
    let state = Arc::new(AppState { verifier });

    let api_routes = Router::new()
        .route("/geolocate", get(geolocate))
        .route("/verify/ip", post(verify_ip))
        .route("/verify/browser", post(verify_browser))
        .route("/verify/hybrid", post(verify_hybrid))
        .route("/countries/{code}/supported", get(country_supported))
        .with_state(state);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}
