//! # Routes
//!
//! Axum router configuration for the relay.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET  /health, / - Liveness and server time
/// - GET  {return_path} - Redirect bridge (default `/return`)
/// - POST /api/stripe/create-checkout-session - Create a hosted checkout
pub fn create_router(state: AppState) -> Router {
    // The app calls from arbitrary origins (Expo dev client, web preview)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new().route(
        "/stripe/create-checkout-session",
        post(handlers::create_checkout_session),
    );

    let return_path = state.config.return_path.clone();

    Router::new()
        // Health check at root
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        // Stripe success/cancel land here
        .route(&return_path, get(handlers::redirect_bridge))
        .nest("/api", api_routes)
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        // State
        .with_state(state)
}
