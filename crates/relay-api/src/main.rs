//! # Checkout Relay
//!
//! Payment relay between the mobile app and Stripe.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export STRIPE_SECRET_KEY=sk_test_...
//! export ALLOWED_RETURN_TARGETS=myapp,exp
//! export DEFAULT_RETURN_URL=myapp://checkout
//!
//! # Run the server
//! checkout-relay
//! ```

use relay_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();
    let return_path = state.config.return_path.clone();

    info!("Environment: {}", state.config.environment);
    info!("Payment provider: {}", state.payments.provider_name());
    info!(
        "Allowed return targets: {}",
        state
            .config
            .allowed_destinations
            .rules()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );

    // Create router
    let app = routes::create_router(state);

    info!("Checkout relay v{} starting on http://{}", env!("CARGO_PKG_VERSION"), addr);

    if !is_prod {
        info!("Health: GET http://{}/health", addr);
        info!("Checkout: POST http://{}/api/stripe/create-checkout-session", addr);
        info!("Bridge: GET http://{}{}?status=...&to=...", addr, return_path);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
