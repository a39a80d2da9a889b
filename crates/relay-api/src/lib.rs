//! # relay-api
//!
//! HTTP API layer for checkout-relay.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Checkout session creation that keeps the Stripe secret on the server
//! - The redirect bridge from Stripe's web redirects back into the app
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/return` | Redirect bridge (path configurable) |
//! | POST | `/api/stripe/create-checkout-session` | Create checkout session |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
