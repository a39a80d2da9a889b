//! # Request Handlers
//!
//! Axum request handlers for the relay: health, checkout session creation,
//! and the redirect bridge back into the app.

use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use relay_core::{
    CheckoutRequest, RedirectPage, RedirectRequest, RelayError, HTML_CONTENT_TYPE,
};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Create checkout response
#[derive(Debug, Serialize)]
pub struct CreateCheckoutResponse {
    /// Hosted checkout URL (open this in the browser)
    pub url: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}

/// JSON error for the checkout endpoint. Provider failures collapse into one
/// generic message; the cause only goes to the log.
fn checkout_error_to_response(err: RelayError) -> (StatusCode, Json<ErrorResponse>) {
    let code = err.status_code();
    let message = if err.is_client_error() {
        err.public_message()
    } else {
        "Unable to create session"
    };
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ErrorResponse::new(message, code)),
    )
}

/// Plain-text failure of the redirect bridge
#[derive(Debug)]
pub struct BridgeError(pub RelayError);

impl From<RelayError> for BridgeError {
    fn from(err: RelayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = if self.0.is_client_error() {
            self.0.public_message()
        } else {
            "Redirect error"
        };
        (status, body).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "ok": true,
        "ts": chrono::Utc::now().timestamp_millis(),
        "service": "checkout-relay",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Redirect bridge: turn Stripe's web redirect into an app deep link
#[instrument(skip(state, params))]
pub async fn redirect_bridge(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, BridgeError> {
    let request = RedirectRequest::from_query_pairs(params);

    let page = RedirectPage::for_request(&request, &state.config.allowed_destinations)
        .map_err(|e| {
            warn!("Rejected bridge redirect: {}", e);
            e
        })?;

    let html = page.render().map_err(|e| {
        error!("Failed to render bridge page: {}", e);
        e
    })?;

    info!(status = %request.status, "Bridging to {}", page.target());

    Ok(([(header::CONTENT_TYPE, HTML_CONTENT_TYPE)], html).into_response())
}

/// Create a Stripe checkout session whose redirects go through the bridge
#[instrument(skip(state, headers, body))]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<CreateCheckoutResponse>, (StatusCode, Json<ErrorResponse>)> {
    // An unreadable body carries no amount
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Unreadable checkout body: {}", rejection);
            CheckoutRequest::default()
        }
    };

    let order = request.to_order().map_err(checkout_error_to_response)?;

    let destination = request.destination(&state.config.default_return_url);
    state
        .config
        .allowed_destinations
        .check(destination)
        .map_err(|e| {
            warn!("Rejected checkout return URL: {}", e);
            checkout_error_to_response(e)
        })?;

    let urls = state.bridge_urls(&headers);
    let success_url = urls.success_url(destination);
    let cancel_url = urls.cancel_url(destination);

    info!(
        "Creating checkout: amount={} {}, product={}, success_url={}",
        order.amount, order.currency, order.product_name, success_url
    );

    let session = state
        .payments
        .create_checkout(&order, &success_url, &cancel_url)
        .await
        .map_err(|e| {
            error!("{} error: {}", state.payments.provider_name(), e);
            checkout_error_to_response(e)
        })?;

    info!("Created checkout session: {}", session.session_id);

    Ok(Json(CreateCheckoutResponse {
        url: session.checkout_url,
    }))
}
