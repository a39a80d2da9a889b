//! # Stripe Checkout Sessions
//!
//! Implementation of the Stripe Checkout Sessions API.
//! The relay only ever opens one-item card payments in `payment` mode.

use crate::config::StripeConfig;
use async_trait::async_trait;
use chrono::DateTime;
use relay_core::{CheckoutSession, PaymentOrder, PaymentStrategy, RelayError, RelayResult};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

const PROVIDER: &str = "stripe";

/// Stripe Checkout Session strategy
///
/// Uses Stripe's hosted checkout page, so card data never touches the relay
/// or the app.
pub struct StripeCheckoutStrategy {
    config: StripeConfig,
    client: Client,
}

impl StripeCheckoutStrategy {
    /// Create a new Stripe checkout strategy
    pub fn new(config: StripeConfig) -> RelayResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| RelayError::Configuration(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> RelayResult<Self> {
        let config = StripeConfig::from_env()?;
        Self::new(config)
    }

    /// Form fields for `POST /v1/checkout/sessions`
    fn build_form(order: &PaymentOrder, success_url: &str, cancel_url: &str) -> Vec<(String, String)> {
        let mut form_params: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("success_url".to_string(), success_url.to_string()),
            ("cancel_url".to_string(), cancel_url.to_string()),
            (
                "line_items[0][price_data][currency]".to_string(),
                order.currency.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                order.amount.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                order.product_name.clone(),
            ),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
        ];

        if let Some(ref email) = order.customer_email {
            form_params.push(("customer_email".to_string(), email.clone()));
        }

        form_params.push(("metadata[order_ref]".to_string(), order.reference.clone()));

        let mut metadata: Vec<_> = order.metadata.iter().collect();
        metadata.sort();
        for (key, value) in metadata {
            form_params.push((format!("metadata[{}]", key), value.clone()));
        }

        form_params
    }
}

#[async_trait]
impl PaymentStrategy for StripeCheckoutStrategy {
    #[instrument(skip(self, order), fields(order_ref = %order.reference))]
    async fn create_checkout(
        &self,
        order: &PaymentOrder,
        success_url: &str,
        cancel_url: &str,
    ) -> RelayResult<CheckoutSession> {
        let form_params = Self::build_form(order, success_url, cancel_url);

        debug!(
            "Creating Stripe checkout session: amount={} {}",
            order.amount, order.currency
        );

        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .form(&form_params)
            .send()
            .await
            .map_err(|e| RelayError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RelayError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);

            if let Ok(error_response) = serde_json::from_str::<StripeErrorResponse>(&body) {
                return Err(RelayError::ProviderError {
                    provider: PROVIDER.to_string(),
                    message: error_response.error.message,
                });
            }

            return Err(RelayError::ProviderError {
                provider: PROVIDER.to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let session_response: StripeCheckoutSessionResponse = serde_json::from_str(&body)
            .map_err(|e| {
                RelayError::Serialization(format!("Failed to parse Stripe response: {}", e))
            })?;

        let checkout_url = session_response.url.ok_or_else(|| RelayError::ProviderError {
            provider: PROVIDER.to_string(),
            message: format!("session {} has no hosted URL", session_response.id),
        })?;

        info!(
            "Created Stripe checkout session: id={}, url={}",
            session_response.id, checkout_url
        );

        let mut session =
            CheckoutSession::new(session_response.id, &order.reference, PROVIDER, checkout_url);
        session.expires_at = session_response
            .expires_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0));

        Ok(session)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeCheckoutSessionResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn order() -> PaymentOrder {
        PaymentOrder::new(4900, "eur", "Matrícula B1/B2")
            .with_email("ana@example.com")
            .with_metadata("bloque", "B1B2")
    }

    fn strategy(server: &MockServer) -> StripeCheckoutStrategy {
        let config = StripeConfig::new("sk_test_abc123").with_api_base_url(server.uri());
        StripeCheckoutStrategy::new(config).unwrap()
    }

    #[test]
    fn test_build_form() {
        let order = order();
        let form = StripeCheckoutStrategy::build_form(&order, "https://r/s", "https://r/c");
        let get = |k: &str| {
            form.iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("mode"), Some("payment"));
        assert_eq!(get("payment_method_types[0]"), Some("card"));
        assert_eq!(get("line_items[0][price_data][unit_amount]"), Some("4900"));
        assert_eq!(get("line_items[0][price_data][currency]"), Some("eur"));
        assert_eq!(get("line_items[0][quantity]"), Some("1"));
        assert_eq!(get("customer_email"), Some("ana@example.com"));
        assert_eq!(get("metadata[bloque]"), Some("B1B2"));
        assert_eq!(get("metadata[order_ref]"), Some(order.reference.as_str()));
        assert_eq!(get("success_url"), Some("https://r/s"));
    }

    #[test]
    fn test_build_form_without_email() {
        let order = PaymentOrder::new(100, "eur", "Matrícula A1/A2");
        let form = StripeCheckoutStrategy::build_form(&order, "s", "c");
        assert!(form.iter().all(|(k, _)| k != "customer_email"));
    }

    #[tokio::test]
    async fn test_create_checkout_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .and(header("Authorization", "Bearer sk_test_abc123"))
            .and(header("Stripe-Version", "2024-06-20"))
            .and(body_string_contains("mode=payment"))
            .and(body_string_contains("unit_amount%5D=4900"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cs_test_123",
                "url": "https://checkout.stripe.com/c/pay/cs_test_123",
                "expires_at": 1_900_000_000
            })))
            .expect(1)
            .mount(&server)
            .await;

        let order = order();
        let session = strategy(&server)
            .create_checkout(&order, "https://relay/return?status=success", "https://relay/return?status=cancel")
            .await
            .unwrap();

        assert_eq!(session.session_id, "cs_test_123");
        assert_eq!(session.checkout_url, "https://checkout.stripe.com/c/pay/cs_test_123");
        assert_eq!(session.provider, "stripe");
        assert_eq!(session.order_reference, order.reference);
        assert_eq!(session.expires_at.map(|t| t.timestamp()), Some(1_900_000_000));
    }

    #[tokio::test]
    async fn test_create_checkout_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "Invalid currency: xyz", "type": "invalid_request_error" }
            })))
            .mount(&server)
            .await;

        let err = strategy(&server)
            .create_checkout(&order(), "s", "c")
            .await
            .unwrap_err();

        match err {
            RelayError::ProviderError { provider, message } => {
                assert_eq!(provider, "stripe");
                assert_eq!(message, "Invalid currency: xyz");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_checkout_unparseable_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = strategy(&server)
            .create_checkout(&order(), "s", "c")
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_create_checkout_unreachable() {
        let config = StripeConfig::new("sk_test_abc123").with_api_base_url("http://127.0.0.1:1");
        let err = StripeCheckoutStrategy::new(config)
            .unwrap()
            .create_checkout(&order(), "s", "c")
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::NetworkError(_)));
    }
}
