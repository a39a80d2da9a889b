//! # Payment Strategy Trait
//!
//! Seam between the HTTP layer and the payment processor.
//! The relay ships with a Stripe implementation; tests plug in fakes.

use crate::error::RelayResult;
use crate::order::{CheckoutSession, PaymentOrder};
use async_trait::async_trait;
use std::sync::Arc;

/// A payment processor able to open hosted checkout sessions.
#[async_trait]
pub trait PaymentStrategy: Send + Sync {
    /// Create a hosted checkout session for `order`.
    ///
    /// # Arguments
    /// * `order` - The order to check out
    /// * `success_url` - Web URL the processor redirects to after payment
    /// * `cancel_url` - Web URL the processor redirects to on cancel
    async fn create_checkout(
        &self,
        order: &PaymentOrder,
        success_url: &str,
        cancel_url: &str,
    ) -> RelayResult<CheckoutSession>;

    /// Get the provider name (for logging).
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a boxed payment strategy (dynamic dispatch)
pub type BoxedPaymentStrategy = Arc<dyn PaymentStrategy>;

/// Builds the web URLs that route the processor's redirect through the bridge
#[derive(Debug, Clone)]
pub struct BridgeUrls {
    /// Public base URL of this relay (e.g., "https://relay.example.com")
    pub base_url: String,
    /// Path the bridge is mounted at (e.g., "/return")
    pub return_path: String,
}

impl BridgeUrls {
    pub fn new(base_url: impl Into<String>, return_path: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            return_path: return_path.into(),
        }
    }

    /// Bridge URL that lands on `destination` with the given status
    pub fn for_status(&self, status: &str, destination: &str) -> String {
        format!(
            "{}{}?status={}&to={}",
            self.base_url,
            self.return_path,
            urlencoding::encode(status),
            urlencoding::encode(destination)
        )
    }

    pub fn success_url(&self, destination: &str) -> String {
        self.for_status("success", destination)
    }

    pub fn cancel_url(&self, destination: &str) -> String {
        self.for_status("cancel", destination)
    }
}
