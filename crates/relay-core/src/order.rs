//! # Order Types
//!
//! The single-item order handed to a payment provider, and the hosted
//! session it comes back with.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// A one-off card payment for a single product
#[derive(Debug, Clone)]
pub struct PaymentOrder {
    /// Internal reference, sent to the provider as metadata
    pub reference: String,

    /// Amount in smallest currency unit
    pub amount: i64,

    /// Currency code as the client sent it
    pub currency: String,

    /// Name shown on the hosted checkout page
    pub product_name: String,

    /// Customer email (optional, for prefill)
    pub customer_email: Option<String>,

    /// Custom metadata
    pub metadata: HashMap<String, String>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl PaymentOrder {
    pub fn new(amount: i64, currency: impl Into<String>, product_name: impl Into<String>) -> Self {
        Self {
            reference: Uuid::new_v4().to_string(),
            amount,
            currency: currency.into(),
            product_name: product_name.into(),
            customer_email: None,
            metadata: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Set customer email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.customer_email = Some(email.into());
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A checkout session created by a payment provider
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    /// Provider's session ID
    pub session_id: String,

    /// Our order reference
    pub order_reference: String,

    /// Provider name (e.g., "stripe")
    pub provider: String,

    /// URL to send the customer to for payment
    pub checkout_url: String,

    /// When the session expires
    pub expires_at: Option<DateTime<Utc>>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl CheckoutSession {
    pub fn new(
        session_id: impl Into<String>,
        order_reference: impl Into<String>,
        provider: impl Into<String>,
        checkout_url: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            order_reference: order_reference.into(),
            provider: provider.into(),
            checkout_url: checkout_url.into(),
            expires_at: None,
            created_at: Utc::now(),
        }
    }
}
