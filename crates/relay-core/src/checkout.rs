//! # Checkout Requests
//!
//! What the mobile app posts to start a payment, and how it is validated.

use crate::error::{RelayError, RelayResult};
use crate::order::PaymentOrder;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Amounts are in minor units and must stay strictly below this
pub const MAX_AMOUNT: i64 = 1_000_000;

/// Currency used when the client does not name one
pub const DEFAULT_CURRENCY: &str = "eur";

/// Body of `POST /api/stripe/create-checkout-session`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Amount in minor units. Kept as raw JSON so a non-integer is a
    /// validation failure rather than a body rejection.
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub email: Option<String>,
    /// Enrollment block, e.g. `A1A2` or `B1B2`
    #[serde(default, deserialize_with = "string_or_none")]
    pub bloque: Option<String>,
    /// Deep link the bridge should finally land on
    #[serde(default, deserialize_with = "string_or_none")]
    pub return_url: Option<String>,
}

/// Any JSON value is accepted; only strings are kept.
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

impl CheckoutRequest {
    /// Return destination, falling back to `default` when none was sent.
    pub fn destination<'a>(&'a self, default: &'a str) -> &'a str {
        match self.return_url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => default,
        }
    }

    /// Validate the request and turn it into an order for the provider.
    pub fn to_order(&self) -> RelayResult<PaymentOrder> {
        let amount = validate_amount(self.amount.as_ref())?;
        let currency = self
            .currency
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CURRENCY);
        let bloque = self.bloque.clone().unwrap_or_default();
        let enrollment = Enrollment::from_bloque(&bloque);

        let mut order = PaymentOrder::new(amount, currency, enrollment.product_name())
            .with_metadata("bloque", bloque);
        if let Some(email) = self.email.as_deref().filter(|e| !e.is_empty()) {
            order = order.with_email(email);
        }
        Ok(order)
    }
}

/// Accepts integral JSON numbers in `(0, MAX_AMOUNT)`.
pub fn validate_amount(amount: Option<&Value>) -> RelayResult<i64> {
    let number = match amount {
        Some(Value::Number(n)) => n,
        _ => return Err(RelayError::InvalidAmount),
    };

    let amount = match number.as_i64() {
        Some(i) => i,
        // `1500.0` is still a whole number of cents
        None => match number.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < MAX_AMOUNT as f64 * 2.0 => f as i64,
            _ => return Err(RelayError::InvalidAmount),
        },
    };

    if amount > 0 && amount < MAX_AMOUNT {
        Ok(amount)
    } else {
        Err(RelayError::InvalidAmount)
    }
}

/// Course enrollment being paid for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enrollment {
    A1A2,
    B1B2,
}

impl Enrollment {
    /// `B1B2` in any case selects the upper block; everything else is A1/A2.
    pub fn from_bloque(bloque: &str) -> Self {
        if bloque.eq_ignore_ascii_case("B1B2") {
            Enrollment::B1B2
        } else {
            Enrollment::A1A2
        }
    }

    /// Product name shown on the Stripe checkout page
    pub fn product_name(&self) -> &'static str {
        match self {
            Enrollment::A1A2 => "Matrícula A1/A2",
            Enrollment::B1B2 => "Matrícula B1/B2",
        }
    }
}
