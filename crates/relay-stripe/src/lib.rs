//! # relay-stripe
//!
//! Stripe payment strategy for checkout-relay.
//!
//! **StripeCheckoutStrategy** opens hosted Checkout Sessions for a single
//! card payment. The success and cancel URLs it is given point at the relay's
//! redirect bridge, which forwards the customer back into the mobile app.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use relay_stripe::StripeCheckoutStrategy;
//! use relay_core::{PaymentOrder, PaymentStrategy};
//!
//! let strategy = StripeCheckoutStrategy::from_env()?;
//!
//! let order = PaymentOrder::new(4900, "eur", "Matrícula A1/A2");
//! let session = strategy.create_checkout(
//!     &order,
//!     "https://relay.example.com/return?status=success&to=myapp%3A%2F%2Fcheckout",
//!     "https://relay.example.com/return?status=cancel&to=myapp%3A%2F%2Fcheckout",
//! ).await?;
//!
//! // Hand session.checkout_url to the app
//! ```

pub mod checkout;
pub mod config;

// Re-exports
pub use checkout::StripeCheckoutStrategy;
pub use config::StripeConfig;
