//! # relay-core
//!
//! Core types and traits for the checkout relay.
//!
//! This crate provides:
//! - `RedirectRequest`, `DestinationAllowList` and `RedirectPage` for the
//!   redirect bridge
//! - `CheckoutRequest` and `Enrollment` for validating payment requests
//! - `PaymentOrder` and `CheckoutSession` for the checkout flow
//! - `PaymentStrategy` trait for payment providers
//! - `RelayError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use relay_core::{DestinationAllowList, RedirectPage, RedirectRequest};
//!
//! let allow_list = DestinationAllowList::parse("myapp,exp")?;
//! let request = RedirectRequest::new(Some("success"), "myapp://checkout");
//!
//! let page = RedirectPage::for_request(&request, &allow_list)?;
//! assert_eq!(page.target(), "myapp://checkout?status=success");
//! let html = page.render()?;
//! ```

pub mod checkout;
pub mod error;
pub mod order;
pub mod redirect;
pub mod strategy;

// Re-exports for convenience
pub use checkout::{validate_amount, CheckoutRequest, Enrollment, DEFAULT_CURRENCY, MAX_AMOUNT};
pub use error::{RelayError, RelayResult};
pub use order::{CheckoutSession, PaymentOrder};
pub use redirect::{
    AllowRule, DestinationAllowList, RedirectPage, RedirectRequest, HTML_CONTENT_TYPE,
    UNKNOWN_STATUS,
};
pub use strategy::{BoxedPaymentStrategy, BridgeUrls, PaymentStrategy};
