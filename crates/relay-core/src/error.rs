//! # Relay Error Types
//!
//! Typed error handling for the checkout relay.
//! Bridge and checkout operations return `Result<T, RelayError>`.

use thiserror::Error;

/// Core error type for all relay operations
#[derive(Debug, Error)]
pub enum RelayError {
    /// The bridge was called without a `to` destination
    #[error("Missing to")]
    MissingDestination,

    /// Destination does not match any allow-list entry
    #[error("Destination not allowed: {destination}")]
    DestinationNotAllowed { destination: String },

    /// Checkout amount is not an integer in `(0, 1_000_000)`
    #[error("Invalid amount")]
    InvalidAmount,

    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Payment provider API error
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// Network/HTTP error communicating with provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Returns true if the caller sent something we refuse to act on
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RelayError::MissingDestination
                | RelayError::DestinationNotAllowed { .. }
                | RelayError::InvalidAmount
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::MissingDestination => 400,
            RelayError::DestinationNotAllowed { .. } => 400,
            RelayError::InvalidAmount => 400,
            RelayError::Configuration(_) => 500,
            RelayError::ProviderError { .. } => 500,
            RelayError::NetworkError(_) => 500,
            RelayError::Serialization(_) => 500,
            RelayError::Internal(_) => 500,
        }
    }

    /// Message safe to show the caller. Server-side causes are not disclosed.
    pub fn public_message(&self) -> &'static str {
        match self {
            RelayError::MissingDestination => "Missing to",
            RelayError::DestinationNotAllowed { .. } => "Destination not allowed",
            RelayError::InvalidAmount => "Invalid amount",
            _ => "Internal error",
        }
    }
}

/// Result type alias for relay operations
pub type RelayResult<T> = Result<T, RelayError>;
