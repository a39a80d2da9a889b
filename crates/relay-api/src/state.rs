//! # Application State
//!
//! Shared state for the Axum application.
//! Built once at startup and handed to every handler; nothing in it changes
//! while the server runs.

use anyhow::{bail, Context};
use axum::http::HeaderMap;
use relay_core::{BoxedPaymentStrategy, BridgeUrls, DestinationAllowList};
use relay_stripe::StripeCheckoutStrategy;
use std::sync::Arc;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_RETURN_PATH: &str = "/return";
const DEFAULT_RETURN_URL: &str = "academiadeinmigrantes://checkout";
const DEFAULT_ALLOWED_TARGETS: &str = "academiadeinmigrantes,exp";

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Fixed public base URL; when unset it is derived from request headers
    pub public_base_url: Option<String>,
    /// Path the redirect bridge is served on
    pub return_path: String,
    /// Destination used when the app does not send a `returnUrl`
    pub default_return_url: String,
    /// Where the bridge may send the browser
    pub allowed_destinations: DestinationAllowList,
}

impl AppConfig {
    /// Load from environment variables (and `.env` if present)
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key/value source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(p) => p
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT is not a valid port: {}", p))?,
            None => DEFAULT_PORT,
        };

        let mut return_path = var("RETURN_PATH").unwrap_or_else(|| DEFAULT_RETURN_PATH.to_string());
        if !return_path.starts_with('/') {
            return_path.insert(0, '/');
        }

        let allowed = var("ALLOWED_RETURN_TARGETS").unwrap_or_else(|| DEFAULT_ALLOWED_TARGETS.to_string());
        let allowed_destinations = DestinationAllowList::parse(&allowed)
            .context("ALLOWED_RETURN_TARGETS is invalid")?;

        let default_return_url = var("DEFAULT_RETURN_URL").unwrap_or_else(|| DEFAULT_RETURN_URL.to_string());
        if !allowed_destinations.permits(&default_return_url) {
            bail!(
                "DEFAULT_RETURN_URL {} is not covered by ALLOWED_RETURN_TARGETS",
                default_return_url
            );
        }

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            environment: var("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            public_base_url: var("PUBLIC_BASE_URL"),
            return_path,
            default_return_url,
            allowed_destinations,
        })
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Public base URL for bridge links.
    ///
    /// Behind a tunnel or proxy the `X-Forwarded-*` headers win over `Host`.
    pub fn public_base(&self, headers: &HeaderMap) -> String {
        if let Some(base) = &self.public_base_url {
            return base.clone();
        }

        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let host = header("x-forwarded-host")
            .or_else(|| header("host"))
            .map(str::to_string)
            .unwrap_or_else(|| format!("localhost:{}", self.port));
        let proto = header("x-forwarded-proto").unwrap_or("http");

        format!("{}://{}", proto, host)
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: Arc<AppConfig>,
    /// Payment provider
    pub payments: BoxedPaymentStrategy,
}

impl AppState {
    /// Create a new AppState with the Stripe strategy
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let stripe_strategy = StripeCheckoutStrategy::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;

        Ok(Self::with_strategy(config, Arc::new(stripe_strategy)))
    }

    pub fn with_strategy(config: AppConfig, payments: BoxedPaymentStrategy) -> Self {
        Self {
            config: Arc::new(config),
            payments,
        }
    }

    /// Bridge URL builder for the request carrying `headers`
    pub fn bridge_urls(&self, headers: &HeaderMap) -> BridgeUrls {
        BridgeUrls::new(self.config.public_base(headers), self.config.return_path.clone())
    }
}
