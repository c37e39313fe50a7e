//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PAYMENT_KEY_ID` - Publishable key of the hosted payment widget
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `APEX_API_URL` - Backend REST base URL (default: <http://localhost:8000/api>)
//! - `APEX_API_TOKEN` - Bearer token for the backend (high entropy)
//! - `APEX_API_TIMEOUT_SECS` - Backend request timeout (default: 10)
//! - `CHECKOUT_SHIPPING` - Flat shipping charge (default: 55)
//! - `CHECKOUT_TAXES` - Flat tax charge (default: 5)
//! - `CHECKOUT_CURRENCY` - ISO currency code (default: INR)
//! - `STORE_NAME` - Merchant name shown in the payment widget (default: Apex Store)
//! - `PAYMENT_TIMEOUT_SECS` - How long a card payment may stay open (default: 900)
//! - `CHECKOUT_SESSION_IDLE_SECS` - Idle time before a checkout is dropped (default: 1800)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use apex_core::{Currency, Pricing};
use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Backend REST API configuration
    pub backend: BackendConfig,
    /// Hosted payment widget configuration
    pub payment: PaymentConfig,
    /// Pricing and checkout lifetime
    pub checkout: CheckoutConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Backend REST API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL every endpoint is appended to
    pub api_url: Url,
    /// Bearer token sent with every request
    pub api_token: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("api_url", &self.api_url.as_str())
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Hosted payment widget configuration.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Publishable key handed to the browser
    pub key_id: String,
    /// How long a card payment may stay open
    pub timeout: Duration,
}

/// Pricing and checkout lifetime.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    pub pricing: Pricing,
    /// Merchant name shown in the payment widget
    pub store_name: String,
    /// Idle time before an abandoned checkout is dropped
    pub session_idle: Duration,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the backend token fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup(env: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = parse_env_or_default(env, "STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default(env, "STOREFRONT_PORT", "3000")?;

        Ok(Self {
            host,
            port,
            backend: BackendConfig::from_lookup(env)?,
            payment: PaymentConfig::from_lookup(env)?,
            checkout: CheckoutConfig::from_lookup(env)?,
            sentry_dsn: env("SENTRY_DSN"),
            sentry_environment: env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl BackendConfig {
    fn from_lookup(env: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url: Url =
            parse_env_or_default(env, "APEX_API_URL", "http://localhost:8000/api")?;
        if api_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                "APEX_API_URL".to_string(),
                "must be an absolute http(s) URL".to_string(),
            ));
        }

        let api_token = env("APEX_API_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .map(|token| {
                validate_secret_strength(&token, "APEX_API_TOKEN")?;
                Ok::<_, ConfigError>(SecretString::from(token))
            })
            .transpose()?;

        Ok(Self {
            api_url,
            api_token,
            timeout: Duration::from_secs(parse_env_or_default(env, "APEX_API_TIMEOUT_SECS", "10")?),
        })
    }
}

impl PaymentConfig {
    fn from_lookup(env: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            key_id: get_required_env(env, "PAYMENT_KEY_ID")?,
            timeout: Duration::from_secs(parse_env_or_default(env, "PAYMENT_TIMEOUT_SECS", "900")?),
        })
    }
}

impl CheckoutConfig {
    fn from_lookup(env: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let shipping: Decimal = parse_env_or_default(env, "CHECKOUT_SHIPPING", "55")?;
        let tax: Decimal = parse_env_or_default(env, "CHECKOUT_TAXES", "5")?;
        for (key, value) in [("CHECKOUT_SHIPPING", shipping), ("CHECKOUT_TAXES", tax)] {
            if value.is_sign_negative() {
                return Err(ConfigError::InvalidEnvVar(
                    key.to_string(),
                    "must not be negative".to_string(),
                ));
            }
        }
        let currency: Currency = parse_env_or_default(env, "CHECKOUT_CURRENCY", "INR")?;

        Ok(Self {
            pricing: Pricing::new(shipping, tax, currency),
            store_name: get_env_or_default(env, "STORE_NAME", "Apex Store"),
            session_idle: Duration::from_secs(parse_env_or_default(
                env,
                "CHECKOUT_SESSION_IDLE_SECS",
                "1800",
            )?),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(
    env: &dyn Fn(&str) -> Option<String>,
    key: &str,
) -> Result<String, ConfigError> {
    env(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(env: &dyn Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to a default.
fn parse_env_or_default<T>(
    env: &dyn Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(env, key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}
