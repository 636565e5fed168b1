//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string for the session store
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_SESSION_SECRET` - Cookie signing secret (min 32 chars, high entropy)
//! - `GYM_API_BASE_URL` - Base URL of the gym REST backend
//! - `GYM_API_KEY` - Server-to-server key for the gym backend
//! - `PAYMENT_KEY_ID` - Public key ID handed to the payment widget
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_RATE_LIMIT` - Rate limit auth endpoints (default: true)
//! - `GYM_API_TIMEOUT_SECS` - Backend request timeout (default: 15)
//! - `GYM_CACHE_TTL_SECS` - Catalog cache TTL (default: 300)
//! - `CHECKOUT_LOCK_TTL_SECS` - How long a pending checkout holds stock (default: 600)
//! - `PAYMENT_CURRENCY` - Currency charged (default: INR)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.1)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use ironhouse_core::CurrencyCode;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
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
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Cookie signing secret
    pub session_secret: SecretString,
    /// Whether auth endpoints are rate limited per client IP
    pub rate_limit_auth: bool,
    /// Gym backend connection settings
    pub gym_api: GymApiConfig,
    /// Checkout and payment settings
    pub checkout: CheckoutConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

/// Gym backend connection settings.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct GymApiConfig {
    /// Base URL, e.g. `https://api.ironhousegym.in`
    pub base_url: Url,
    /// Server-to-server API key
    pub api_key: SecretString,
    /// Per-request timeout
    pub timeout: Duration,
    /// TTL for cached catalog reads
    pub cache_ttl: Duration,
}

impl std::fmt::Debug for GymApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GymApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

/// Checkout and payment settings.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Public key ID for the payment widget
    pub payment_key_id: String,
    /// Currency every order is charged in
    pub currency: CurrencyCode,
    /// How long stock locks are held for an unpaid checkout
    pub lock_ttl: Duration,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_parsed_or_default::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = get_parsed_or_default::<u16>("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        let session_secret = get_validated_secret("STOREFRONT_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "STOREFRONT_SESSION_SECRET")?;
        let rate_limit_auth = get_parsed_or_default::<bool>("STOREFRONT_RATE_LIMIT", "true")?;

        let gym_api = GymApiConfig::from_env()?;
        let checkout = CheckoutConfig::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_parsed_or_default::<f32>("SENTRY_SAMPLE_RATE", "1.0")?;
        let sentry_traces_sample_rate =
            get_parsed_or_default::<f32>("SENTRY_TRACES_SAMPLE_RATE", "0.1")?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            rate_limit_auth,
            gym_api,
            checkout,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl GymApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = get_required_env("GYM_API_BASE_URL")?;
        let base_url = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidEnvVar("GYM_API_BASE_URL".to_string(), e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                "GYM_API_BASE_URL".to_string(),
                "must be an http(s) URL".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            api_key: get_validated_secret("GYM_API_KEY")?,
            timeout: Duration::from_secs(get_parsed_or_default("GYM_API_TIMEOUT_SECS", "15")?),
            cache_ttl: Duration::from_secs(get_parsed_or_default("GYM_CACHE_TTL_SECS", "300")?),
        })
    }
}

impl CheckoutConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            payment_key_id: get_required_env("PAYMENT_KEY_ID")?,
            currency: get_parsed_or_default("PAYMENT_CURRENCY", "INR")?,
            lock_ttl: Duration::from_secs(get_parsed_or_default("CHECKOUT_LOCK_TTL_SECS", "600")?),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn get_parsed_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
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
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
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

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn gym_api() -> GymApiConfig {
        GymApiConfig {
            base_url: Url::parse("https://api.ironhousegym.in").unwrap(),
            api_key: SecretString::from("gk_live_9fQ2xV7pLm4Rt8Zc"),
            timeout: Duration::from_secs(15),
            cache_ttl: Duration::from_secs(300),
        }
    }

    #[test]
    fn test_shannon_entropy_edges() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_rejects_placeholders() {
        for value in ["your-api-key-here", "changeme123", "gym-secret-key"] {
            let err = validate_secret_strength(value, "GYM_API_KEY").unwrap_err();
            assert!(matches!(err, ConfigError::InsecureSecret(_, _)), "{value}");
        }
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("abababababababababababababab", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_validate_session_secret_length() {
        assert!(validate_session_secret(&SecretString::from("short"), "S").is_err());
        assert!(validate_session_secret(&SecretString::from("a".repeat(32)), "S").is_ok());
    }

    #[test]
    fn test_parse_currency_code() {
        assert_eq!("INR".parse::<CurrencyCode>().unwrap(), CurrencyCode::INR);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_socket_addr_and_secure_flag() {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            rate_limit_auth: true,
            gym_api: gym_api(),
            checkout: CheckoutConfig {
                payment_key_id: "rzp_test_abc".to_string(),
                currency: CurrencyCode::INR,
                lock_ttl: Duration::from_secs(600),
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_secure());
    }

    #[test]
    fn test_gym_api_config_debug_redacts_key() {
        let debug_output = format!("{:?}", gym_api());
        assert!(debug_output.contains("api.ironhousegym.in"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("gk_live_9fQ2xV7pLm4Rt8Zc"));
    }
}
