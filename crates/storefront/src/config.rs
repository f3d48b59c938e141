//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `PRELUDA_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `PRELUDA_CATALOG_PATH` - YAML/JSON catalog file (default: built-in catalog)
//! - `PRELUDA_ALIASES_PATH` - YAML alias table (default: built-in aliases)
//! - `PRELUDA_DEFAULT_PRODUCT` - Fallback product slug (default: idepetak)
//! - `PRELUDA_PROMO_PERCENT` - Instagram promo discount, 0-100 (default: 10)
//! - `PRELUDA_SUBMIT_TIMEOUT_SECS` - Order persistence timeout (default: 10)
//! - `PRELUDA_NOTIFY_QUEUE_CAPACITY` - Pending confirmation emails (default: 64)
//! - `RESEND_API_KEY` - Resend API key; confirmation emails are only logged without it
//! - `RESEND_BASE_URL` - Resend API base URL (default: <https://api.resend.com>)
//! - `ORDER_EMAIL_FROM` - Sender (default: `PreludaStvar <porudzbine@mg.preludastvar.com>`)
//! - `ORDER_EMAIL_BCC` - Shop copy of every confirmation (default: info@preludastvar.rs)

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::cart::{DEFAULT_PROMO_PERCENT, PromoPolicy};
use crate::catalog::{Catalog, CatalogError};
use crate::resolver::{AliasTable, DEFAULT_PRODUCT_SLUG, ResolverConfig, ResolverError};

const DEFAULT_SUBMIT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_NOTIFY_QUEUE_CAPACITY: usize = 64;
const DEFAULT_RESEND_BASE_URL: &str = "https://api.resend.com";
const DEFAULT_EMAIL_FROM: &str = "PreludaStvar <porudzbine@mg.preludastvar.com>";
const DEFAULT_EMAIL_BCC: &str = "info@preludastvar.rs";
const MIN_API_KEY_LENGTH: usize = 16;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "xxx",
    "todo",
    "insert",
    "put-your",
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

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// Catalog file; the built-in catalog is used when unset
    pub catalog_path: Option<PathBuf>,
    /// Alias table file; the built-in table is used when unset
    pub aliases_path: Option<PathBuf>,
    /// Slug of the product unresolvable inputs land on
    pub default_product: String,
    /// Instagram promo discount in percent
    pub promo_percent: u8,
    /// Upper bound on a single order persistence attempt
    pub submit_timeout: Duration,
    /// Capacity of the confirmation email queue
    pub notify_queue_capacity: usize,
    /// Transactional email settings, if an API key is configured
    pub email: Option<EmailConfig>,
}

/// Resend transactional email configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct EmailConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub from: String,
    pub bcc: Option<String>,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("from", &self.from)
            .field("bcc", &self.bcc)
            .finish()
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            catalog_path: None,
            aliases_path: None,
            default_product: DEFAULT_PRODUCT_SLUG.to_string(),
            promo_percent: DEFAULT_PROMO_PERCENT,
            submit_timeout: Duration::from_secs(DEFAULT_SUBMIT_TIMEOUT_SECS),
            notify_queue_capacity: DEFAULT_NOTIFY_QUEUE_CAPACITY,
            email: None,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed or the API key looks
    /// like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`StorefrontConfig::from_env`].
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = var("PRELUDA_DATABASE_URL")
            .or_else(|| var("DATABASE_URL"))
            .map(SecretString::from);

        let promo_percent: u8 = parse_or_default(&var, "PRELUDA_PROMO_PERCENT", DEFAULT_PROMO_PERCENT)?;
        if promo_percent > 100 {
            return Err(ConfigError::InvalidEnvVar(
                "PRELUDA_PROMO_PERCENT".to_string(),
                format!("must be between 0 and 100 (got {promo_percent})"),
            ));
        }

        let submit_timeout_secs: u64 = parse_or_default(
            &var,
            "PRELUDA_SUBMIT_TIMEOUT_SECS",
            DEFAULT_SUBMIT_TIMEOUT_SECS,
        )?;
        if submit_timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "PRELUDA_SUBMIT_TIMEOUT_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let notify_queue_capacity: usize = parse_or_default(
            &var,
            "PRELUDA_NOTIFY_QUEUE_CAPACITY",
            DEFAULT_NOTIFY_QUEUE_CAPACITY,
        )?;
        if notify_queue_capacity == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "PRELUDA_NOTIFY_QUEUE_CAPACITY".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            catalog_path: var("PRELUDA_CATALOG_PATH").map(PathBuf::from),
            aliases_path: var("PRELUDA_ALIASES_PATH").map(PathBuf::from),
            default_product: var("PRELUDA_DEFAULT_PRODUCT")
                .unwrap_or_else(|| DEFAULT_PRODUCT_SLUG.to_string()),
            promo_percent,
            submit_timeout: Duration::from_secs(submit_timeout_secs),
            notify_queue_capacity,
            email: EmailConfig::from_vars(&var)?,
        })
    }

    /// The database URL, or an error naming the variable to set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if no database is configured.
    pub fn require_database_url(&self) -> Result<&SecretString, ConfigError> {
        self.database_url
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("PRELUDA_DATABASE_URL".to_string()))
    }

    /// Load the configured catalog file, or the built-in catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the file cannot be loaded.
    pub fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        match &self.catalog_path {
            Some(path) => Catalog::load(path),
            None => Catalog::builtin(),
        }
    }

    /// Resolver settings from the configured default slug and alias file.
    ///
    /// # Errors
    ///
    /// Returns `ResolverError` if the alias file cannot be loaded.
    pub fn resolver_config(&self) -> Result<ResolverConfig, ResolverError> {
        let aliases = match &self.aliases_path {
            Some(path) => AliasTable::load(path)?,
            None => AliasTable::builtin(),
        };
        Ok(ResolverConfig {
            default_slug: self.default_product.clone(),
            aliases,
        })
    }

    #[must_use]
    pub fn promo_policy(&self) -> PromoPolicy {
        PromoPolicy::new(self.promo_percent)
    }
}

impl EmailConfig {
    fn from_vars(var: &impl Fn(&str) -> Option<String>) -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = var("RESEND_API_KEY") else {
            return Ok(None);
        };
        let api_key = SecretString::from(api_key);
        validate_api_key(&api_key, "RESEND_API_KEY")?;

        Ok(Some(Self {
            api_key,
            base_url: var("RESEND_BASE_URL")
                .unwrap_or_else(|| DEFAULT_RESEND_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            from: var("ORDER_EMAIL_FROM").unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_string()),
            bcc: match var("ORDER_EMAIL_BCC") {
                Some(bcc) if bcc.trim().is_empty() => None,
                Some(bcc) => Some(bcc),
                None => Some(DEFAULT_EMAIL_BCC.to_string()),
            },
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or_default<T>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    var(key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Reject API keys that are too short or look like placeholders.
fn validate_api_key(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_API_KEY_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {MIN_API_KEY_LENGTH} characters (got {})",
                value.len()
            ),
        ));
    }

    let lower = value.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }
    Ok(())
}
