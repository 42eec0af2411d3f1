/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `API_PRODUCTION`: Enables HSTS (default: false)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: *)
/// - `IDENTITY_PROVIDER_URL`: Identity provider base URL (required)
/// - `IDENTITY_PROVIDER_API_KEY`: Admin API key (required)
/// - `IDENTITY_PROVIDER_SOURCE_TENANT_ID`: Template tenant for new tenants (required)
/// - `IDENTITY_PROVIDER_TIMEOUT_SECS`: Per-request timeout (default: client default)
/// - `TENANT_ISSUER`: Issuer set on new tenants (default: saasbp.io)
/// - `BASE_DOMAIN`: Domain organization subdomains live under (default: saasbp.io)
/// - `REDIRECT_SCHEME`: Scheme of the post-signup redirect (default: https)
/// - `ROLLBACK_ON_FAILURE`: Undo created resources on failure (default: false)
/// - `RUST_LOG`: Log level (default: saasbp_api=debug,saasbp_shared=debug,tower_http=debug)
///
/// # Example
///
/// ```no_run
/// use saasbp_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use saasbp_shared::identity::ProviderConfig;
use saasbp_shared::provisioning::ProvisioningConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::time::Duration;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Identity provider configuration
    pub identity: IdentityConfig,

    /// Sign-up behavior
    pub signup: SignupConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Production mode (enables HSTS)
    pub production: bool,

    /// Allowed CORS origins (`*` for permissive)
    pub cors_origins: Vec<String>,
}

/// Identity provider configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Provider base URL
    pub url: String,

    /// Admin API key
    ///
    /// IMPORTANT: This key can create tenants. Never log it.
    #[serde(skip_serializing)]
    pub api_key: String,

    /// Tenant whose settings are copied into new tenants
    pub source_tenant_id: String,

    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .field("source_tenant_id", &self.source_tenant_id)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Sign-up behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupConfig {
    /// Issuer set on new tenants
    pub issuer: String,

    /// Domain organization subdomains live under
    pub base_domain: String,

    /// Scheme of the post-signup redirect
    pub redirect_scheme: String,

    /// Undo created resources when a later step fails
    pub rollback_on_failure: bool,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or_default =
            |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("{} environment variable is required", name))
        };

        let host = or_default("API_HOST", "0.0.0.0");
        let port = or_default("API_PORT", "8080").parse::<u16>()?;
        let production = parse_bool(&or_default("API_PRODUCTION", "false"))?;
        let cors_origins = or_default("CORS_ORIGINS", "*")
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let url = required("IDENTITY_PROVIDER_URL")?;
        let api_key = required("IDENTITY_PROVIDER_API_KEY")?;
        let source_tenant_id = required("IDENTITY_PROVIDER_SOURCE_TENANT_ID")?;
        let timeout_secs = lookup("IDENTITY_PROVIDER_TIMEOUT_SECS")
            .map(|v| v.parse::<u64>())
            .transpose()?;

        let redirect_scheme = or_default("REDIRECT_SCHEME", "https");
        if redirect_scheme != "https" && redirect_scheme != "http" {
            anyhow::bail!("REDIRECT_SCHEME must be http or https");
        }

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                production,
                cors_origins,
            },
            identity: IdentityConfig {
                url,
                api_key,
                source_tenant_id,
                timeout_secs,
            },
            signup: SignupConfig {
                issuer: or_default("TENANT_ISSUER", "saasbp.io"),
                base_domain: or_default("BASE_DOMAIN", "saasbp.io"),
                redirect_scheme,
                rollback_on_failure: parse_bool(&or_default("ROLLBACK_ON_FAILURE", "false"))?,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Connection settings for the identity provider client
    pub fn provider_config(&self) -> ProviderConfig {
        let config = ProviderConfig::new(self.identity.url.as_str(), self.identity.api_key.as_str());
        match self.identity.timeout_secs {
            Some(secs) => config.with_timeout(Duration::from_secs(secs)),
            None => config,
        }
    }

    /// Settings for the provisioning workflow
    pub fn provisioning_config(&self) -> ProvisioningConfig {
        ProvisioningConfig::new(self.identity.source_tenant_id.as_str())
            .with_issuer(self.signup.issuer.as_str())
            .with_base_domain(self.signup.base_domain.as_str())
            .with_rollback(self.signup.rollback_on_failure)
    }
}

fn parse_bool(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => anyhow::bail!("invalid boolean value: {}", other),
    }
}
