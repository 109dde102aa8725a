//! # Gatehouse Config
//!
//! Configuration for the Gatehouse token lifecycle and permission engine.
//!
//! A [`GatehouseConfig`] is built once at startup and handed to each
//! component, which reads only the fields it needs. It can be created
//! manually, with [`GatehouseConfigBuilder`], or loaded from JSON/TOML files
//! and environment variables.
//!
//! ## Loading from environment variables
//!
//! With the prefix `GATEHOUSE` the following variables are read:
//!
//! ```text
//! GATEHOUSE_APP_NAME               - namespace for store keys
//! GATEHOUSE_SERVER_NAME            - issuer namespace
//! GATEHOUSE_JWT_SECRET             - signing secret (or GATEHOUSE_JWT_SECRET_FILE)
//! GATEHOUSE_JWT_ISSUER             - optional, default "api"
//! GATEHOUSE_JWT_LIFETIME           - optional, minutes, default 120
//! GATEHOUSE_JWT_LEEWAY             - optional, seconds, default 10
//! GATEHOUSE_JWT_GRACE_CAP          - optional, seconds, default 30 days
//! GATEHOUSE_AUTH_PLATFORMS         - optional, comma separated platform codes
//! GATEHOUSE_AUTH_PERMISSIONS_FILE  - optional, path to the permission catalogue
//! GATEHOUSE_AUTH_REVOCATION_POLICY - optional, "fail_closed" or "fail_open"
//! GATEHOUSE_AUTH_STORE_TIMEOUT_MS  - optional, default 2000
//! GATEHOUSE_AUTH_SCOPE_TTL         - optional, minutes
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_ISSUER: &str = "api";
pub const DEFAULT_LIFETIME_MINUTES: i64 = 120;
pub const DEFAULT_LEEWAY_SECONDS: i64 = 10;
pub const DEFAULT_GRACE_CAP_SECONDS: i64 = 30 * 86_400;
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 2_000;
/// Store key kinds an issuer must not take when app and server names match
const RESERVED_ISSUERS: &[&str] = &["blacklist", "role", "temporary"];
/// Store platform code, the default when no platforms are configured
pub const DEFAULT_PLATFORM: u16 = 4;

/// Errors that can occur when working with Gatehouse configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("jwt.secret is required but was not provided")]
    MissingSecret,

    #[error("server_name is required but was not provided")]
    MissingServerName,

    #[error("app_name is required but was not provided")]
    MissingAppName,

    #[error("jwt.issuer cannot be empty")]
    MissingIssuer,

    #[error("jwt.lifetime_minutes must be positive, got {0}")]
    InvalidLifetime(i64),

    #[error("jwt.leeway_seconds cannot be negative, got {0}")]
    InvalidLeeway(i64),

    #[error("jwt.grace_cap_seconds cannot be negative, got {0}")]
    InvalidGraceCap(i64),

    #[error("auth.store_timeout_ms must be positive")]
    InvalidStoreTimeout,

    /// Refresh records would share keys with the app's own namespace
    #[error("jwt.issuer {0:?} collides with the store namespace while app_name equals server_name")]
    KeyCollision(String),

    #[error("I/O error while reading configuration: {0}")]
    IOError(String),

    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("environment variable error: {0}")]
    EnvVarError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(error: std::io::Error) -> Self {
        ConfigError::IOError(error.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(error: serde_json::Error) -> Self {
        ConfigError::ParseError(error.to_string())
    }
}

#[cfg(feature = "toml")]
impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        ConfigError::ParseError(error.to_string())
    }
}

/// What to do when the blacklist cannot be consulted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationPolicy {
    /// Treat the token as revoked
    #[default]
    FailClosed,
    /// Treat the token as not revoked
    FailOpen,
}

impl FromStr for RevocationPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail_closed" | "closed" => Ok(RevocationPolicy::FailClosed),
            "fail_open" | "open" => Ok(RevocationPolicy::FailOpen),
            _ => Err(ConfigError::ParseError(format!(
                "Invalid revocation policy: {}",
                s
            ))),
        }
    }
}

/// Token signing and refresh settings
#[derive(Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    #[serde(default)]
    pub secret: String,
    /// Issuer subject, namespaced with `server_name` when tokens are issued
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_lifetime")]
    pub lifetime_minutes: i64,
    /// How long a published refresh record may be reused by racing requests
    #[serde(default = "default_leeway")]
    pub leeway_seconds: i64,
    /// Upper bound of the post-expiry grace window
    #[serde(default = "default_grace_cap")]
    pub grace_cap_seconds: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: default_issuer(),
            lifetime_minutes: default_lifetime(),
            leeway_seconds: default_leeway(),
            grace_cap_seconds: default_grace_cap(),
        }
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("lifetime_minutes", &self.lifetime_minutes)
            .field("leeway_seconds", &self.leeway_seconds)
            .field("grace_cap_seconds", &self.grace_cap_seconds)
            .finish()
    }
}

/// Authorization settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Platforms every common permission is visible to
    #[serde(default = "default_platforms")]
    pub platforms: Vec<u16>,
    /// JSON or TOML permission catalogue
    #[serde(default)]
    pub permissions_file: Option<PathBuf>,
    #[serde(default)]
    pub revocation_policy: RevocationPolicy,
    /// Deadline applied to each store round-trip
    #[serde(default = "default_store_timeout")]
    pub store_timeout_ms: u64,
    /// Defaults to twice the token lifetime, counted in hours: a 120 minute
    /// token keeps scopes for 240 hours
    #[serde(default)]
    pub scope_ttl_minutes: Option<i64>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            platforms: default_platforms(),
            permissions_file: None,
            revocation_policy: RevocationPolicy::default(),
            store_timeout_ms: default_store_timeout(),
            scope_ttl_minutes: None,
        }
    }
}

fn default_issuer() -> String {
    DEFAULT_ISSUER.to_string()
}

fn default_lifetime() -> i64 {
    DEFAULT_LIFETIME_MINUTES
}

fn default_leeway() -> i64 {
    DEFAULT_LEEWAY_SECONDS
}

fn default_grace_cap() -> i64 {
    DEFAULT_GRACE_CAP_SECONDS
}

fn default_platforms() -> Vec<u16> {
    vec![DEFAULT_PLATFORM]
}

fn default_store_timeout() -> u64 {
    DEFAULT_STORE_TIMEOUT_MS
}

/// Configuration for a Gatehouse deployment
///
/// # Examples
///
/// ```
/// use gatehouse_config::GatehouseConfig;
///
/// let config = GatehouseConfig::new("shop", "shop-api", "s3cret");
/// assert!(config.validate().is_ok());
/// assert_eq!(config.jwt.lifetime_minutes, 120);
/// ```
///
/// ```no_run
/// use gatehouse_config::GatehouseConfig;
///
/// let config = GatehouseConfig::from_file("./gatehouse.json")
///     .expect("Failed to load configuration");
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatehouseConfig {
    pub app_name: String,
    pub server_name: String,
    #[serde(default)]
    pub jwt: JwtConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl GatehouseConfig {
    /// Create a configuration with defaults for everything but the names and
    /// the signing secret
    pub fn new(
        app_name: impl Into<String>,
        server_name: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        GatehouseConfig {
            app_name: app_name.into(),
            server_name: server_name.into(),
            jwt: JwtConfig {
                secret: secret.into(),
                ..JwtConfig::default()
            },
            auth: AuthConfig::default(),
        }
    }

    pub fn builder() -> GatehouseConfigBuilder {
        GatehouseConfigBuilder::new()
    }

    /// Convert this configuration to a builder for modification
    pub fn to_builder(&self) -> GatehouseConfigBuilder {
        GatehouseConfigBuilder::from_config(self)
    }

    /// Create a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file_content = fs::read_to_string(path)?;
        let config: GatehouseConfig = serde_json::from_str(&file_content)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration from a TOML file
    #[cfg(feature = "toml")]
    pub fn from_toml(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file_content = fs::read_to_string(path)?;
        Self::from_toml_str(&file_content)
    }

    /// Create a configuration from a TOML document
    #[cfg(feature = "toml")]
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: GatehouseConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if any required environment variable is
    /// missing or a value cannot be parsed.
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let secret = required_var(&format!("{}_JWT_SECRET", prefix))?;
        Self::from_env_with_secret(prefix, secret)
    }

    /// Like [`GatehouseConfig::from_env`], but the secret may also be read
    /// from the file named by `<PREFIX>_JWT_SECRET_FILE`.
    pub fn from_env_or_file(prefix: &str) -> Result<Self, ConfigError> {
        let secret = match optional_var(&format!("{}_JWT_SECRET_FILE", prefix))? {
            Some(secret_file) => fs::read_to_string(secret_file)
                .map_err(|e| ConfigError::IOError(format!("Failed to read secret file: {}", e)))?
                .trim()
                .to_string(),
            None => required_var(&format!("{}_JWT_SECRET", prefix))?,
        };
        Self::from_env_with_secret(prefix, secret)
    }

    fn from_env_with_secret(prefix: &str, secret: String) -> Result<Self, ConfigError> {
        let app_name = required_var(&format!("{}_APP_NAME", prefix))?;
        let server_name = required_var(&format!("{}_SERVER_NAME", prefix))?;

        let mut jwt = JwtConfig {
            secret,
            ..JwtConfig::default()
        };
        if let Some(issuer) = optional_var(&format!("{}_JWT_ISSUER", prefix))? {
            jwt.issuer = issuer;
        }
        if let Some(lifetime) = parsed_var(&format!("{}_JWT_LIFETIME", prefix))? {
            jwt.lifetime_minutes = lifetime;
        }
        if let Some(leeway) = parsed_var(&format!("{}_JWT_LEEWAY", prefix))? {
            jwt.leeway_seconds = leeway;
        }
        if let Some(cap) = parsed_var(&format!("{}_JWT_GRACE_CAP", prefix))? {
            jwt.grace_cap_seconds = cap;
        }

        let mut auth = AuthConfig::default();
        if let Some(platforms) = optional_var(&format!("{}_AUTH_PLATFORMS", prefix))? {
            auth.platforms = parse_platforms(&platforms)?;
        }
        auth.permissions_file =
            optional_var(&format!("{}_AUTH_PERMISSIONS_FILE", prefix))?.map(PathBuf::from);
        if let Some(policy) = parsed_var(&format!("{}_AUTH_REVOCATION_POLICY", prefix))? {
            auth.revocation_policy = policy;
        }
        if let Some(timeout) = parsed_var(&format!("{}_AUTH_STORE_TIMEOUT_MS", prefix))? {
            auth.store_timeout_ms = timeout;
        }
        auth.scope_ttl_minutes = parsed_var(&format!("{}_AUTH_SCOPE_TTL", prefix))?;

        let config = GatehouseConfig {
            app_name,
            server_name,
            jwt,
            auth,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// A configuration that fails validation must abort startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_name.is_empty() {
            return Err(ConfigError::MissingAppName);
        }
        if self.server_name.is_empty() {
            return Err(ConfigError::MissingServerName);
        }
        if self.jwt.secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if self.jwt.issuer.is_empty() {
            return Err(ConfigError::MissingIssuer);
        }
        if self.jwt.lifetime_minutes <= 0 {
            return Err(ConfigError::InvalidLifetime(self.jwt.lifetime_minutes));
        }
        if self.jwt.leeway_seconds < 0 {
            return Err(ConfigError::InvalidLeeway(self.jwt.leeway_seconds));
        }
        if self.jwt.grace_cap_seconds < 0 {
            return Err(ConfigError::InvalidGraceCap(self.jwt.grace_cap_seconds));
        }
        if self.auth.store_timeout_ms == 0 {
            return Err(ConfigError::InvalidStoreTimeout);
        }
        // refresh keys are `<server>:<issuer>:<subject>`, the rest `<app>:<kind>:...`
        if self.app_name == self.server_name
            && RESERVED_ISSUERS.contains(&self.jwt.issuer.as_str())
        {
            return Err(ConfigError::KeyCollision(self.jwt.issuer.clone()));
        }
        Ok(())
    }

    /// TTL of cached role and temporary scopes, in minutes
    pub fn scope_ttl_minutes(&self) -> i64 {
        self.auth
            .scope_ttl_minutes
            .filter(|ttl| *ttl > 0)
            .unwrap_or_else(|| self.jwt.lifetime_minutes.saturating_mul(2 * 60))
    }
}

/// Builder for GatehouseConfig
///
/// # Examples
///
/// ```
/// use gatehouse_config::{GatehouseConfigBuilder, RevocationPolicy};
///
/// # fn main() -> Result<(), gatehouse_config::ConfigError> {
/// let config = GatehouseConfigBuilder::new()
///     .app_name("shop")
///     .server_name("shop-api")
///     .secret("s3cret")
///     .lifetime_minutes(60)
///     .platforms(vec![1, 4])
///     .revocation_policy(RevocationPolicy::FailClosed)
///     .build()?;
///
/// let relaxed = config.to_builder().leeway_seconds(30).build()?;
/// assert_eq!(relaxed.jwt.leeway_seconds, 30);
/// # Ok(())
/// # }
/// ```
#[derive(Default, Debug)]
pub struct GatehouseConfigBuilder {
    app_name: Option<String>,
    server_name: Option<String>,
    jwt: JwtConfig,
    auth: AuthConfig,
}

impl GatehouseConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &GatehouseConfig) -> Self {
        Self {
            app_name: Some(config.app_name.clone()),
            server_name: Some(config.server_name.clone()),
            jwt: config.jwt.clone(),
            auth: config.auth.clone(),
        }
    }

    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn server_name(mut self, server_name: impl Into<String>) -> Self {
        self.server_name = Some(server_name.into());
        self
    }

    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt.secret = secret.into();
        self
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.jwt.issuer = issuer.into();
        self
    }

    pub fn lifetime_minutes(mut self, minutes: i64) -> Self {
        self.jwt.lifetime_minutes = minutes;
        self
    }

    pub fn leeway_seconds(mut self, seconds: i64) -> Self {
        self.jwt.leeway_seconds = seconds;
        self
    }

    pub fn grace_cap_seconds(mut self, seconds: i64) -> Self {
        self.jwt.grace_cap_seconds = seconds;
        self
    }

    pub fn platforms(mut self, platforms: Vec<u16>) -> Self {
        self.auth.platforms = platforms;
        self
    }

    pub fn permissions_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.auth.permissions_file = Some(path.into());
        self
    }

    pub fn revocation_policy(mut self, policy: RevocationPolicy) -> Self {
        self.auth.revocation_policy = policy;
        self
    }

    pub fn store_timeout_ms(mut self, timeout: u64) -> Self {
        self.auth.store_timeout_ms = timeout;
        self
    }

    pub fn scope_ttl_minutes(mut self, minutes: i64) -> Self {
        self.auth.scope_ttl_minutes = Some(minutes);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<GatehouseConfig, ConfigError> {
        let config = GatehouseConfig {
            app_name: self.app_name.ok_or(ConfigError::MissingAppName)?,
            server_name: self.server_name.ok_or(ConfigError::MissingServerName)?,
            jwt: self.jwt,
            auth: self.auth,
        };
        config.validate()?;
        Ok(config)
    }
}

fn optional_var(name: &str) -> Result<Option<String>, ConfigError> {
    match env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::EnvVarError(format!("{}: {}", name, e))),
    }
}

fn required_var(name: &str) -> Result<String, ConfigError> {
    optional_var(name)?.ok_or_else(|| ConfigError::EnvVarError(format!("{} is not set", name)))
}

fn parsed_var<T>(name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    optional_var(name)?
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|e| ConfigError::ParseError(format!("{}: {}", name, e)))
        })
        .transpose()
}

fn parse_platforms(value: &str) -> Result<Vec<u16>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u16>()
                .map_err(|_| ConfigError::ParseError(format!("Invalid platform code: {}", s)))
        })
        .collect()
}

/// Try to load a configuration from standard locations
///
/// This function attempts to load a configuration from:
/// 1. Environment variables with the prefix "GATEHOUSE"
/// 2. `./gatehouse.json`, `~/.gatehouse/config.json`, `/etc/gatehouse/config.json`
/// 3. With the "toml" feature, the same paths with a `.toml` extension
///
/// Returns None if no configuration could be found.
pub fn try_load_default_config() -> Option<GatehouseConfig> {
    if let Ok(config) = GatehouseConfig::from_env_or_file("GATEHOUSE") {
        return Some(config);
    }

    let paths = [
        "./gatehouse.json",
        "~/.gatehouse/config.json",
        "/etc/gatehouse/config.json",
    ];

    for path in paths.iter() {
        if let Some(expanded_path) = expand_home(path) {
            if expanded_path.exists() {
                if let Ok(config) = GatehouseConfig::from_file(&expanded_path) {
                    return Some(config);
                }
            }
        }
    }

    #[cfg(feature = "toml")]
    {
        let toml_paths = [
            "./gatehouse.toml",
            "~/.gatehouse/config.toml",
            "/etc/gatehouse/config.toml",
        ];

        for path in toml_paths.iter() {
            if let Some(expanded_path) = expand_home(path) {
                if expanded_path.exists() {
                    if let Ok(config) = GatehouseConfig::from_toml(&expanded_path) {
                        return Some(config);
                    }
                }
            }
        }
    }

    None
}

fn expand_home(path: &str) -> Option<PathBuf> {
    match path.strip_prefix("~/") {
        Some(stripped) => dirs::home_dir().map(|home| home.join(stripped)),
        None => Some(Path::new(path).to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_applies_defaults() {
        let config = GatehouseConfig::new("shop", "shop-api", "secret");
        assert_eq!(config.jwt.issuer, DEFAULT_ISSUER);
        assert_eq!(config.jwt.lifetime_minutes, DEFAULT_LIFETIME_MINUTES);
        assert_eq!(config.jwt.leeway_seconds, DEFAULT_LEEWAY_SECONDS);
        assert_eq!(config.auth.platforms, vec![DEFAULT_PLATFORM]);
        assert_eq!(config.auth.revocation_policy, RevocationPolicy::FailClosed);
        assert_eq!(config.scope_ttl_minutes(), DEFAULT_LIFETIME_MINUTES * 2 * 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let config = GatehouseConfig::new("shop", "shop-api", "");
        assert!(matches!(config.validate(), Err(ConfigError::MissingSecret)));

        let config = GatehouseConfig::new("shop", "", "secret");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingServerName)
        ));

        let config = GatehouseConfig::new("", "shop-api", "secret");
        assert!(matches!(config.validate(), Err(ConfigError::MissingAppName)));

        let mut config = GatehouseConfig::new("shop", "shop-api", "secret");
        config.jwt.lifetime_minutes = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLifetime(0))
        ));

        let mut config = GatehouseConfig::new("shop", "shop-api", "secret");
        config.jwt.leeway_seconds = -1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLeeway(-1))
        ));
    }

    #[test]
    fn test_refresh_keys_cannot_collide_with_scope_keys() {
        let mut config = GatehouseConfig::new("shop", "shop", "secret");
        assert!(config.validate().is_ok());

        config.jwt.issuer = "role".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::KeyCollision(issuer)) if issuer == "role"
        ));
        config.jwt.issuer = "temporary".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::KeyCollision(_))));

        // distinct names keep the namespaces apart
        config.server_name = "shop-api".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_requires_names() {
        let result = GatehouseConfigBuilder::new().secret("secret").build();
        assert!(matches!(result, Err(ConfigError::MissingAppName)));

        let config = GatehouseConfigBuilder::new()
            .app_name("shop")
            .server_name("shop-api")
            .secret("secret")
            .scope_ttl_minutes(15)
            .build()
            .unwrap();
        assert_eq!(config.scope_ttl_minutes(), 15);
    }

    #[test]
    fn test_json_defaults() {
        let config: GatehouseConfig = serde_json::from_str(
            r#"{"app_name":"shop","server_name":"shop-api","jwt":{"secret":"s"}}"#,
        )
        .unwrap();
        assert_eq!(config.jwt.issuer, DEFAULT_ISSUER);
        assert_eq!(config.auth.store_timeout_ms, DEFAULT_STORE_TIMEOUT_MS);
    }

    #[test]
    fn test_revocation_policy_parsing() {
        assert_eq!(
            "fail_open".parse::<RevocationPolicy>().unwrap(),
            RevocationPolicy::FailOpen
        );
        assert_eq!(
            "FAIL_CLOSED".parse::<RevocationPolicy>().unwrap(),
            RevocationPolicy::FailClosed
        );
        assert!("maybe".parse::<RevocationPolicy>().is_err());
    }

    #[test]
    fn test_parse_platforms() {
        assert_eq!(parse_platforms("1, 2,4").unwrap(), vec![1, 2, 4]);
        assert!(parse_platforms("1,x").is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = GatehouseConfig::new("shop", "shop-api", "very-secret");
        assert!(!format!("{:?}", config).contains("very-secret"));
    }
}
