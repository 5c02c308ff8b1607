// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;

use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::auth::PasswordRequirements;

/// Environment variable prefix; nested keys are separated by `__`
/// (`COMPANION_SERVER__PORT=9000`).
pub const ENV_PREFIX: &str = "COMPANION_";

/// Default configuration file, resolved against the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Shortest accepted signing key, in bytes
pub const MIN_SIGNING_KEY_LEN: usize = 32;

/// Longest accepted token lifetime (10 years)
pub const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub auth: AuthSettings,
    pub password: PasswordSettings,
    pub logging: LoggingSettings,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// sqlx SQLite URL, e.g. `sqlite://companion.db`
    pub database_url: String,
    /// Size of the read-only connection pool
    pub max_read_connections: u32,
}

/// Token signing and login throttling
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Key used to sign new tokens. When unset an ephemeral key is generated
    /// at startup.
    pub signing_key: Option<String>,
    /// Retired keys that are still accepted when verifying tokens
    pub previous_signing_keys: Vec<String>,
    /// Token lifetime; 0 disables expiry, at most `MAX_TOKEN_TTL_SECS`
    pub token_ttl_secs: u64,
    /// Consecutive failed logins before a username is locked
    pub login_max_attempts: u32,
    pub login_lockout_secs: u64,
}

/// Password hashing cost and acceptance rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordSettings {
    /// scrypt CPU/memory cost, as log2(N)
    pub scrypt_log_n: u8,
    /// scrypt block size
    pub scrypt_r: u32,
    /// scrypt parallelism
    pub scrypt_p: u32,
    pub min_length: usize,
    pub max_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://companion.db".to_string(),
            max_read_connections: 8,
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            signing_key: None,
            previous_signing_keys: Vec::new(),
            token_ttl_secs: 60 * 60 * 24 * 7, // 7 days
            login_max_attempts: 5,
            login_lockout_secs: 5 * 60,
        }
    }
}

// Keys must never end up in logs.
impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("signing_key", &self.signing_key.as_ref().map(|_| "<redacted>"))
            .field("previous_signing_keys", &self.previous_signing_keys.len())
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("login_max_attempts", &self.login_max_attempts)
            .field("login_lockout_secs", &self.login_lockout_secs)
            .finish()
    }
}

impl Default for PasswordSettings {
    fn default() -> Self {
        Self {
            scrypt_log_n: 15,
            scrypt_r: 8,
            scrypt_p: 1,
            min_length: 8,
            max_length: 128,
            require_uppercase: false,
            require_lowercase: false,
            require_digit: false,
            require_special: false,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Settings {
    /// Load settings from `config.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load settings from the given TOML file (if present) and the environment.
    /// Environment variables take precedence over the file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("failed to load configuration from {}", path.display()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check cross-field constraints that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("server.port must be non-zero");
        }
        if self.storage.max_read_connections == 0 {
            bail!("storage.max_read_connections must be at least 1");
        }
        // Every pooled connection would open its own private in-memory database
        let url = self.storage.database_url.to_ascii_lowercase();
        if url.contains(":memory:") || url.contains("mode=memory") {
            bail!("storage.database_url must point to a file, in-memory databases are not supported");
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            bail!("logging.level must be one of {LOG_LEVELS:?}");
        }
        if let Some(key) = &self.auth.signing_key {
            if key.len() < MIN_SIGNING_KEY_LEN {
                bail!("auth.signing_key must be at least {MIN_SIGNING_KEY_LEN} bytes");
            }
        }
        if self
            .auth
            .previous_signing_keys
            .iter()
            .any(|k| k.len() < MIN_SIGNING_KEY_LEN)
        {
            bail!("auth.previous_signing_keys entries must be at least {MIN_SIGNING_KEY_LEN} bytes");
        }
        if self.auth.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            bail!("auth.token_ttl_secs must be at most {MAX_TOKEN_TTL_SECS}");
        }
        if self.auth.login_max_attempts == 0 {
            bail!("auth.login_max_attempts must be at least 1");
        }
        if self.password.min_length == 0 || self.password.min_length > self.password.max_length {
            bail!("password.min_length must be between 1 and password.max_length");
        }
        self.password
            .scrypt_params()
            .map_err(|e| anyhow::anyhow!("invalid scrypt parameters: {e}"))?;
        Ok(())
    }

    /// Socket address the HTTP server binds to
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .with_context(|| {
                format!(
                    "invalid bind address {}:{}",
                    self.server.host, self.server.port
                )
            })
    }
}

impl PasswordSettings {
    /// scrypt parameters for newly hashed passwords
    pub fn scrypt_params(&self) -> Result<scrypt::Params, scrypt::errors::InvalidParams> {
        scrypt::Params::new(
            self.scrypt_log_n,
            self.scrypt_r,
            self.scrypt_p,
            scrypt::Params::RECOMMENDED_LEN,
        )
    }

    /// Rules a new password must satisfy
    pub fn requirements(&self) -> PasswordRequirements {
        PasswordRequirements {
            min_length: self.min_length,
            max_length: self.max_length,
            require_uppercase: self.require_uppercase,
            require_lowercase: self.require_lowercase,
            require_digit: self.require_digit,
            require_special: self.require_special,
        }
    }
}

#[cfg(test)]
mod config_tests;
