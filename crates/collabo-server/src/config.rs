//! Configuration loading and management

use anyhow::{Context, Result, bail};
use collabo_auth::{AuthConfig as CoreAuthConfig, HashingCost};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Secret shipped in the default config; only acceptable in development
pub const PLACEHOLDER_JWT_SECRET: &str = "change-me-in-production";

const ENVIRONMENTS: [&str; 3] = ["development", "staging", "production"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx SQLite URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

/// Authentication configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Token lifetime in seconds
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    /// Clock skew tolerated on expiry, in seconds
    #[serde(default)]
    pub leeway_secs: u64,
    /// Argon2 passes per hash
    #[serde(default = "default_hash_iterations")]
    pub hash_iterations: u32,
    #[serde(default = "default_hash_memory_kib")]
    pub hash_memory_kib: u32,
    #[serde(default = "default_hash_parallelism")]
    pub hash_parallelism: u32,
    /// Deadline for a single store call, in milliseconds
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("leeway_secs", &self.leeway_secs)
            .field("hash_iterations", &self.hash_iterations)
            .field("hash_memory_kib", &self.hash_memory_kib)
            .field("hash_parallelism", &self.hash_parallelism)
            .field("store_timeout_ms", &self.store_timeout_ms)
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_allowed_methods")]
    pub allowed_methods: Vec<String>,
    #[serde(default = "default_true")]
    pub allow_credentials: bool,
    #[serde(default = "default_cors_max_age")]
    pub max_age_secs: u64,
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Optional SUPER_ADMIN account created at startup
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub admin_email: Option<String>,
    #[serde(default)]
    pub admin_password: Option<String>,
    #[serde(default = "default_admin_name")]
    pub admin_name: String,
}

impl std::fmt::Debug for BootstrapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapConfig")
            .field("admin_email", &self.admin_email)
            .field("admin_password", &self.admin_password.as_ref().map(|_| "<redacted>"))
            .field("admin_name", &self.admin_name)
            .finish()
    }
}

/// Values that override the file, typically from the environment
#[derive(clap::Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Deployment environment
    #[arg(long, env = "APP_ENV")]
    pub environment: Option<String>,

    /// Bind address
    #[arg(long, env = "SERVER_HOST")]
    pub host: Option<String>,

    /// Port
    #[arg(short, long, env = "SERVER_PORT")]
    pub port: Option<u16>,

    /// Database URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Token signing secret
    #[arg(long, env = "AUTH_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Token lifetime in seconds
    #[arg(long, env = "AUTH_JWT_EXPIRATION")]
    pub jwt_expiration: Option<u64>,

    /// Password hashing cost (Argon2 passes)
    #[arg(long, env = "AUTH_BCRYPT_COST")]
    pub hash_cost: Option<u32>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log format (`pretty` or `json`)
    #[arg(long, env = "LOG_FORMAT")]
    pub log_format: Option<String>,
}

// Default value functions
fn default_environment() -> String {
    "development".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_database_url() -> String {
    "sqlite:./data/collabo.db?mode=rwc".to_string()
}

fn default_jwt_secret() -> String {
    PLACEHOLDER_JWT_SECRET.to_string()
}

fn default_token_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_hash_iterations() -> u32 {
    HashingCost::default().iterations
}

fn default_hash_memory_kib() -> u32 {
    HashingCost::default().memory_kib
}

fn default_hash_parallelism() -> u32 {
    HashingCost::default().parallelism
}

fn default_store_timeout_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_allowed_methods() -> Vec<String> {
    ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_cors_max_age() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_secs: default_token_ttl_secs(),
            leeway_secs: 0,
            hash_iterations: default_hash_iterations(),
            hash_memory_kib: default_hash_memory_kib(),
            hash_parallelism: default_hash_parallelism(),
            store_timeout_ms: default_store_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
            allowed_methods: default_allowed_methods(),
            allow_credentials: true,
            max_age_secs: default_cors_max_age(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
            cors: CorsConfig::default(),
            metrics: MetricsConfig::default(),
            bootstrap: BootstrapConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file; a missing file means defaults
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Apply command-line / environment overrides on top of the file
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(environment) = &overrides.environment {
            self.environment = environment.clone();
        }
        if let Some(host) = &overrides.host {
            self.server.host = host.clone();
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(url) = &overrides.database_url {
            self.database.url = url.clone();
        }
        if let Some(secret) = &overrides.jwt_secret {
            self.auth.jwt_secret = secret.clone();
        }
        if let Some(ttl) = overrides.jwt_expiration {
            self.auth.token_ttl_secs = ttl;
        }
        if let Some(cost) = overrides.hash_cost {
            self.auth.hash_iterations = cost;
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level = level.clone();
        }
        if let Some(format) = &overrides.log_format {
            self.logging.format = format.clone();
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Reject settings the service must not start with
    pub fn validate(&self) -> Result<()> {
        if !ENVIRONMENTS.contains(&self.environment.as_str()) {
            bail!("environment must be one of: {}", ENVIRONMENTS.join(", "));
        }

        let secret = self.auth.jwt_secret.trim();
        if secret.is_empty() {
            bail!("auth.jwt_secret is required");
        }
        if secret == PLACEHOLDER_JWT_SECRET {
            if !self.is_development() {
                bail!("auth.jwt_secret must be changed outside development");
            }
            warn!("Using the placeholder JWT secret; set AUTH_JWT_SECRET before deploying");
        }

        if self.auth.token_ttl_secs == 0 {
            bail!("auth.token_ttl_secs must be greater than zero");
        }
        if self.auth.hash_iterations == 0 {
            bail!("auth.hash_iterations must be at least 1");
        }
        if self.auth.hash_parallelism == 0 {
            bail!("auth.hash_parallelism must be at least 1");
        }
        if self.auth.store_timeout_ms == 0 {
            bail!("auth.store_timeout_ms must be greater than zero");
        }

        if self.bootstrap.admin_email.is_some() != self.bootstrap.admin_password.is_some() {
            bail!("bootstrap.admin_email and bootstrap.admin_password must be set together");
        }

        Ok(())
    }

    /// Settings handed to the auth core
    pub fn auth_config(&self) -> CoreAuthConfig {
        let mut config = CoreAuthConfig::new(self.auth.jwt_secret.clone());
        config.token_ttl = Duration::from_secs(self.auth.token_ttl_secs);
        config.leeway = Duration::from_secs(self.auth.leeway_secs);
        config.hashing = HashingCost::new(
            self.auth.hash_iterations,
            self.auth.hash_memory_kib,
            self.auth.hash_parallelism,
        );
        config.store_timeout = Duration::from_millis(self.auth.store_timeout_ms);
        config
    }
}

impl DatabaseConfig {
    /// Directory holding the SQLite file, if the URL names one
    pub fn data_dir(&self) -> Option<PathBuf> {
        let rest = self
            .url
            .strip_prefix("sqlite://")
            .or_else(|| self.url.strip_prefix("sqlite:"))?;
        let path = rest.split('?').next().unwrap_or_default();
        if path.is_empty() || path.starts_with(":memory:") {
            return None;
        }
        Path::new(path)
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load("/nonexistent/collabo.toml").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.token_ttl_secs, 86400);
        assert_eq!(config.environment, "development");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
environment = "production"

[server]
port = 9090

[auth]
jwt_secret = "a-real-secret"
token_ttl_secs = 600
"#
        )
        .unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.token_ttl_secs, 600);
        assert_eq!(config.auth.hash_iterations, HashingCost::default().iterations);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());

        let core = config.auth_config();
        assert_eq!(core.token_ttl, Duration::from_secs(600));
        assert_eq!(core.jwt_secret, "a-real-secret");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();
        assert!(Config::load(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_overrides_win() {
        let mut config = Config::default();
        config.apply_overrides(&Overrides {
            environment: Some("staging".to_string()),
            port: Some(3000),
            jwt_secret: Some("from-env".to_string()),
            jwt_expiration: Some(120),
            hash_cost: Some(3),
            log_level: Some("debug".to_string()),
            ..Default::default()
        });

        assert_eq!(config.environment, "staging");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.jwt_secret, "from-env");
        assert_eq!(config.auth.token_ttl_secs, 120);
        assert_eq!(config.auth.hash_iterations, 3);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_validation_rules() {
        let mut config = Config::default();
        config.environment = "production".to_string();
        assert!(config.validate().is_err(), "placeholder secret in production");

        config.auth.jwt_secret = "   ".to_string();
        assert!(config.validate().is_err());

        config.auth.jwt_secret = "real-secret".to_string();
        assert!(config.validate().is_ok());

        config.environment = "qa".to_string();
        assert!(config.validate().is_err());
        config.environment = "production".to_string();

        config.auth.hash_iterations = 0;
        assert!(config.validate().is_err());
        config.auth.hash_iterations = 1;

        config.auth.token_ttl_secs = 0;
        assert!(config.validate().is_err());
        config.auth.token_ttl_secs = 60;

        config.bootstrap.admin_email = Some("root@example.com".to_string());
        assert!(config.validate().is_err());
        config.bootstrap.admin_password = Some("root-password".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_secrets_are_redacted_in_debug() {
        let mut config = Config::default();
        config.auth.jwt_secret = "top-secret".to_string();
        config.bootstrap.admin_password = Some("hunter22".to_string());
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("top-secret"));
        assert!(!rendered.contains("hunter22"));
    }

    #[test]
    fn test_database_data_dir() {
        let db = |url: &str| DatabaseConfig {
            url: url.to_string(),
        };
        assert_eq!(
            db("sqlite:./data/collabo.db?mode=rwc").data_dir(),
            Some(PathBuf::from("./data"))
        );
        assert_eq!(
            db("sqlite:///var/lib/collabo/app.db").data_dir(),
            Some(PathBuf::from("/var/lib/collabo"))
        );
        assert_eq!(db("sqlite::memory:").data_dir(), None);
        assert_eq!(db("sqlite:collabo.db").data_dir(), None);
    }
}
