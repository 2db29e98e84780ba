//! Configuration handling for the PG MCP Server.
//!
//! Every setting is a CLI flag that also reads an environment variable. The
//! configuration is parsed once at startup and never mutated afterwards.

use crate::models::{ConnectionSettings, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use clap::{ArgAction, Parser, ValueEnum};
use std::time::Duration;
use url::Url;

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_MCP_ENDPOINT: &str = "/";
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_POOL_SIZE: u32 = 10;

pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_PORT: u16 = 5432;
pub const DEFAULT_DB_NAME: &str = "postgres";
pub const DEFAULT_DB_USER: &str = "postgres";

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for CLI integration)
    #[default]
    Stdio,
    /// Streamable HTTP (for web clients)
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// PostgreSQL `sslmode` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SslMode {
    Disable,
    Allow,
    #[default]
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

impl SslMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disable => "disable",
            Self::Allow => "allow",
            Self::Prefer => "prefer",
            Self::Require => "require",
            Self::VerifyCa => "verify-ca",
            Self::VerifyFull => "verify-full",
        }
    }
}

/// Statement policy consulted by the safety gate and the pagination rewriter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPolicy {
    pub read_only: bool,
    pub max_page_size: u32,
    pub default_page_size: u32,
}

impl Default for QueryPolicy {
    fn default() -> Self {
        Self {
            read_only: true,
            max_page_size: MAX_PAGE_SIZE,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Configuration for the PG MCP Server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pg-mcp-server",
    about = "MCP server exposing safe, paginated SQL query and catalog tools for PostgreSQL",
    version,
    author
)]
pub struct Config {
    /// Full connection URL (postgres:// or sqlite:). Overrides the DB_* settings.
    #[arg(long, value_name = "URL", env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long, default_value = DEFAULT_DB_HOST, env = "DB_HOST")]
    pub db_host: String,

    #[arg(long, default_value_t = DEFAULT_DB_PORT, env = "DB_PORT")]
    pub db_port: u16,

    #[arg(long, default_value = DEFAULT_DB_NAME, env = "DB_NAME")]
    pub db_name: String,

    #[arg(long, default_value = DEFAULT_DB_USER, env = "DB_USER")]
    pub db_user: String,

    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// SSL mode for PostgreSQL connections
    #[arg(long, value_enum, default_value = "prefer", env = "DB_SSL_MODE")]
    pub db_ssl_mode: SslMode,

    /// Only accept SELECT, WITH and EXPLAIN statements
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = clap::builder::BoolishValueParser::new(),
        env = "READ_ONLY"
    )]
    pub read_only: bool,

    /// Upper bound for any page size (1-500)
    #[arg(long, default_value_t = MAX_PAGE_SIZE, env = "MAX_PAGE_SIZE")]
    pub max_page_size: u32,

    /// Page size used when a query does not request one
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, env = "DEFAULT_PAGE_SIZE")]
    pub default_page_size: u32,

    /// Connection timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS,
        env = "CONNECT_TIMEOUT_SECS"
    )]
    pub connect_timeout: u64,

    /// Idle connection timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_IDLE_TIMEOUT_SECS,
        env = "IDLE_TIMEOUT_SECS"
    )]
    pub idle_timeout: u64,

    /// Query timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_QUERY_TIMEOUT_SECS,
        env = "QUERY_TIMEOUT_SECS"
    )]
    pub query_timeout: u64,

    /// Maximum pooled connections
    #[arg(long, default_value_t = DEFAULT_POOL_SIZE, env = "POOL_SIZE")]
    pub pool_size: u32,

    /// Transport mode (stdio or http)
    #[arg(
        short,
        long,
        value_enum,
        default_value = "stdio",
        env = "MCP_TRANSPORT"
    )]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_HTTP_HOST,
        env = "MCP_HTTP_HOST"
    )]
    pub http_host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(
        long,
        default_value_t = DEFAULT_HTTP_PORT,
        env = "MCP_HTTP_PORT"
    )]
    pub http_port: u16,

    /// MCP endpoint path (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_MCP_ENDPOINT,
        env = "MCP_ENDPOINT"
    )]
    pub mcp_endpoint: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            database_url: None,
            db_host: DEFAULT_DB_HOST.to_string(),
            db_port: DEFAULT_DB_PORT,
            db_name: DEFAULT_DB_NAME.to_string(),
            db_user: DEFAULT_DB_USER.to_string(),
            db_password: None,
            db_ssl_mode: SslMode::Prefer,
            read_only: true,
            max_page_size: MAX_PAGE_SIZE,
            default_page_size: DEFAULT_PAGE_SIZE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
            idle_timeout: DEFAULT_IDLE_TIMEOUT_SECS,
            query_timeout: DEFAULT_QUERY_TIMEOUT_SECS,
            pool_size: DEFAULT_POOL_SIZE,
            transport: TransportMode::Stdio,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Reject inconsistent settings before any connection is attempted.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_page_size == 0 || self.max_page_size > MAX_PAGE_SIZE {
            return Err(format!(
                "MAX_PAGE_SIZE must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.max_page_size
            ));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(format!(
                "DEFAULT_PAGE_SIZE must be between 1 and MAX_PAGE_SIZE ({}), got {}",
                self.max_page_size, self.default_page_size
            ));
        }
        if self.pool_size == 0 {
            return Err("POOL_SIZE must be greater than 0".to_string());
        }
        if self.connect_timeout == 0 || self.query_timeout == 0 {
            return Err("CONNECT_TIMEOUT_SECS and QUERY_TIMEOUT_SECS must be greater than 0".into());
        }
        if !self.mcp_endpoint.starts_with('/') {
            return Err(format!(
                "MCP_ENDPOINT must start with '/', got '{}'",
                self.mcp_endpoint
            ));
        }
        Ok(())
    }

    /// The immutable statement policy derived from this configuration.
    pub fn query_policy(&self) -> QueryPolicy {
        QueryPolicy {
            read_only: self.read_only,
            max_page_size: self.max_page_size,
            default_page_size: self.default_page_size,
        }
    }

    /// Resolve the connection URL: `DATABASE_URL` if set, otherwise one
    /// assembled from the discrete `DB_*` settings.
    pub fn connection_string(&self) -> Result<String, String> {
        if let Some(url) = self.database_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Ok(url.trim().to_string());
        }

        let mut url = Url::parse("postgres://localhost")
            .map_err(|e| format!("Failed to build connection URL: {}", e))?;
        url.set_host(Some(&self.db_host))
            .map_err(|e| format!("Invalid DB_HOST '{}': {}", self.db_host, e))?;
        url.set_port(Some(self.db_port))
            .map_err(|_| "Invalid DB_PORT".to_string())?;
        url.set_username(&self.db_user)
            .map_err(|_| "Invalid DB_USER".to_string())?;
        if let Some(password) = self.db_password.as_deref() {
            url.set_password(Some(password))
                .map_err(|_| "Invalid DB_PASSWORD".to_string())?;
        }
        url.set_path(&self.db_name);
        url.query_pairs_mut()
            .append_pair("sslmode", self.db_ssl_mode.as_str());

        Ok(url.to_string())
    }

    /// Build the settings used to open the connection pool.
    pub fn connection_settings(&self) -> Result<ConnectionSettings, String> {
        let mut settings = ConnectionSettings::new(self.connection_string()?, self.read_only)?;
        settings.pool_size = self.pool_size;
        settings.connect_timeout = Duration::from_secs(self.connect_timeout);
        settings.idle_timeout = Duration::from_secs(self.idle_timeout);
        settings.query_timeout = self.query_timeout_duration();
        Ok(settings)
    }

    /// Get the HTTP bind address.
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// Get the query timeout as a Duration.
    pub fn query_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.query_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DatabaseType;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.transport, TransportMode::Stdio);
        assert_eq!(config.http_host, DEFAULT_HTTP_HOST);
        assert!(config.read_only);
        assert_eq!(config.max_page_size, 500);
        assert_eq!(config.default_page_size, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_match_parser() {
        let parsed = Config::try_parse_from(["pg-mcp-server"]).unwrap();
        assert!(parsed.read_only);
        assert_eq!(parsed.db_ssl_mode, SslMode::Prefer);
        assert_eq!(parsed.pool_size, DEFAULT_POOL_SIZE);
    }

    #[test]
    fn test_read_only_accepts_boolish_values() {
        let parsed = Config::try_parse_from(["pg-mcp-server", "--read-only", "false"]).unwrap();
        assert!(!parsed.read_only);
        let parsed = Config::try_parse_from(["pg-mcp-server", "--read-only", "no"]).unwrap();
        assert!(!parsed.read_only);
    }

    #[test]
    fn test_http_bind_addr() {
        let config = Config {
            http_host: "0.0.0.0".to_string(),
            http_port: 3000,
            ..Config::default()
        };
        assert_eq!(config.http_bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_validate_rejects_oversized_max_page() {
        let config = Config {
            max_page_size: 1000,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_default_above_max() {
        let config = Config {
            max_page_size: 50,
            default_page_size: 100,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("DEFAULT_PAGE_SIZE"));
    }

    #[test]
    fn test_validate_rejects_zero_pool() {
        let config = Config {
            pool_size: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_query_policy() {
        let config = Config {
            read_only: false,
            max_page_size: 200,
            default_page_size: 20,
            ..Config::default()
        };
        let policy = config.query_policy();
        assert!(!policy.read_only);
        assert_eq!(policy.max_page_size, 200);
        assert_eq!(policy.default_page_size, 20);
    }

    #[test]
    fn test_connection_string_from_parts() {
        let config = Config {
            db_host: "db.internal".to_string(),
            db_port: 6543,
            db_name: "analytics".to_string(),
            db_user: "reader".to_string(),
            db_password: Some("p@ss word".to_string()),
            db_ssl_mode: SslMode::Require,
            ..Config::default()
        };
        let url = config.connection_string().unwrap();
        assert!(url.starts_with("postgres://reader:"));
        assert!(url.contains("@db.internal:6543/analytics"));
        assert!(url.contains("sslmode=require"));
        // Credentials are percent-encoded
        assert!(!url.contains("p@ss word"));
    }

    #[test]
    fn test_database_url_overrides_parts() {
        let config = Config {
            database_url: Some("sqlite:local.db".to_string()),
            db_host: "ignored".to_string(),
            ..Config::default()
        };
        assert_eq!(config.connection_string().unwrap(), "sqlite:local.db");

        let settings = config.connection_settings().unwrap();
        assert_eq!(settings.db_type, DatabaseType::SQLite);
        assert!(settings.read_only);
    }

    #[test]
    fn test_connection_settings_carry_timeouts() {
        let config = Config {
            query_timeout: 5,
            connect_timeout: 3,
            pool_size: 4,
            ..Config::default()
        };
        let settings = config.connection_settings().unwrap();
        assert_eq!(settings.db_type, DatabaseType::PostgreSQL);
        assert_eq!(settings.query_timeout, Duration::from_secs(5));
        assert_eq!(settings.connect_timeout, Duration::from_secs(3));
        assert_eq!(settings.pool_size, 4);
    }

    #[test]
    fn test_masked_target_hides_password() {
        let config = Config {
            db_password: Some("hunter2".to_string()),
            ..Config::default()
        };
        let settings = config.connection_settings().unwrap();
        assert!(!settings.masked_connection_string().contains("hunter2"));
    }
}
