//! Application configuration.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Hosted relational datastore configuration.
    pub datastore: DatastoreConfig,
    /// Community moderation settings.
    #[serde(default)]
    pub community: CommunityConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Connection settings for the REST endpoint of the hosted database.
#[derive(Debug, Clone, Deserialize)]
pub struct DatastoreConfig {
    /// REST endpoint root, e.g. `https://project.example.co/rest/v1`.
    pub url: String,
    /// API key sent as both `apikey` and bearer token.
    pub api_key: String,
    /// Request timeout in seconds. Unset means the HTTP client default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Table holding the user directory.
    #[serde(default = "default_user_table")]
    pub user_table: String,
}

/// Community moderation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CommunityConfig {
    /// Page size used when a list request omits one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    /// Upper bound accepted for a list page size.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
    /// Indentation cap applied to comment threads.
    #[serde(default = "default_max_indent_depth")]
    pub max_indent_depth: usize,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

fn default_user_table() -> String {
    "users".to_string()
}

const fn default_page_size() -> u64 {
    20
}

const fn default_max_page_size() -> u64 {
    100
}

const fn default_max_indent_depth() -> usize {
    4
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            max_indent_depth: default_max_indent_depth(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` in the working directory, if present
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `FACILITY_ADMIN_ENV`)
    /// 4. Environment variables with `FACILITY_ADMIN` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        // A missing .env is the normal case in deployments.
        let _ = dotenvy::dotenv();

        let env =
            std::env::var("FACILITY_ADMIN_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("FACILITY_ADMIN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Address the HTTP server binds to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
