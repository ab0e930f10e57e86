use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Screenline";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default API bind address (loopback only).
pub const DEFAULT_BIND: &str = "127.0.0.1:8480";

pub const BIND_ENV: &str = "SCREENLINE_BIND";
pub const DB_ENV: &str = "SCREENLINE_DB";

/// Get the application data directory: ~/Screenline/ on all platforms.
/// Falls back to the working directory when no home directory is known.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default SQLite database location.
pub fn database_path() -> PathBuf {
    app_data_dir().join("screenline.db")
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "screenline_lib=info,screenline=info,tower_http=warn"
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {BIND_ENV} address '{value}': {reason}")]
    InvalidBind { value: String, reason: String },
}

/// Runtime settings for the HTTP server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub db_path: PathBuf,
}

impl ServerConfig {
    /// Read `SCREENLINE_BIND` and `SCREENLINE_DB`, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_values(
            std::env::var(BIND_ENV).ok().as_deref(),
            std::env::var_os(DB_ENV).map(PathBuf::from),
        )
    }

    fn from_values(bind: Option<&str>, db_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let raw = bind.unwrap_or(DEFAULT_BIND);
        let bind = raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::InvalidBind {
            value: raw.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            bind,
            db_path: db_path.unwrap_or_else(database_path),
        })
    }
}
