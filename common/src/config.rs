//! Environment-driven configuration.
//!
//! Read once at startup; the resulting values are immutable for the life of the
//! process.

use std::collections::HashMap;
use std::str::FromStr;

/// Prefix of the per-selector schema overrides, e.g. `DB_SCHEMA_RESEARCH`.
pub const SCHEMA_OVERRIDE_PREFIX: &str = "DB_SCHEMA_";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DB_HOST: &str = "127.0.0.1";
const DEFAULT_DB_PORT: u16 = 3306;
const DEFAULT_DB_USER: &str = "root";
const DEFAULT_DATABASE: &str = "university";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Name used in logs and health responses.
    pub service_name: String,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// MySQL connection settings.
    pub database: DatabaseConfig,
}

/// MySQL connection settings shared by every selector.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Selector served by the un-prefixed routes.
    pub default_database: String,
    /// Lowercase selector -> physical schema name.
    pub schema_overrides: HashMap<String, String>,
    /// Pool size per selector.
    pub max_connections: u32,
    /// Pool acquire timeout.
    pub connect_timeout_secs: u64,
}

// Hand-written so the password never reaches the logs.
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("default_database", &self.default_database)
            .field("schema_overrides", &self.schema_overrides)
            .field("max_connections", &self.max_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl DatabaseConfig {
    /// Physical schema backing a selector. Falls back to the selector itself.
    pub fn schema_for(&self, selector: &str) -> String {
        self.schema_overrides
            .get(&selector.to_lowercase())
            .cloned()
            .unwrap_or_else(|| selector.to_string())
    }
}

impl AppConfig {
    /// Loads configuration from the process environment.
    pub fn load_with_service(service_name: &str) -> Self {
        Self::from_vars(service_name, std::env::vars())
    }

    /// Builds configuration from an explicit set of variables.
    pub fn from_vars<I>(service_name: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();
        let get = |key: &str| vars.get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let schema_overrides = vars
            .iter()
            .filter_map(|(key, value)| {
                let selector = key.strip_prefix(SCHEMA_OVERRIDE_PREFIX)?;
                let value = value.trim();
                if selector.is_empty() || value.is_empty() {
                    return None;
                }
                Some((selector.to_lowercase(), value.to_string()))
            })
            .collect();

        Self {
            service_name: service_name.to_string(),
            host: get("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse(get("SERVER_PORT")).unwrap_or(DEFAULT_PORT),
            database: DatabaseConfig {
                host: get("DB_HOST").unwrap_or_else(|| DEFAULT_DB_HOST.to_string()),
                port: parse(get("DB_PORT")).unwrap_or(DEFAULT_DB_PORT),
                user: get("DB_USER").unwrap_or_else(|| DEFAULT_DB_USER.to_string()),
                // Passwords may legitimately be empty or padded; taken verbatim.
                password: vars.get("DB_PASSWORD").cloned().unwrap_or_default(),
                default_database: get("DB_NAME")
                    .map(|v| v.to_lowercase())
                    .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
                schema_overrides,
                max_connections: parse(get("DB_MAX_CONNECTIONS"))
                    .unwrap_or(DEFAULT_MAX_CONNECTIONS),
                connect_timeout_secs: parse(get("DB_CONNECT_TIMEOUT_SECS"))
                    .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            },
        }
    }

    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parses an optional raw value; unparsable values count as unset.
fn parse<T: FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|v| v.parse().ok())
}

/// Load `.env` from the working directory (best-effort, no error if missing).
/// Variables already present in the environment win.
pub fn load_dotenv() {
    let Ok(content) = std::fs::read_to_string(".env") else {
        return;
    };
    for (key, value) in parse_dotenv(&content) {
        if std::env::var(&key).is_err() {
            std::env::set_var(key, value);
        }
    }
}

fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}
