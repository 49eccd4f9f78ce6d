// Environment-driven configuration.

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP listener binds to.
    pub bind_addr: String,

    /// Path of the SQLite database file.
    pub db_path: PathBuf,

    /// Expected bearer token. `None` disables auth (development mode).
    pub api_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            db_path: env::var("DB_PATH")
                .unwrap_or_else(|_| "accounts.db".to_string())
                .into(),
            api_token: env::var("API_TOKEN").ok().filter(|token| !token.is_empty()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "0.0.0.0:3000".to_string(),
            db_path: "accounts.db".into(),
            api_token: None,
        }
    }
}
