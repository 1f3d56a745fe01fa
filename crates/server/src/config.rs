//! Server configuration.

use std::path::PathBuf;

/// Origins the bundled web client is served from during development.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "https://projectsevendays.netlify.app",
    "http://localhost:8000",
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:5500",
];

/// Seven server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory holding `users.json` and `tasks.json`
    pub data_dir: PathBuf,
    /// Server name reported by the health route
    pub server_name: String,
    /// Server version
    pub version: String,
    /// Origins accepted on requests that carry one; empty accepts any
    pub allowed_origins: Vec<String>,
    /// Write the sample catalog when the data directory has none
    pub seed_catalog: bool,
}

impl ServerConfig {
    /// Whether a request from `origin` is accepted.
    pub fn allows_origin(&self, origin: &str) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == origin)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: ".seven".into(),
            server_name: "seven".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
            seed_catalog: true,
        }
    }
}
