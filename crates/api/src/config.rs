use std::path::PathBuf;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Redis URL for the live run-progress hashes.
    pub redis_url: String,
    /// Root directory for per-run tree cache files.
    pub trees_dir: PathBuf,
    /// Content server used for channels that do not specify their own.
    pub default_content_server: String,
    /// Token required by admin-only endpoints (control broadcast).
    /// When unset, those endpoints reject every caller.
    pub admin_token: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                         |
    /// |--------------------------|---------------------------------|
    /// | `HOST`                   | `0.0.0.0`                       |
    /// | `PORT`                   | `3000`                          |
    /// | `CORS_ORIGINS`           | `http://localhost:5173`         |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                            |
    /// | `REDIS_URL`              | `redis://127.0.0.1:6379`        |
    /// | `TREES_DIR`              | `./trees`                       |
    /// | `DEFAULT_CONTENT_SERVER` | `https://studio.example.com`    |
    /// | `ADMIN_TOKEN`            | (unset)                         |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());

        let trees_dir = PathBuf::from(std::env::var("TREES_DIR").unwrap_or_else(|_| "./trees".into()));

        let default_content_server = std::env::var("DEFAULT_CONTENT_SERVER")
            .unwrap_or_else(|_| "https://studio.example.com".into());

        let admin_token = std::env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            redis_url,
            trees_dir,
            default_content_server,
            admin_token,
        }
    }
}
