use std::env;
use std::path::PathBuf;
use std::time::Duration;
use anyhow::{Context, Result};

/// The default location of the persisted session entries.
pub const DEFAULT_SESSION_FILE: &str = ".ecoedu/session.json";
/// The default roster endpoint template.
pub const DEFAULT_ROSTER_PATH: &str = "/serviceProviders/projects/{project_id}/participants";

/// The application's configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// The root URL of the remote marketplace API, without a trailing slash.
    pub api_base_url: String,
    /// Where persisted session entries are kept.
    pub session_file: PathBuf,
    /// The lifetime of a persisted session in days.
    pub session_duration_days: i64,
    /// Timeout applied to every remote call.
    pub http_timeout: Duration,
    /// Path template used to fetch a project's enrolled participants.
    pub roster_path: String,
}

impl Config {
    /// Creates a `Config` pointing at `api_base_url` with default settings.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            session_duration_days: 7,
            http_timeout: Duration::from_secs(10),
            roster_path: DEFAULT_ROSTER_PATH.to_string(),
        }
    }

    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let api_base_url = env::var("API_BASE_URL")
            .context("API_BASE_URL must be set (e.g. https://api.ecoedu.com)")?;

        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            anyhow::bail!("API_BASE_URL must start with http:// or https://");
        }

        let mut config = Self::new(api_base_url);

        if let Ok(path) = env::var("SESSION_FILE") {
            config.session_file = PathBuf::from(path);
        }

        config.session_duration_days = env::var("SESSION_DURATION_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse()
            .context("Invalid SESSION_DURATION_DAYS")?;

        if config.session_duration_days <= 0 {
            anyhow::bail!("SESSION_DURATION_DAYS must be positive");
        }

        config.http_timeout =
            parse_timeout(&env::var("HTTP_TIMEOUT_SECS").unwrap_or_else(|_| "10".to_string()))?;

        if let Ok(path) = env::var("ROSTER_PATH") {
            if !path.contains("{project_id}") {
                anyhow::bail!("ROSTER_PATH must contain the {{project_id}} placeholder");
            }
            config.roster_path = path;
        }

        Ok(config)
    }

    /// The session lifetime in milliseconds.
    pub fn session_duration_ms(&self) -> i64 {
        self.session_duration_days * 24 * 60 * 60 * 1000
    }
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    let secs: u64 = raw.trim().parse().context("Invalid HTTP_TIMEOUT_SECS")?;
    if secs == 0 {
        anyhow::bail!("HTTP_TIMEOUT_SECS must be positive");
    }
    Ok(Duration::from_secs(secs))
}
