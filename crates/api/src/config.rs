use chrono::NaiveDateTime;
use rollcall_core::types::Timestamp;

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
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Offset from UTC, in minutes, of the wall clock the schedule is
    /// written against (default: `0`).
    pub utc_offset_minutes: i32,
    /// Interval between background session sweeps in seconds (default: `60`).
    pub sweep_interval_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default     |
    /// |------------------------|-------------|
    /// | `HOST`                 | `0.0.0.0`   |
    /// | `PORT`                 | `3000`      |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`        |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`        |
    /// | `UTC_OFFSET_MINUTES`   | `0`         |
    /// | `SWEEP_INTERVAL_SECS`  | `60`        |
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

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let utc_offset_minutes: i32 = std::env::var("UTC_OFFSET_MINUTES")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .expect("UTC_OFFSET_MINUTES must be a valid i32");

        let sweep_interval_secs: u64 = std::env::var("SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("SWEEP_INTERVAL_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            utc_offset_minutes,
            sweep_interval_secs,
        }
    }

    /// Convert a UTC instant to the schedule's wall clock.
    ///
    /// All window math in the core runs on this wall clock; the offset is
    /// fixed configuration, deliberately simpler than full tz handling.
    pub fn to_wall(&self, ts: Timestamp) -> NaiveDateTime {
        (ts + chrono::Duration::minutes(self.utc_offset_minutes as i64)).naive_utc()
    }
}
