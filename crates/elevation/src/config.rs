use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.opentopodata.org/v1/srtm30m";
pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_BATCH_DELAY_MS: u64 = 1100;

/// Elevation service settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationConfig {
    pub api_url: String,
    /// Upper bound on points per lookup call.
    pub batch_size: usize,
    /// Pause between consecutive batch calls (rate-limit courtesy).
    pub batch_delay: Duration,
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: Duration::from_millis(DEFAULT_BATCH_DELAY_MS),
        }
    }
}

impl ElevationConfig {
    /// Reads `ELEVATION_API_URL`, `ELEVATION_BATCH_SIZE` and
    /// `ELEVATION_BATCH_DELAY_MS`, falling back to the defaults.
    pub fn from_env() -> Self {
        Self {
            api_url: env::var("ELEVATION_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            batch_size: env_var_usize("ELEVATION_BATCH_SIZE", DEFAULT_BATCH_SIZE).max(1),
            batch_delay: Duration::from_millis(env_var_u64(
                "ELEVATION_BATCH_DELAY_MS",
                DEFAULT_BATCH_DELAY_MS,
            )),
        }
    }
}

fn env_var_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_var_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
