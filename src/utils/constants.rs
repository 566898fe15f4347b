//! Process-wide constants.

/// Default location of the configuration file when `--config`/`CONFIG_PATH` are unset.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Default bind address of the health/metrics server.
pub const DEFAULT_HEALTH_ADDRESS: &str = "0.0.0.0:4000";

/// Additional attempts made for each Safe API request after the first one.
pub const SAFE_API_RETRIES: u32 = 3;

/// Delay between the starts of consecutive watchers during reconciliation.
pub const WATCHER_START_STAGGER_MS: u64 = 1000;

/// Period, in seconds, of the retry of watchers that failed to start when
/// configuration reload is disabled.
pub const WATCHER_RETRY_INTERVAL_SECS: u64 = 60;

/// Default Safe web application base URL used to build transaction links.
pub const DEFAULT_SAFE_URL: &str = "https://app.safe.global";

/// Default poll interval, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 20;
