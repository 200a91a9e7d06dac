/// Settings and configuration management
/// Handles environment variable loading and validation

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Stream Constants
// ============================================================================

/// Default address of the bot's dashboard WebSocket server
pub const DEFAULT_WS_URL: &str = "ws://localhost:8765";

/// Reconnect delay after the first failed cycle
pub const WS_BACKOFF_BASE: Duration = Duration::from_millis(3000);
/// Multiplier applied to the delay after every consecutive failed cycle
pub const WS_BACKOFF_FACTOR: f64 = 1.5;
/// Delay ceiling
pub const WS_BACKOFF_MAX: Duration = Duration::from_millis(30_000);

/// Client-side heartbeat interval; the server answers each ping with a
/// `pong` message
pub const WS_PING_INTERVAL: Duration = Duration::from_secs(30);

// ============================================================================
// View Constants
// ============================================================================

/// The view keeps only the most recent entries; older ones are evicted
pub const MAX_TRADES: usize = 50;
pub const MAX_ACTIONS: usize = 50;

// ============================================================================
// Fallback API Constants
// ============================================================================

pub const DEFAULT_API_PORT: u16 = 8080;
pub const DEFAULT_STATE_FILE: &str = "monitor_state.json";
pub const DEFAULT_ACTIONS_FILE: &str = "actions.json";

// ============================================================================
// Runtime Configuration (loaded from environment)
// ============================================================================

#[derive(Debug, Clone)]
pub struct Config {
    /// WebSocket address of the bot process
    pub ws_url: String,

    /// Fallback endpoints polled once at startup. None disables that fetch.
    pub state_url: Option<String>,
    pub actions_url: Option<String>,

    /// Flat files the bot persists its state into; served by the fallback API
    pub state_file: PathBuf,
    pub actions_file: PathBuf,

    /// HTTP fallback API settings
    pub api_enabled: bool,
    pub api_port: u16,

    /// Reconnect backoff base; overridable so tests don't wait 3 seconds
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            state_url: None,
            actions_url: None,
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            actions_file: PathBuf::from(DEFAULT_ACTIONS_FILE),
            api_enabled: true,
            api_port: DEFAULT_API_PORT,
            backoff_base: WS_BACKOFF_BASE,
            backoff_max: WS_BACKOFF_MAX,
        }
    }
}

impl Config {
    /// Load configuration from environment variables. Everything has a
    /// default; only malformed values are errors.
    pub fn from_env() -> Result<Self> {
        let ws_url = env::var("DASHBOARD_WS_URL").unwrap_or_else(|_| DEFAULT_WS_URL.to_string());

        let api_enabled = match env::var("API_ENABLED") {
            Ok(v) => v
                .parse::<bool>()
                .context("API_ENABLED must be 'true' or 'false'")?,
            Err(_) => true,
        };

        let api_port = match env::var("API_PORT") {
            Ok(v) => v
                .parse::<u16>()
                .context("API_PORT must be a port number (1-65535)")?,
            Err(_) => DEFAULT_API_PORT,
        };

        let state_file = env::var("STATE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATE_FILE));
        let actions_file = env::var("ACTIONS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_ACTIONS_FILE));

        // Default fallback URLs point at our own API server when enabled
        let state_url = env::var("STATE_API_URL").ok().or_else(|| {
            api_enabled.then(|| format!("http://127.0.0.1:{}/api/bot-state", api_port))
        });
        let actions_url = env::var("ACTIONS_API_URL").ok().or_else(|| {
            api_enabled.then(|| format!("http://127.0.0.1:{}/api/actions", api_port))
        });

        Ok(Self {
            ws_url,
            state_url,
            actions_url,
            state_file,
            actions_file,
            api_enabled,
            api_port,
            backoff_base: WS_BACKOFF_BASE,
            backoff_max: WS_BACKOFF_MAX,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.ws_url, "ws://localhost:8765");
        assert_eq!(cfg.backoff_base, Duration::from_millis(3000));
        assert_eq!(cfg.backoff_max, Duration::from_millis(30_000));
        assert_eq!(cfg.api_port, DEFAULT_API_PORT);
        assert!(cfg.state_url.is_none());
    }

    #[test]
    fn test_backoff_constants() {
        assert_eq!(WS_BACKOFF_BASE.as_millis(), 3000);
        assert_eq!(WS_BACKOFF_MAX.as_millis(), 30_000);
        assert!((WS_BACKOFF_FACTOR - 1.5).abs() < f64::EPSILON);
    }
}
