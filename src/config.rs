/// Layered runtime configuration
///
/// Settings resolve in three layers: compiled defaults, then an optional
/// `vicmon.toml` file, then environment variables (loaded via dotenv in the
/// binary). Environment names match the original deployment (`POLL_INTERVAL`,
/// `OUTPUT_FORMAT`, `WEBHOOK_URL`) so existing .env files keep working.
///
/// # Env injection
/// `from_sources` takes the environment as a lookup closure rather than
/// reading `std::env` directly. Env-var tests stay deterministic under the
/// parallel test runner without any set_var juggling.
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::report::OutputFormat;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Public VIC Emergency incident feed.
pub const DEFAULT_API_URL: &str = "https://data.emergency.vic.gov.au/Show?pageId=getIncidentJSON";

/// Seconds between scheduled poll cycles.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3600;

/// HTTP request timeout in seconds, shared by the feed client and webhook.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where the previous snapshot is persisted between cycles.
pub const DEFAULT_STATE_FILE: &str = "data/state.json";

/// Config file probed when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "vicmon.toml";

/// Sent with every outbound request. Nominatim in particular requires a
/// real identifying agent.
pub const USER_AGENT: &str = "vicmon-service/0.1 (emergency incident monitor)";

// ---------------------------------------------------------------------------
// Config type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub output_format: OutputFormat,
    pub webhook_url: Option<String>,
    pub state_file: PathBuf,
    /// Whether the geocoder may call Nominatim for unresolved coordinates.
    /// Off means registry-only resolution, no network during geocoding.
    pub geocode_online: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            output_format: OutputFormat::Table,
            webhook_url: None,
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            geocode_online: true,
        }
    }
}

/// Shape of `vicmon.toml`. Every key optional; missing keys keep the layer
/// below.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_url: Option<String>,
    poll_interval: Option<u64>,
    request_timeout: Option<u64>,
    output_format: Option<String>,
    webhook_url: Option<String>,
    state_file: Option<String>,
    geocode_online: Option<bool>,
}

impl Config {
    /// Resolve configuration from explicit sources. Pure; no filesystem or
    /// process environment access.
    pub fn from_sources(
        file_text: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Config, ConfigError> {
        let mut config = Config::default();

        if let Some(text) = file_text {
            let file: FileConfig = toml::from_str(text)
                .map_err(|e| ConfigError::Parse(format!("invalid config file: {}", e)))?;
            config.apply_file(file)?;
        }

        config.apply_env(&env)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve configuration the way the binary does: read `config_path` if
    /// given (an explicit path must exist), otherwise probe `vicmon.toml`,
    /// then layer the real process environment on top.
    pub fn load(config_path: Option<&Path>) -> Result<Config, ConfigError> {
        let file_text = match config_path {
            Some(path) => Some(std::fs::read_to_string(path).map_err(|e| {
                ConfigError::Io(format!("cannot read config file {}: {}", path.display(), e))
            })?),
            None => std::fs::read_to_string(DEFAULT_CONFIG_FILE).ok(),
        };

        Config::from_sources(file_text.as_deref(), |name| std::env::var(name).ok())
    }

    fn apply_file(&mut self, file: FileConfig) -> Result<(), ConfigError> {
        if let Some(url) = file.api_url {
            self.api_url = url;
        }
        if let Some(secs) = file.poll_interval {
            self.poll_interval_secs = secs;
        }
        if let Some(secs) = file.request_timeout {
            self.request_timeout_secs = secs;
        }
        if let Some(name) = file.output_format {
            self.output_format = parse_format(&name)?;
        }
        if let Some(url) = file.webhook_url {
            self.webhook_url = Some(url);
        }
        if let Some(path) = file.state_file {
            self.state_file = PathBuf::from(path);
        }
        if let Some(online) = file.geocode_online {
            self.geocode_online = online;
        }
        Ok(())
    }

    fn apply_env(&mut self, env: &impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(url) = env("API_URL") {
            self.api_url = url;
        }
        if let Some(raw) = env("POLL_INTERVAL") {
            self.poll_interval_secs = raw.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("POLL_INTERVAL must be a number of seconds, got '{}'", raw))
            })?;
        }
        if let Some(name) = env("OUTPUT_FORMAT") {
            self.output_format = parse_format(&name)?;
        }
        if let Some(url) = env("WEBHOOK_URL") {
            if !url.trim().is_empty() {
                self.webhook_url = Some(url);
            }
        }
        if let Some(path) = env("STATE_FILE") {
            self.state_file = PathBuf::from(path);
        }
        if let Some(raw) = env("GEOCODE_ONLINE") {
            self.geocode_online = parse_bool(&raw)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "poll interval must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::Invalid("API URL must not be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_format(name: &str) -> Result<OutputFormat, ConfigError> {
    OutputFormat::from_name(name).ok_or_else(|| {
        ConfigError::Invalid(format!(
            "unknown output format '{}' (expected table, json, or csv)",
            name
        ))
    })
}

fn parse_bool(raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid(format!(
            "expected a boolean (true/false), got '{}'",
            other
        ))),
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Could not read an explicitly requested config file.
    Io(String),
    /// The config file is not valid TOML or has wrong value types.
    Parse(String),
    /// A setting parsed but fails validation.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "{}", msg),
            ConfigError::Parse(msg) => write!(f, "{}", msg),
            ConfigError::Invalid(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
