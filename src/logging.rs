/// Structured logging for the incident monitoring service
///
/// Provides context-rich logging with subsystem and incident identifiers,
/// timestamps, and severity levels. Supports both console output
/// and file-based logging for scheduled (daemon) operation.
use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Subsystem Tags
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subsystem {
    Feed,
    Geocode,
    State,
    Webhook,
    System,
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subsystem::Feed => write!(f, "FEED"),
            Subsystem::Geocode => write!(f, "GEO"),
            Subsystem::State => write!(f, "STATE"),
            Subsystem::Webhook => write!(f, "HOOK"),
            Subsystem::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - upstream may be in maintenance or rate limiting
    Expected,
    /// Unexpected failure - indicates service degradation or configuration issue
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        *LOGGER.lock().unwrap() = Some(logger);
    }

    /// Log a message with the global logger
    fn log(&self, level: LogLevel, source: &Subsystem, incident_id: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

        // Format the log entry
        let id_part = incident_id.map(|s| format!(" [{}]", s)).unwrap_or_default();
        let log_entry = format!("{} {} {}{}: {}", timestamp, level, source, id_part, message);

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error => eprintln!("{}", log_entry),
                LogLevel::Warning => eprintln!("   {}", log_entry),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", source, id_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", source, id_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => {} // Skip debug in non-timestamp mode
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

/// Log a general informational message
pub fn info(source: Subsystem, incident_id: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Info, &source, incident_id, message);
    }
}

/// Log a warning message
pub fn warn(source: Subsystem, incident_id: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Warning, &source, incident_id, message);
    }
}

/// Log an error message
pub fn error(source: Subsystem, incident_id: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Error, &source, incident_id, message);
    }
}

/// Log a debug message
pub fn debug(source: Subsystem, incident_id: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Debug, &source, incident_id, message);
    }
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a feed fetch failure based on the error text
pub fn classify_feed_failure(error_message: &str) -> FailureType {
    // Check for known patterns that indicate expected failures

    // 5xx from the feed usually means a temporary upstream outage
    if error_message.contains("HTTP error: 5") {
        FailureType::Unknown
    }
    // Other HTTP errors mean our request is wrong
    else if error_message.contains("HTTP error") {
        FailureType::Unexpected
    }
    // Parse errors suggest the feed schema changed
    else if error_message.contains("Parse error") {
        FailureType::Unexpected
    }
    // Timeouts and connection resets come and go
    else if error_message.contains("timeout") || error_message.contains("timed out") {
        FailureType::Unknown
    } else {
        FailureType::Unknown
    }
}

/// Classify a webhook delivery failure
pub fn classify_webhook_failure(error_message: &str) -> FailureType {
    // 4xx means the configured URL or payload is wrong on our end
    if error_message.contains("HTTP error: 4") {
        FailureType::Unexpected
    } else if error_message.contains("timeout") || error_message.contains("timed out") {
        FailureType::Unknown
    } else {
        FailureType::Unknown
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a feed failure with automatic classification
pub fn log_feed_failure(operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_feed_failure(&error_msg);

    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);

    match failure_type {
        FailureType::Expected => debug(Subsystem::Feed, None, &message),
        FailureType::Unexpected => error(Subsystem::Feed, None, &message),
        FailureType::Unknown => warn(Subsystem::Feed, None, &message),
    }
}

/// Log a webhook delivery failure with classification
pub fn log_webhook_failure(url: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_webhook_failure(&error_msg);

    let message = format!("delivery to {} failed [{}]: {}", url, failure_type, error_msg);

    match failure_type {
        FailureType::Expected => debug(Subsystem::Webhook, None, &message),
        FailureType::Unexpected => error(Subsystem::Webhook, None, &message),
        FailureType::Unknown => warn(Subsystem::Webhook, None, &message),
    }
}

// ---------------------------------------------------------------------------
// Cycle Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of one completed poll cycle
pub fn log_cycle_summary(total: usize, changed: usize, dropped: usize) {
    let message = format!(
        "Cycle complete: {} incidents, {} status changes, {} dropped from feed",
        total, changed, dropped
    );

    if dropped == 0 {
        info(Subsystem::System, None, &message);
    } else {
        warn(Subsystem::System, None, &message);
    }
}
