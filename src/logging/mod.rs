//! Logging infrastructure - structured tracing for conversions
//!
//! Design: Uses `tracing` for structured, contextual logging with:
//! - Configurable level, overridable per module through `RUST_LOG`
//! - Zero-cost when disabled
//! - Console or file output, human-readable or JSON
//!
//! Buffer lifecycle events are logged at trace level; failures at debug, so
//! a binding layer's error path stays quiet unless asked.

use crate::config::LoggingConfig;
use crate::error::MarshalError;
use once_cell::sync::OnceCell;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Global logging state
static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();

/// Whether `perf::track` guards record durations
static TRACK_PERFORMANCE: AtomicBool = AtomicBool::new(false);

/// Keeps the non-blocking file writer flushing for the process lifetime
static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default log level
    pub level: Level,
    /// Log file path; stderr when unset
    pub log_path: Option<String>,
    /// Enable JSON format (vs human-readable)
    pub json_format: bool,
    /// Show span events (enter/exit)
    pub show_spans: bool,
    /// Enable performance tracking
    pub track_performance: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            log_path: None,
            json_format: false,
            show_spans: false,
            track_performance: cfg!(debug_assertions),
        }
    }
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

impl LogConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Apply environment overrides on top of this config
    pub fn with_env(mut self) -> Self {
        // GCONVERT_LOG_LEVEL: trace, debug, info, warn, error
        if let Ok(level) = std::env::var("GCONVERT_LOG_LEVEL") {
            self.level = parse_level(&level);
        }

        // GCONVERT_LOG_FILE: path to log file
        if let Ok(path) = std::env::var("GCONVERT_LOG_FILE") {
            self.log_path = Some(path);
        }

        if std::env::var("GCONVERT_LOG_JSON").is_ok() {
            self.json_format = true;
        }

        if std::env::var("GCONVERT_LOG_SPANS").is_ok() {
            self.show_spans = true;
        }

        // GCONVERT_LOG_PERF: enable performance tracking
        if let Ok(val) = std::env::var("GCONVERT_LOG_PERF") {
            self.track_performance = val == "1" || val.to_lowercase() == "true";
        }

        self
    }

    /// Create high-performance config (minimal logging)
    pub fn performance() -> Self {
        Self {
            level: Level::ERROR,
            log_path: None,
            json_format: false,
            show_spans: false,
            track_performance: false,
        }
    }

    /// Create debug config (verbose logging)
    pub fn debug() -> Self {
        Self {
            level: Level::TRACE,
            log_path: Some("gconvert.log".to_string()),
            json_format: false,
            show_spans: true,
            track_performance: true,
        }
    }
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            level: parse_level(&config.level),
            log_path: config.file.clone(),
            json_format: config.json,
            show_spans: config.spans,
            track_performance: config.performance,
        }
    }
}

/// Initialize logging with configuration from the environment
pub fn init() {
    init_with_config(LogConfig::from_env());
}

/// Initialize logging with custom configuration
///
/// Only the first call has an effect. If the host process already installed
/// a global subscriber, that one is kept.
pub fn init_with_config(config: LogConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        TRACK_PERFORMANCE.store(config.track_performance, Ordering::Relaxed);

        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("gconvert={}", config.level.as_str().to_lowercase()))
        });

        let span_events = if config.show_spans {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let layer: Box<dyn Layer<Registry> + Send + Sync> = match &config.log_path {
            Some(path) => {
                let path = Path::new(path);
                let directory = path.parent().unwrap_or_else(|| Path::new("."));
                let file_name = path
                    .file_name()
                    .map(|name| name.to_os_string())
                    .unwrap_or_else(|| "gconvert.log".into());
                let appender = tracing_appender::rolling::never(directory, file_name);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let _ = FILE_GUARD.set(guard);

                let base = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_span_events(span_events)
                    .with_target(true);
                if config.json_format {
                    base.json().boxed()
                } else {
                    base.boxed()
                }
            }
            None => {
                let base = fmt::layer()
                    .with_writer(io::stderr)
                    .with_span_events(span_events)
                    .with_target(true)
                    .with_thread_ids(cfg!(debug_assertions))
                    .with_line_number(cfg!(debug_assertions));
                if config.json_format {
                    base.json().boxed()
                } else {
                    base.boxed()
                }
            }
        };

        let _ = tracing_subscriber::registry()
            .with(layer)
            .with(env_filter)
            .try_init();
    });
}

/// Check if logging is initialized
pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.get().is_some()
}

// ============================================================================
// Conversion-specific logging functions
// ============================================================================

/// Log native block allocation
#[inline]
pub fn log_allocation(size: usize, ptr: *const u8) {
    use tracing::trace;
    trace!(
        event = "allocation",
        size_bytes = size,
        address = ?ptr,
        "Native block allocated"
    );
}

/// Log native block release
#[inline]
pub fn log_deallocation(ptr: *const u8) {
    use tracing::trace;
    trace!(
        event = "deallocation",
        address = ?ptr,
        "Native block released"
    );
}

/// Log buffer allocation at the start of a conversion
#[inline]
pub fn log_buffer_alloc(c_type: &str, len: usize, capacity: usize) {
    use tracing::trace;
    trace!(
        event = "buffer_alloc",
        c_type = c_type,
        len = len,
        capacity = capacity,
        "Native buffer allocated"
    );
}

/// Log release of an owned buffer
#[inline]
pub fn log_buffer_release(c_type: &str, len: usize) {
    use tracing::trace;
    trace!(
        event = "buffer_release",
        c_type = c_type,
        len = len,
        "Native buffer released"
    );
}

/// Log a fill guard releasing an unfinished buffer
#[inline]
pub fn log_fill_unwound(c_type: &str, filled: usize, expected: usize) {
    use tracing::debug;
    debug!(
        event = "fill_unwound",
        c_type = c_type,
        filled = filled,
        expected = expected,
        "Partially filled buffer released"
    );
}

/// Log an element coercion failure
pub fn log_conversion_failed(c_type: &str, index: usize, error: &MarshalError) {
    use tracing::debug;
    debug!(
        event = "conversion_failed",
        c_type = c_type,
        index = index,
        kind = %error.kind(),
        error = %error,
        "Element conversion failed"
    );
}

/// Log a charset transcoding
pub fn log_transcode(from: &str, to: &str, in_bytes: usize, out_bytes: usize) {
    use tracing::trace;
    trace!(
        event = "transcode",
        from = from,
        to = to,
        in_bytes = in_bytes,
        out_bytes = out_bytes,
        "String transcoded"
    );
}

/// Log the filename charset chosen at startup
pub fn log_charset_detected(reported: &str, external: Option<&str>) {
    use tracing::info;
    info!(
        event = "charset_detected",
        reported = reported,
        external = external.unwrap_or("none"),
        "Filename charset resolved"
    );
}

/// Log a charset name that could not be resolved
pub fn log_unknown_charset(name: &str) {
    use tracing::warn;
    warn!(
        event = "unknown_charset",
        name = name,
        "Unknown filename charset, transcoding disabled"
    );
}

/// Log an option hash rejected for unknown keys
pub fn log_options_rejected(unexpected: &str, available: &str) {
    use tracing::debug;
    debug!(
        event = "options_rejected",
        unexpected = unexpected,
        available = available,
        "Option hash has unexpected keys"
    );
}

/// Log library initialization
pub fn log_init(config_source: &str) {
    use tracing::info;
    info!(
        event = "init",
        config = config_source,
        "gconvert initializing"
    );
}

/// Performance tracking utilities
///
/// Guards are inert unless tracking was enabled at initialization.
pub mod perf {
    use super::TRACK_PERFORMANCE;
    use std::sync::atomic::Ordering;
    use std::time::Instant;
    use tracing::debug;

    /// Whether durations are currently recorded
    pub fn is_enabled() -> bool {
        TRACK_PERFORMANCE.load(Ordering::Relaxed)
    }

    /// Turn duration tracking on or off after initialization
    pub fn set_enabled(enabled: bool) {
        TRACK_PERFORMANCE.store(enabled, Ordering::Relaxed);
    }

    /// Track operation duration (returns guard that logs on drop)
    #[must_use]
    pub fn track(operation: &str) -> PerformanceGuard {
        PerformanceGuard {
            operation: operation.to_string(),
            start: is_enabled().then(Instant::now),
        }
    }

    pub struct PerformanceGuard {
        operation: String,
        start: Option<Instant>,
    }

    impl PerformanceGuard {
        /// Whether this guard logs when dropped
        pub fn is_active(&self) -> bool {
            self.start.is_some()
        }
    }

    impl Drop for PerformanceGuard {
        fn drop(&mut self) {
            if let Some(start) = self.start {
                debug!(
                    operation = %self.operation,
                    duration_us = start.elapsed().as_micros() as u64,
                    "operation completed"
                );
            }
        }
    }
}
