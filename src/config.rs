//! Configuration file support
//!
//! `.gconvert.toml`, every key optional:
//!
//! ```toml
//! [filename]
//! encoding = "auto"        # or a charset name such as "EUC-JP"
//!
//! [logging]
//! level = "info"
//! json = false
//! spans = false
//! file = "gconvert.log"
//! ```

use crate::transcode::FilenameCodec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up by `Config::discover`
pub const CONFIG_FILE_NAME: &str = ".gconvert.toml";

/// Value of `filename.encoding` that means "detect from the platform"
pub const AUTO_ENCODING: &str = "auto";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub filename: FilenameConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilenameConfig {
    /// `auto`, or a charset name overriding detection
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default = "default_false")]
    pub json: bool,

    #[serde(default = "default_false")]
    pub spans: bool,

    #[serde(default)]
    pub file: Option<String>,

    /// Record `perf::track` durations
    #[serde(default = "default_false")]
    pub performance: bool,
}

impl Default for FilenameConfig {
    fn default() -> Self {
        Self {
            encoding: default_encoding(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
            spans: false,
            file: None,
            performance: false,
        }
    }
}

fn default_encoding() -> String { AUTO_ENCODING.to_string() }
fn default_level() -> String { "info".to_string() }
fn default_false() -> bool { false }

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Find `.gconvert.toml` in `start` or its ancestors
    pub fn find_from(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Configuration for the current directory, or defaults when none is
    /// found or it fails to load
    pub fn discover() -> Self {
        let Ok(cwd) = std::env::current_dir() else {
            return Self::default();
        };
        match Self::find_from(&cwd) {
            Some(path) => Self::load(&path).unwrap_or_else(|err| {
                tracing::warn!(event = "config_error", error = %err, "Ignoring config file");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// Resolve the filename codec: detect, or use the configured charset
    pub fn filename_codec(&self) -> FilenameCodec {
        if self.filename.encoding.eq_ignore_ascii_case(AUTO_ENCODING) {
            FilenameCodec::detect()
        } else {
            FilenameCodec::from_name(&self.filename.encoding)
        }
    }
}
