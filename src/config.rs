use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, Result, Rotation};

/// Default size threshold for mid-period rollover (10 MiB).
pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Default number of files kept by retention.
pub const DEFAULT_MAX_FILES: usize = 30;

/// Parse a size string with optional units (K/M/G, case-insensitive), defaulting to bytes if no unit.
fn parse_size(s: &str) -> std::result::Result<u64, String> {
    let s = s.trim();
    let Some(last) = s.chars().last() else {
        return Err("empty size string".to_string());
    };

    let (num_str, multiplier) = if last.is_alphabetic() {
        let multiplier = match last.to_ascii_uppercase() {
            'K' => 1024,
            'M' => 1024 * 1024,
            'G' => 1024 * 1024 * 1024,
            unit => return Err(format!("invalid unit: {}, supported: K/M/G", unit)),
        };
        (&s[..s.len() - last.len_utf8()], multiplier)
    } else {
        (s, 1)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("invalid number: {}", num_str))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| "size too large".to_string())
}

/// Size value that can be a number or string with units.
#[derive(Deserialize)]
#[serde(untagged)]
enum SizeValue {
    Number(u64),
    String(String),
}

fn deserialize_size<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match SizeValue::deserialize(deserializer)? {
        SizeValue::Number(n) => Ok(n),
        SizeValue::String(s) => parse_size(&s).map_err(serde::de::Error::custom),
    }
}

/// Configuration of one file logger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Folder for log files, created recursively if absent
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    /// File name prefix
    #[serde(default = "default_base_name")]
    pub base_name: String,
    /// Calendar rotation granularity
    #[serde(default)]
    pub rotation: Rotation,
    /// Files kept by retention, the current one included (0 keeps everything)
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Size after which the current file rolls over within its period.
    /// A number of bytes or a string with a K/M/G unit, e.g. "5M".
    #[serde(default = "default_max_bytes", deserialize_with = "deserialize_size")]
    pub max_bytes: u64,
}

impl LoggerConfig {
    /// Create a new LoggerConfig with defaults
    pub fn new() -> Self {
        Self {
            directory: default_directory(),
            base_name: default_base_name(),
            rotation: Rotation::default(),
            max_files: DEFAULT_MAX_FILES,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }

    /// Set the log directory
    pub fn with_directory<P: Into<PathBuf>>(mut self, directory: P) -> Self {
        self.directory = directory.into();
        self
    }

    /// Set the file name prefix
    pub fn with_base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = base_name.into();
        self
    }

    /// Set the rotation granularity
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the retention count
    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    /// Set the size rollover threshold
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Check that the configuration names a usable file prefix.
    pub fn validate(&self) -> Result<()> {
        if self.base_name.trim().is_empty() {
            return Err(Error::Config("base_name must not be empty".to_string()));
        }
        if self.base_name.contains(['/', '\\']) || Path::new(&self.base_name).is_absolute() {
            return Err(Error::Config(format!(
                "base_name must be a plain file name prefix, got {:?}",
                self.base_name
            )));
        }
        Ok(())
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_base_name() -> String {
    "app".to_string()
}

fn default_max_files() -> usize {
    DEFAULT_MAX_FILES
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_BYTES
}

/// Configuration of the diagnostic output (where logger failures and the
/// library's own events go)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// Print diagnostics to stderr
    #[serde(default = "default_console")]
    pub console: bool,
    /// Log level (e.g., "info", "debug")
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format ("text" or "json")
    #[serde(default = "default_format")]
    pub format: String,
}

impl DiagnosticsConfig {
    /// Create a new DiagnosticsConfig with defaults
    pub fn new() -> Self {
        Self {
            console: default_console(),
            level: default_log_level(),
            format: default_format(),
        }
    }

    /// Enable console output
    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    /// Set log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Set output format
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_console() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}
