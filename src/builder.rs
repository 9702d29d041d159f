//! Builder pattern for starting a file logger.
//!
//! The builder collects a [`LoggerConfig`] plus the three collaborators the
//! worker talks to: the clock, the filesystem and the error sink. Each one
//! defaults to the real thing.
//!
//! # Example
//!
//! ```rust,no_run
//! use rotalog::Rotation;
//!
//! let logger = rotalog::builder()
//!     .with_directory("./data")
//!     .with_base_name("security")
//!     .with_rotation(Rotation::Weekly)
//!     .build()
//!     .expect("Failed to start logger");
//!
//! logger.log("User logged in");
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::fs::{FileSystem, StdFileSystem};
use crate::sink::{ErrorSink, TracingSink};
use crate::{FileLogger, LoggerConfig, Result, Rotation};

/// A builder for configuring and starting a [`FileLogger`].
pub struct FileLoggerBuilder {
    config: LoggerConfig,
    clock: Option<Arc<dyn Clock>>,
    fs: Option<Box<dyn FileSystem>>,
    sink: Option<Arc<dyn ErrorSink>>,
}

impl FileLoggerBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::from_config(LoggerConfig::new())
    }

    /// Create a builder from an existing configuration.
    pub fn from_config(config: LoggerConfig) -> Self {
        Self {
            config,
            clock: None,
            fs: None,
            sink: None,
        }
    }

    /// Set the folder log files are written to.
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.config = self.config.with_directory(directory);
        self
    }

    /// Set the file name prefix.
    pub fn with_base_name(mut self, base_name: impl Into<String>) -> Self {
        self.config = self.config.with_base_name(base_name);
        self
    }

    /// Set the rotation granularity.
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.config = self.config.with_rotation(rotation);
        self
    }

    /// Set how many files retention keeps (0 keeps everything).
    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.config = self.config.with_max_files(max_files);
        self
    }

    /// Set the size after which the current file rolls over.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.config = self.config.with_max_bytes(max_bytes);
        self
    }

    /// Use a custom time source instead of the local wall clock.
    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Use a custom filesystem instead of `std::fs`.
    pub fn with_file_system(mut self, fs: impl FileSystem) -> Self {
        self.fs = Some(Box::new(fs));
        self
    }

    /// Report failures somewhere other than `tracing`.
    pub fn with_error_sink(mut self, sink: impl ErrorSink) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// The configuration collected so far.
    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Start the logger.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - The worker thread cannot be spawned
    pub fn build(self) -> Result<FileLogger> {
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock::local()));
        let fs = self.fs.unwrap_or_else(|| Box::new(StdFileSystem));
        let sink = self.sink.unwrap_or_else(|| Arc::new(TracingSink));
        FileLogger::spawn(self.config, clock, fs, sink)
    }
}

impl Default for FileLoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FileLoggerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileLoggerBuilder")
            .field("config", &self.config)
            .field("custom_clock", &self.clock.is_some())
            .field("custom_file_system", &self.fs.is_some())
            .field("custom_error_sink", &self.sink.is_some())
            .finish()
    }
}
