//! # Rotalog
//!
//! A non-blocking append-only file logger with calendar rotation, size
//! rollover and retention.
//!
//! ## Features
//!
//! - `log()` never waits for disk I/O; entries are written in call order by a
//!   dedicated worker thread
//! - Daily, weekly (ISO-8601) or monthly files named `{base}-{YYYYMMDD}.log`
//!   or `{base}-{YYYYMM}.log`
//! - Size rollover within a period to `{base}-{stamp}.{n}.log`
//! - Retention of the newest `max_files` files
//! - Failures reported through `tracing` (or any [`ErrorSink`]), never to the caller
//!
//! ## Example
//!
//! ```rust,no_run
//! use rotalog::{FileLogger, LoggerConfig, Rotation};
//!
//! let logger = FileLogger::new(
//!     LoggerConfig::new()
//!         .with_directory("./logs")
//!         .with_base_name("errors")
//!         .with_rotation(Rotation::Daily),
//! )?;
//!
//! logger.log("Error: Something went wrong");
//! # Ok::<(), rotalog::Error>(())
//! ```

pub mod builder;
pub mod clock;
pub mod config;
pub mod error;
pub mod fs;
pub mod retention;
pub mod rotation;
pub mod sink;
pub mod writer;

#[cfg(feature = "subscriber")]
pub mod tracing_init;

pub use builder::FileLoggerBuilder;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DiagnosticsConfig, LoggerConfig};
pub use error::{Error, Result};
pub use fs::{FileSystem, StdFileSystem};
pub use rotation::{Rotation, file_name_for, iso_week, should_rotate};
pub use sink::{ErrorSink, TracingSink};
pub use writer::FileLogger;

#[cfg(feature = "subscriber")]
pub use tracing_init::init_logging;

/// Create a new [`FileLoggerBuilder`] with default configuration.
pub fn builder() -> FileLoggerBuilder {
    FileLoggerBuilder::new()
}
