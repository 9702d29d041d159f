use std::io;

use tracing::Subscriber;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::sink::SINK_TARGET;
use crate::writer::WORKER_TARGET;
use crate::{DiagnosticsConfig, Error, FileLogger, Result};

/// Buffers one formatted `tracing` event and hands it to a [`FileLogger`]
/// as a single entry when dropped.
pub struct EntryWriter {
    logger: FileLogger,
    buf: Vec<u8>,
}

impl EntryWriter {
    fn new(logger: FileLogger) -> Self {
        Self {
            logger,
            buf: Vec::new(),
        }
    }
}

impl io::Write for EntryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for EntryWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let text = String::from_utf8_lossy(&self.buf);
        self.logger.log(text.trim_end_matches(['\r', '\n']));
    }
}

impl<'a> MakeWriter<'a> for FileLogger {
    type Writer = EntryWriter;

    fn make_writer(&'a self) -> Self::Writer {
        EntryWriter::new(self.clone())
    }
}

/// Initialize diagnostics with the given configuration and optional CLI
/// verbosity override.
///
/// With `file` set, events are also written through that logger (each event
/// becomes one entry). The logger's own events are kept out of its files.
pub fn init_logging(
    config: &DiagnosticsConfig,
    cli_verbose: Option<u8>,
    file: Option<FileLogger>,
) -> Result<()> {
    let log_spec = effective_log_spec(config, cli_verbose);

    let env_filter = EnvFilter::try_new(&log_spec).map_err(|e| Error::Init(e.to_string()))?;

    let console = config.console.then(|| console_layer(config));
    let file = file.map(|logger| file_layer(config, logger));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| Error::Init(e.to_string()))?;

    Ok(())
}

/// Stderr layer in text or JSON.
fn console_layer<S>(config: &DiagnosticsConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    let fmt_layer_builder = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    if config.format == "json" {
        fmt_layer_builder.json().boxed()
    } else {
        fmt_layer_builder.boxed()
    }
}

/// Layer writing events through `logger`, which adds its own timestamp.
pub fn file_layer<S>(config: &DiagnosticsConfig, logger: FileLogger) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    let fmt_layer_builder = tracing_subscriber::fmt::layer()
        .with_writer(logger)
        .with_ansi(false)
        .without_time();

    let layer = if config.format == "json" {
        fmt_layer_builder.json().boxed()
    } else {
        fmt_layer_builder.boxed()
    };

    // Events raised by the worker must not be queued back into it.
    layer
        .with_filter(filter_fn(|meta| {
            meta.target() != SINK_TARGET && meta.target() != WORKER_TARGET
        }))
        .boxed()
}

/// Determine the effective log specification, considering config and CLI overrides.
fn effective_log_spec(config: &DiagnosticsConfig, cli_verbose: Option<u8>) -> String {
    // RUST_LOG takes precedence over everything
    if let Ok(rust_log) = std::env::var("RUST_LOG")
        && !rust_log.is_empty()
    {
        return rust_log;
    }

    // CLI verbose flag overrides config level
    if let Some(verbose) = cli_verbose {
        return match verbose {
            0 => config.level.clone(),
            1 => format!("{},rotalog=debug", config.level),
            2 => format!("{},rotalog=trace", config.level),
            _ => "trace".to_string(),
        };
    }

    // Use config level with crate-specific override
    if config.level.is_empty() {
        "info,rotalog=info".to_string()
    } else {
        format!("{},rotalog={}", config.level, config.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use time::macros::datetime;

    // Tests touching RUST_LOG must not interleave.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    fn with_rust_log<T>(value: Option<&str>, f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let prev = std::env::var_os("RUST_LOG");
        unsafe {
            match value {
                Some(v) => std::env::set_var("RUST_LOG", v),
                None => std::env::remove_var("RUST_LOG"),
            }
        }
        let result = f();
        unsafe {
            match prev {
                Some(v) => std::env::set_var("RUST_LOG", v),
                None => std::env::remove_var("RUST_LOG"),
            }
        }
        result
    }

    #[test]
    fn rust_log_overrides_config_level() {
        let cfg = DiagnosticsConfig::new().with_level("info");
        let spec = with_rust_log(Some("trace"), || effective_log_spec(&cfg, Some(2)));
        assert_eq!(spec, "trace");
    }

    #[test]
    fn cfg_level_used_when_no_rust_log() {
        let cfg = DiagnosticsConfig::new().with_level("warn");
        with_rust_log(Some(""), || {
            assert_eq!(effective_log_spec(&cfg, None), "warn,rotalog=warn");
            assert_eq!(effective_log_spec(&cfg, Some(0)), "warn");
            assert_eq!(effective_log_spec(&cfg, Some(1)), "warn,rotalog=debug");
            assert_eq!(effective_log_spec(&cfg, Some(2)), "warn,rotalog=trace");
            assert_eq!(effective_log_spec(&cfg, Some(3)), "trace");
        });
    }

    #[test]
    fn test_effective_log_spec_with_empty_config_level() {
        let cfg = DiagnosticsConfig::new().with_level("");
        let spec = with_rust_log(None, || effective_log_spec(&cfg, None));
        assert_eq!(spec, "info,rotalog=info");
    }

    #[test]
    fn test_init_logging_console_only() {
        let cfg = DiagnosticsConfig::new().with_console(true);
        let result = init_logging(&cfg, None, None);
        // May fail if already initialized, but shouldn't panic
        assert!(result.is_ok() || matches!(result, Err(Error::Init(_))));
    }

    #[test]
    fn test_file_layer_writes_entries() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let logger = crate::builder()
            .with_directory(tmp.path())
            .with_clock(ManualClock::new(datetime!(2024-03-15 10:00 UTC)))
            .build()
            .expect("logger");

        let cfg = DiagnosticsConfig::new();
        let subscriber = tracing_subscriber::registry().with(file_layer(&cfg, logger.clone()));
        let dispatch = tracing::Dispatch::new(subscriber);

        tracing::dispatcher::with_default(&dispatch, || {
            tracing::info!(user = "alice", "User logged in");
            tracing::error!(target: SINK_TARGET, "should stay out of the file");
            tracing::debug!(target: WORKER_TARGET, "worker noise");
        });
        logger.flush();

        let content = std::fs::read_to_string(tmp.path().join("app-20240315.log")).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 1, "content: {:?}", content);
        assert!(lines[0].starts_with("[2024-03-15T10:00:00.000Z] "));
        assert!(lines[0].contains("User logged in"));
        assert!(lines[0].contains("user=\"alice\""));
        assert!(!content.contains('\x1b'), "ANSI escape found in log file");
    }

    #[test]
    fn test_file_layer_json() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let logger = crate::builder()
            .with_directory(tmp.path())
            .with_clock(ManualClock::new(datetime!(2024-03-15 10:00 UTC)))
            .build()
            .expect("logger");

        let cfg = DiagnosticsConfig::new().with_format("json");
        let subscriber = tracing_subscriber::registry().with(file_layer(&cfg, logger.clone()));
        let dispatch = tracing::Dispatch::new(subscriber);

        tracing::dispatcher::with_default(&dispatch, || {
            tracing::warn!("disk almost full");
        });
        logger.flush();

        let content = std::fs::read_to_string(tmp.path().join("app-20240315.log")).unwrap();
        let line = content.lines().next().expect("one entry");
        let payload = line
            .strip_prefix("[2024-03-15T10:00:00.000Z] ")
            .expect("entry prefix");
        assert!(payload.starts_with('{') && payload.ends_with('}'));
        assert!(payload.contains("disk almost full"));
    }
}
