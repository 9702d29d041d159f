use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle, ThreadId};

use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::clock::Clock;
use crate::fs::FileSystem;
use crate::retention;
use crate::rotation::{self, LogFileName};
use crate::sink::ErrorSink;
use crate::{Error, LoggerConfig, Result};

/// Tracing target of the worker's own events.
pub const WORKER_TARGET: &str = "rotalog::worker";

/// Render one log line: `[<ISO-8601 UTC timestamp>] <message>\n`.
pub fn format_entry(at: OffsetDateTime, message: &str) -> Result<String> {
    let timestamp = at.to_offset(UtcOffset::UTC).format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
    ))?;
    Ok(format!("[{}] {}\n", timestamp, message))
}

/// A formatted entry waiting for the worker.
#[derive(Debug)]
struct Entry {
    at: OffsetDateTime,
    line: String,
}

enum Command {
    /// Create the log directory ahead of the first entry.
    Prepare,
    Entry(Entry),
    /// Acknowledged once everything queued before it is done.
    Flush(Sender<()>),
    Shutdown,
}

/// Handle to a non-blocking file logger.
///
/// Every [`log`](FileLogger::log) call is queued to a dedicated worker thread
/// that applies rotation, retention and size rollover before appending, one
/// entry at a time and in call order. Clones share the same worker. Dropping
/// the last handle drains the queue and stops the worker.
#[derive(Clone)]
pub struct FileLogger {
    inner: Arc<Inner>,
}

struct Inner {
    sender: Sender<Command>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn ErrorSink>,
    worker_id: ThreadId,
    worker: Option<JoinHandle<()>>,
}

impl FileLogger {
    /// Start a logger with the system clock, the real filesystem and failures
    /// reported through `tracing`.
    pub fn new(config: LoggerConfig) -> Result<Self> {
        crate::builder::FileLoggerBuilder::from_config(config).build()
    }

    pub(crate) fn spawn(
        config: LoggerConfig,
        clock: Arc<dyn Clock>,
        fs: Box<dyn FileSystem>,
        sink: Arc<dyn ErrorSink>,
    ) -> Result<Self> {
        config.validate()?;

        let state = WriterState::new(&config, clock.now());
        let name = format!("rotalog-{}", config.base_name);
        let worker = Worker {
            config,
            fs,
            sink: Arc::clone(&sink),
            state,
        };

        let (sender, receiver) = mpsc::channel();
        // Directory creation is the first unit of work; nothing waits for it.
        sender
            .send(Command::Prepare)
            .map_err(|_| Error::Init("log queue closed before start".to_string()))?;

        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || worker.run(receiver))
            .map_err(|e| Error::Init(format!("failed to spawn log worker: {}", e)))?;

        Ok(Self {
            inner: Arc::new(Inner {
                sender,
                clock,
                sink,
                worker_id: handle.thread().id(),
                worker: Some(handle),
            }),
        })
    }

    /// Queue `message` for writing and return immediately.
    ///
    /// The timestamp is taken now. Failures are only visible through the
    /// error sink.
    pub fn log(&self, message: impl AsRef<str>) {
        let at = self.inner.clock.now();
        let line = match format_entry(at, message.as_ref()) {
            Ok(line) => line,
            Err(e) => {
                self.inner.sink.report(&e);
                return;
            }
        };

        if self.inner.sender.send(Command::Entry(Entry { at, line })).is_err() {
            self.inner.sink.report(&Error::Closed);
        }
    }

    /// Block until every entry queued before this call has been processed.
    ///
    /// Returns immediately when called from the worker itself (e.g. from an
    /// error sink).
    pub fn flush(&self) {
        if thread::current().id() == self.inner.worker_id {
            return;
        }
        let (ack, done) = mpsc::channel();
        if self.inner.sender.send(Command::Flush(ack)).is_ok() {
            let _ = done.recv();
        }
    }
}

impl fmt::Debug for FileLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileLogger")
            .field("worker", &self.inner.worker_id)
            .finish_non_exhaustive()
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
        let Some(handle) = self.worker.take() else {
            return;
        };
        // The last handle can be released by the worker itself (a sink that
        // logs through tracing into this logger); joining there would deadlock.
        if thread::current().id() == self.worker_id {
            return;
        }
        if handle.join().is_err() {
            self.sink.report(&Error::Closed);
        }
    }
}

/// Rotation cursor, owned by the worker alone.
#[derive(Debug)]
struct WriterState {
    current: LogFileName,
    current_file: PathBuf,
    last_rotation: Option<OffsetDateTime>,
}

impl WriterState {
    fn new(config: &LoggerConfig, now: OffsetDateTime) -> Self {
        let current = LogFileName::for_date(config.rotation, now.date());
        let current_file = config.directory.join(current.render(&config.base_name));
        Self {
            current,
            current_file,
            // Absent until the first entry, which therefore runs retention once.
            last_rotation: None,
        }
    }

    fn switch_to(&mut self, name: LogFileName, config: &LoggerConfig) {
        self.current_file = config.directory.join(name.render(&config.base_name));
        self.current = name;
    }
}

struct Worker {
    config: LoggerConfig,
    fs: Box<dyn FileSystem>,
    sink: Arc<dyn ErrorSink>,
    state: WriterState,
}

impl Worker {
    fn run(mut self, commands: Receiver<Command>) {
        tracing::debug!(
            target: WORKER_TARGET,
            directory = %self.config.directory.display(),
            base_name = %self.config.base_name,
            rotation = ?self.config.rotation,
            "log worker started"
        );

        for command in commands {
            match command {
                Command::Prepare => self.ensure_directory(),
                Command::Entry(entry) => self.write_entry(entry),
                Command::Flush(ack) => {
                    let _ = ack.send(());
                }
                Command::Shutdown => break,
            }
        }

        tracing::debug!(target: WORKER_TARGET, base_name = %self.config.base_name, "log worker stopped");
    }

    fn write_entry(&mut self, entry: Entry) {
        // Producers may queue slightly out of clock order; never decide on a
        // time earlier than the last rotation.
        let now = match self.state.last_rotation {
            Some(last) if last > entry.at => last,
            _ => entry.at,
        };

        if rotation::should_rotate(now, self.state.last_rotation, self.config.rotation) {
            self.rotate(now);
        }

        self.ensure_directory();
        self.roll_if_oversized();

        if let Err(source) = self
            .fs
            .append(&self.state.current_file, entry.line.as_bytes())
        {
            self.sink.report(&Error::Write {
                path: self.state.current_file.clone(),
                source,
            });
        }
    }

    fn rotate(&mut self, now: OffsetDateTime) {
        let name = LogFileName::for_date(self.config.rotation, now.date());
        self.state.last_rotation = Some(now);
        self.state.switch_to(name, &self.config);
        tracing::debug!(target: WORKER_TARGET, file = %self.state.current_file.display(), "rotated log file");

        self.cleanup();
    }

    fn cleanup(&self) {
        let current = self.state.current.render(&self.config.base_name);
        if let Err(e) = retention::enforce(
            self.fs.as_ref(),
            &self.config.directory,
            &self.config.base_name,
            &current,
            self.config.max_files,
        ) {
            self.sink.report(&e);
        }
    }

    fn ensure_directory(&self) {
        if let Err(source) = self.fs.create_dir_all(&self.config.directory) {
            self.sink.report(&Error::DirectoryCreate {
                path: self.config.directory.clone(),
                source,
            });
        }
    }

    /// Move past every file of this period that is already over the limit.
    fn roll_if_oversized(&mut self) {
        loop {
            match self.fs.file_size(&self.state.current_file) {
                Ok(Some(size)) if size > self.config.max_bytes => {
                    let next = self.state.current.next();
                    if next == self.state.current {
                        return;
                    }
                    self.state.switch_to(next, &self.config);
                    tracing::debug!(
                        target: WORKER_TARGET,
                        file = %self.state.current_file.display(),
                        size,
                        max_bytes = self.config.max_bytes,
                        "size limit reached, rolling over"
                    );
                }
                Ok(_) => return,
                Err(source) => {
                    self.sink.report(&Error::SizeProbe {
                        path: self.state.current_file.clone(),
                        source,
                    });
                    return;
                }
            }
        }
    }
}
