//! Rolling Logger
//!
//! A `tracing` subscriber that mirrors every event to stderr and to a log
//! file that only keeps the most recent lines. The file is backed by a
//! circular buffer: once it grows past twice the buffer size it is rewritten
//! with the buffered tail, so it never grows without bound.
//!
//! Records emitted through the `log` crate are bridged into the same
//! subscriber.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Lines kept in the ring (and, after compaction, in the file)
pub const DEFAULT_MAX_LINES: usize = 5000;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("failed to prepare log file: {0}")]
    Io(#[from] io::Error),
    #[error("a global logger is already installed")]
    AlreadyInitialized,
    #[error("logger not initialized")]
    NotInitialized,
}

struct LoggerState {
    app_name: String,
    file: RollingHandle,
}

static LOGGER: OnceLock<LoggerState> = OnceLock::new();

/// Install the global subscriber, writing to `<log_dir>/<app_name>.log`.
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> Result<(), LoggerError> {
    init_logger_with_capacity(log_dir, app_name, DEFAULT_MAX_LINES)
}

pub fn init_logger_with_capacity(
    log_dir: impl AsRef<Path>,
    app_name: &str,
    max_lines: usize,
) -> Result<(), LoggerError> {
    if LOGGER.get().is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }

    let log_dir = log_dir.as_ref();
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join(format!("{}.log", app_name));
    let handle = RollingHandle::new(RollingFile::open(path, max_lines)?);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(LocalTime)
                .with_writer(io::stderr),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(LocalTime)
                .with_ansi(false)
                .with_writer(handle.clone()),
        )
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    LOGGER
        .set(LoggerState {
            app_name: app_name.to_string(),
            file: handle,
        })
        .map_err(|_| LoggerError::AlreadyInitialized)
}

pub fn info(msg: &str) -> Result<(), LoggerError> {
    let state = LOGGER.get().ok_or(LoggerError::NotInitialized)?;
    log::info!(target: state.app_name.as_str(), "{}", msg);
    Ok(())
}

pub fn warn(msg: &str) -> Result<(), LoggerError> {
    let state = LOGGER.get().ok_or(LoggerError::NotInitialized)?;
    log::warn!(target: state.app_name.as_str(), "{}", msg);
    Ok(())
}

pub fn error(msg: &str) -> Result<(), LoggerError> {
    let state = LOGGER.get().ok_or(LoggerError::NotInitialized)?;
    log::error!(target: state.app_name.as_str(), "{}", msg);
    Ok(())
}

/// Most recent lines written to the log file (oldest first)
pub fn recent_lines() -> Result<Vec<String>, LoggerError> {
    let state = LOGGER.get().ok_or(LoggerError::NotInitialized)?;
    Ok(state.file.lines())
}

struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Append-only log file with a bounded in-memory tail
pub struct RollingFile {
    path: PathBuf,
    file: File,
    max_lines: usize,
    lines: VecDeque<String>,
    partial: String,
    file_lines: usize,
}

impl RollingFile {
    /// Open (or create) the file, keeping at most `max_lines` of its existing tail.
    pub fn open(path: impl Into<PathBuf>, max_lines: usize) -> io::Result<Self> {
        let path = path.into();
        let max_lines = max_lines.max(1);

        let existing = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e),
        };
        let all: Vec<&str> = existing.lines().collect();
        let skip = all.len().saturating_sub(max_lines);
        let lines: VecDeque<String> = all[skip..].iter().map(|l| l.to_string()).collect();

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut rolling = Self {
            path,
            file,
            max_lines,
            lines,
            partial: String::new(),
            file_lines: all.len(),
        };
        if skip > 0 {
            rolling.compact()?;
        }
        Ok(rolling)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.partial.push_str(s);
        while let Some(pos) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=pos).collect();
            self.push_line(line.trim_end_matches(['\n', '\r']).to_string())?;
        }
        Ok(())
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }

    fn push_line(&mut self, line: String) -> io::Result<()> {
        writeln!(self.file, "{}", line)?;
        self.file_lines += 1;

        self.lines.push_back(line);
        if self.lines.len() > self.max_lines {
            self.lines.pop_front();
        }

        if self.file_lines > self.max_lines * 2 {
            self.compact()?;
        }
        Ok(())
    }

    /// Rewrite the file with only the buffered tail
    fn compact(&mut self) -> io::Result<()> {
        let mut content = String::new();
        for line in &self.lines {
            content.push_str(line);
            content.push('\n');
        }
        fs::write(&self.path, content)?;
        self.file = OpenOptions::new().append(true).open(&self.path)?;
        self.file_lines = self.lines.len();
        Ok(())
    }
}

/// Shared writer handed to `tracing_subscriber`
#[derive(Clone)]
pub struct RollingHandle {
    inner: Arc<Mutex<RollingFile>>,
}

impl RollingHandle {
    pub fn new(file: RollingFile) -> Self {
        Self {
            inner: Arc::new(Mutex::new(file)),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        match self.inner.lock() {
            Ok(guard) => guard.lines(),
            Err(poisoned) => poisoned.into_inner().lines(),
        }
    }
}

impl Write for RollingHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;
        guard.write_str(&text)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;
        guard.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RollingHandle {
    type Writer = RollingHandle;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_split_across_writes() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = RollingFile::open(dir.path().join("app.log"), 10).unwrap();

        file.write_str("first ").unwrap();
        file.write_str("line\nsecond line\nthird").unwrap();

        assert_eq!(file.lines(), vec!["first line", "second line"]);
    }

    #[test]
    fn test_ring_keeps_only_recent_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let mut file = RollingFile::open(&path, 3).unwrap();

        for i in 0..10 {
            file.write_str(&format!("line {}\n", i)).unwrap();
        }

        assert_eq!(file.lines(), vec!["line 7", "line 8", "line 9"]);
        let on_disk = fs::read_to_string(&path).unwrap();
        assert!(on_disk.lines().count() <= 6);
        assert!(on_disk.ends_with("line 9\n"));
    }

    #[test]
    fn test_reopen_trims_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let content: String = (0..20).map(|i| format!("old {}\n", i)).collect();
        fs::write(&path, content).unwrap();

        let file = RollingFile::open(&path, 5).unwrap();

        assert_eq!(file.lines().first().map(String::as_str), Some("old 15"));
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 5);
    }

    #[test]
    fn test_handle_writes_through() {
        let dir = tempfile::tempdir().unwrap();
        let mut handle = RollingHandle::new(RollingFile::open(dir.path().join("a.log"), 4).unwrap());

        handle.write_all(b"hello\n").unwrap();
        handle.flush().unwrap();

        assert_eq!(handle.lines(), vec!["hello"]);
    }

    #[test]
    fn test_helpers_require_init() {
        if LOGGER.get().is_none() {
            assert!(matches!(info("x"), Err(LoggerError::NotInitialized)));
        }
    }
}
