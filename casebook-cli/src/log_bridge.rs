//! Logger setup: env_logger filtering and stderr output, with every record
//! also appended to a log file under the config directory.

use env_logger::Logger;
use log::{Log, Metadata, Record, SetLoggerError};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

struct LogFile {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl LogFile {
    fn new(path: PathBuf) -> Self {
        let file = Self::open(&path).ok();
        Self {
            path,
            file: Mutex::new(file),
        }
    }

    fn open(path: &Path) -> io::Result<File> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(path)
    }

    fn append_line(&self, line: &str) {
        let mut guard = match self.file.lock() {
            Ok(guard) => guard,
            Err(_) => return,
        };
        if guard.is_none() {
            match Self::open(&self.path) {
                Ok(file) => *guard = Some(file),
                Err(_) => return,
            }
        }
        if let Some(file) = guard.as_mut() {
            let _ = file.write_all(line.as_bytes());
            let _ = file.write_all(b"\n");
            let _ = file.flush();
        }
    }
}

fn format_log_line(record: &Record<'_>) -> String {
    format!(
        "{} [{}] [{}] {}",
        chrono::Utc::now().timestamp_millis(),
        record.level(),
        record.target(),
        record.args().to_string().replace('\n', "\\n")
    )
}

struct TeeLogger {
    inner: Logger,
    file: Option<LogFile>,
}

impl Log for TeeLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        if !self.inner.matches(record) {
            return;
        }
        self.inner.log(record);
        if let Some(file) = &self.file {
            file.append_line(&format_log_line(record));
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Default log file: ~/.config/casebook/logs/casebook.log
pub fn default_log_path() -> PathBuf {
    crate::config::config_dir().join("logs").join("casebook.log")
}

/// Install the logger. `RUST_LOG` overrides the default filter.
/// `log_file` of None disables the file copy.
pub fn init(default_filter: &str, log_file: Option<PathBuf>) -> Result<(), SetLoggerError> {
    let inner =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
            .build();
    let max_level = inner.filter();
    let logger = Box::leak(Box::new(TeeLogger {
        inner,
        file: log_file.map(LogFile::new),
    }));
    log::set_logger(logger)?;
    log::set_max_level(max_level);
    Ok(())
}

/// Last-resort message when the logger itself could not be installed.
pub fn write_fallback_line(message: &str) {
    let _ = writeln!(io::stderr(), "[casebook.log_bridge] {}", message);
}
