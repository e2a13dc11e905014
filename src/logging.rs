use log::{LevelFilter, Metadata, Record};
use std::sync::Mutex;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use chrono::Local;

/// Appends log records to a file, one `timestamp [LEVEL] target: message` line each.
pub struct Logger {
    file: Mutex<std::fs::File>,
    level: LevelFilter,
}

impl Logger {
    pub fn new(log_file: &Path, level: LevelFilter) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)?;

        Ok(Self {
            file: Mutex::new(file),
            level,
        })
    }
}

pub fn format_line(timestamp: &str, record: &Record) -> String {
    format!(
        "{} [{}] {}: {}",
        timestamp,
        record.level(),
        record.target(),
        record.args()
    )
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{}", format_line(&timestamp, record));
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// Installs the file logger as the global logger. Used instead of `env_logger`
/// when the service is started with `--log-file`.
pub fn init(log_file: &Path, level: LevelFilter) -> anyhow::Result<()> {
    let logger = Logger::new(log_file, level)?;
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(level);
    Ok(())
}
