use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{SecondsFormat, Utc};
use log::{LevelFilter, Log, Metadata, Record};

const LEVELS: [LevelFilter; 6] = [
    LevelFilter::Off,
    LevelFilter::Error,
    LevelFilter::Warn,
    LevelFilter::Info,
    LevelFilter::Debug,
    LevelFilter::Trace,
];

/// Writes timestamped records to stderr. The level can be changed after
/// the logger has been installed.
struct ConsoleLogger {
    level: AtomicUsize,
}

impl ConsoleLogger {
    const fn new() -> Self {
        Self {
            level: AtomicUsize::new(LevelFilter::Info as usize),
        }
    }

    fn level(&self) -> LevelFilter {
        let idx = self.level.load(Ordering::Relaxed);
        LEVELS[idx.min(LEVELS.len() - 1)]
    }

    fn set_level(&self, level: LevelFilter) {
        self.level.store(level as usize, Ordering::Relaxed);
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            let _ = writeln!(io::stderr(), "{} [{}] {}", now, record.level(), record.args());
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

static LOGGER: ConsoleLogger = ConsoleLogger::new();

pub fn init_logger(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(LevelFilter::Trace);
    set_log_level(level);
    Ok(())
}

pub fn set_log_level(level: LevelFilter) {
    LOGGER.set_level(level);
}
