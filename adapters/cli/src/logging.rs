//! Minimal stderr backend for the `log` facade.

use std::io::Write;

use anyhow::{Context, Result};
use log::{Level, LevelFilter, Log, Metadata, Record};

/// Maps the number of `-v` flags onto a level filter.
pub(crate) fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs the stderr logger as the global `log` backend.
pub(crate) fn init(verbosity: u8) -> Result<()> {
    let level = level_for(verbosity);
    log::set_boxed_logger(Box::new(StderrLogger { level }))
        .context("a logger was already installed")?;
    log::set_max_level(level);
    Ok(())
}

struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let tag = match record.level() {
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Trace => "trace",
        };
        let mut stderr = std::io::stderr().lock();
        // A closed stderr leaves nowhere to report the failure.
        let _ = writeln!(stderr, "[{tag} {}] {}", record.target(), record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}
