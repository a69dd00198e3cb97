use std::io;

use chrono::prelude::*;
use colored::*;
use log::{Level, Log, Metadata, Record, SetLoggerError};

/// Writes log records to stdout, and errors to stderr.
struct Logger {
    level: Level,
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let target = if !record.target().is_empty() {
            record.target()
        } else {
            record.module_path().unwrap_or_default()
        };

        if record.level() == Level::Error {
            write(record, target, io::stderr());
        } else {
            write(record, target, io::stdout());
        }
    }

    fn flush(&self) {}
}

fn write(record: &Record, target: &str, mut stream: impl io::Write) {
    let level = match record.level() {
        Level::Error => record.level().to_string().red(),
        Level::Warn => record.level().to_string().yellow(),
        Level::Info => record.level().to_string().green(),
        Level::Debug => record.level().to_string().white(),
        Level::Trace => record.level().to_string().white().dimmed(),
    };

    // Nowhere left to report a failed log write.
    let _ = writeln!(
        stream,
        "{} {:<5} {} {}",
        Local::now()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .white(),
        level,
        target.bold(),
        record.args()
    );
}

pub fn init(level: Level) -> Result<(), SetLoggerError> {
    let logger = Logger { level };

    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(level.to_level_filter());

    Ok(())
}
