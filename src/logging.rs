use std::{
    collections::hash_map::DefaultHasher,
    convert::TryInto,
    fs::File,
    hash::{Hash, Hasher},
    io::Write,
    path::Path,
    sync::Mutex,
    thread,
};

use anyhow::{Context, Result};
use chrono::Local;
use log::{Level, LevelFilter, Metadata, Record};

struct SimpleLogger<W: Write + Sync + Send> {
    level: Option<Level>,
    log_file: Option<Mutex<W>>,
}

impl<W> SimpleLogger<W>
where
    W: Write + Sync + Send,
{
    fn new(level: LevelFilter, log_file: Option<W>) -> Self {
        Self {
            level: level.to_level(),
            log_file: log_file.map(Mutex::new),
        }
    }
}

impl<W> log::Log for SimpleLogger<W>
where
    W: Write + Sync + Send,
{
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.log_file.is_some() || self.level.map_or(false, |level| metadata.level() <= level)
    }

    fn log(&self, record: &Record) {
        if let Some(level) = self.level {
            if record.metadata().level() <= level {
                println!("{}", record.args());
            }
        }
        // the log-file gets every record, regardless of the level
        if let Some(log_file) = &self.log_file {
            let line = format_file_line(record);
            let err = match log_file.lock() {
                Ok(mut log_file) => log_file.write_all(line.as_bytes()),
                Err(_) => return,
            };
            if let Err(err) = err {
                eprintln!("error writing to log-file: {}", err);
            }
        }
    }

    fn flush(&self) {
        if let Some(Ok(mut log_file)) = self.log_file.as_ref().map(Mutex::lock) {
            if let Err(err) = log_file.flush() {
                eprintln!("error flushing log-file: {}", err);
            }
        }
    }
}

fn format_file_line(record: &Record) -> String {
    format!(
        "{} [{}] {:<5} {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        get_pseudo_thread_id(),
        record.level(),
        record.args()
    )
}

/// Initializes the logging feature with the given log-level.
/// If a log-file path is given, every record is also written to that file.
pub fn init(level: LevelFilter, log_file_path: Option<&Path>) -> Result<()> {
    let log_file = match log_file_path {
        Some(path) => Some(File::create(path).context("could not create log file")?),
        None => None,
    };
    let max_level = if log_file.is_some() {
        LevelFilter::Trace
    } else {
        level
    };
    let logger = SimpleLogger::new(level, log_file);
    log::set_boxed_logger(Box::new(logger)).context("could not set logger")?;
    log::set_max_level(max_level);
    Ok(())
}

/// Gets a pseudo thread id that is unrelated to any os specific ID.
/// Only guarantee is that the same thread always gets the same number.
fn get_pseudo_thread_id() -> u32 {
    let mut hasher = DefaultHasher::new();
    thread::current().id().hash(&mut hasher);
    let thread_id = hasher.finish();
    // the upper half of the 64 bit hash always fits
    (thread_id >> 32).try_into().unwrap_or_default()
}
