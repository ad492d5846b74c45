use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Prints records to stderr, prefixed with local time and level.
pub struct Logger {
    level: LevelFilter,
}

impl Logger {
    pub fn new(verbose: bool) -> Self {
        let level = match verbose {
            true => LevelFilter::Debug,
            false => LevelFilter::Info,
        };
        Self { level }
    }

    pub fn install(self) -> Result<(), SetLoggerError> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(level);
        Ok(())
    }

    fn format(&self, record: &Record) -> String {
        let time = chrono::Local::now().format("%H:%M:%S");
        match record.level() {
            // engine output is forwarded as is
            Level::Info | Level::Warn if record.target() == super::engine::ENGINE_LOG_TARGET => {
                format!("{} [{}] {}", time, record.target(), record.args())
            }
            level => format!("{} {} - {}", time, level, record.args()),
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{}", self.format(record));
        }
    }

    fn flush(&self) {}
}
