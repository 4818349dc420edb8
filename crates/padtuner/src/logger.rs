use time::{format_description::FormatItem, OffsetDateTime};

pub struct Logger {
    level: log::LevelFilter,
}

impl Logger {
    #[must_use]
    pub fn new(level: log::LevelFilter) -> Self {
        Self { level }
    }

    pub fn init(self) -> Result<(), log::SetLoggerError> {
        log::set_max_level(self.level);
        log::set_boxed_logger(Box::new(self))?;
        Ok(())
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level().to_level_filter() <= self.level
    }

    fn log(&self, record: &log::Record) {
        const TIMESTAMP_FORMAT: &[FormatItem] = time::macros::format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]"
        );

        if self.enabled(record.metadata()) {
            let timestamp = OffsetDateTime::now_local()
                .unwrap_or_else(|_| OffsetDateTime::now_utc())
                .format(&TIMESTAMP_FORMAT)
                .unwrap();

            let target = if !record.target().is_empty() {
                record.target()
            } else {
                record.module_path().unwrap_or_default()
            };

            eprintln!(
                "{} {:5} [{}] {}",
                timestamp,
                record.level(),
                target,
                record.args()
            );
        }
    }

    fn flush(&self) {}
}
