use log::LevelFilter;
use simple_logger::SimpleLogger;

/// Map the number of `-v` flags to a log level.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

/// Install the stderr logger. Later calls keep the first logger.
pub fn init_logging(verbosity: u8) -> LevelFilter {
    let level = level_for(verbosity);
    let _ = SimpleLogger::new()
        .with_level(level)
        .without_timestamps()
        .init();
    level
}
