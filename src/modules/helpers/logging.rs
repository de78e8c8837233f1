use fern::Dispatch;

pub const LOG_FILE: &str = "laptimes.log";

/// # setup logging
/// log to stdout and to `laptimes.log` at the given level
pub fn setup_logging(level: log::LevelFilter) -> Result<(), fern::InitError> {
    let base_config = fern::Dispatch::new().level(level);

    let format = |out: fern::FormatCallback, message: &std::fmt::Arguments, record: &log::Record| {
        out.finish(format_args!(
            "{} [{}][{}] {}",
            chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
            record.target(),
            record.level(),
            message
        ))
    };

    let stdout_config = Dispatch::new()
        .format(format)
        .chain(std::io::stdout());

    let file_logger_config = Dispatch::new()
        .format(format)
        .chain(fern::log_file(LOG_FILE)?);

    base_config
        .chain(stdout_config)
        .chain(file_logger_config)
        .apply()?;

    Ok(())
}
