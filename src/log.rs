//! The `log` module provides initialisation and configuration of the application's logging
//! system.
//!
//! Logging is set up with the usual levels (error, warn, info, debug, trace) and optional
//! colourisation based on terminal support. The level can come from the settings file or be
//! overridden with the `FLOWPLAN_LOG_LEVEL` environment variable.
use anyhow::{Result, bail};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};
use std::env;
use std::fmt::{Arguments, Display};
use std::io::IsTerminal;

/// The default log level for the program.
///
/// Used as a fallback if the user hasn't specified something else with the FLOWPLAN_LOG_LEVEL
/// environment variable or the settings.toml file.
const DEFAULT_LOG_LEVEL: &str = "info";

/// Initialise the program logger with colourised output where the terminal supports it.
///
/// The log level comes from `settings.toml` (defaulting to `info`) or the `FLOWPLAN_LOG_LEVEL`
/// environment variable; if both are provided, the environment variable takes precedence.
/// Possible levels are `off`, `error`, `warn`, `info`, `debug` and `trace`.
///
/// Fails if the level is not recognised or a logger was already installed.
pub fn init(log_level_from_settings: Option<&str>) -> Result<()> {
    let log_level = env::var("FLOWPLAN_LOG_LEVEL").unwrap_or_else(|_| {
        log_level_from_settings
            .unwrap_or(DEFAULT_LOG_LEVEL)
            .to_string()
    });

    let log_level = match log_level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {}", unknown),
    };

    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);

    // Automatically apply colours only if the output is a terminal
    let use_colour_stdout = std::io::stdout().is_terminal();
    let use_colour_stderr = std::io::stderr().is_terminal();

    let dispatch = Dispatch::new()
        .chain(
            // Write non-error messages to stdout
            Dispatch::new()
                .filter(|metadata| metadata.level() > LevelFilter::Warn)
                .format(move |out, message, record| {
                    write_log_colour(out, message, record, use_colour_stdout, &colours);
                })
                .level(log_level)
                .chain(std::io::stdout()),
        )
        .chain(
            // Write error messages to stderr
            Dispatch::new()
                .format(move |out, message, record| {
                    write_log_colour(out, message, record, use_colour_stderr, &colours);
                })
                .level(log_level.min(LevelFilter::Warn))
                .chain(std::io::stderr()),
        );

    if dispatch.apply().is_err() {
        bail!("Logger already initialised");
    }

    Ok(())
}

/// Write to the log in the format we want for flowplan
fn write_log<T: Display>(out: FormatCallback, level: T, target: &str, message: &Arguments) {
    let timestamp = Local::now().format("%H:%M:%S");

    out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
}

/// Write to the log with optional colours
fn write_log_colour(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    use_colour: bool,
    colours: &ColoredLevelConfig,
) {
    if use_colour {
        write_log(out, colours.color(record.level()), record.target(), message);
    } else {
        write_log(out, record.level(), record.target(), message);
    }
}
