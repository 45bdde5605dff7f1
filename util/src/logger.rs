//! Logging for the control executables
//!
//! Log lines go to two sinks. The terminal gets coloured level tags and is
//! kept free of the per-step numerical solver chatter. The session log file
//! gets every record at the requested level as plain text, so it can be
//! grepped after a run.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use colored::Colorize;
use log::{info, Level};
use std::path::Path;
use thiserror::Error;

use crate::session::{self, Session};

pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Targets which log on every control step. They are capped on the terminal
/// but reach the session log file in full.
const PER_STEP_TARGETS: [&str; 2] = ["smc_lib::num_stab", "smc_lib::equiv_ctrl"];

/// Most verbose level shown on the terminal for `PER_STEP_TARGETS`.
const PER_STEP_TERMINAL_LEVEL: LevelFilter = LevelFilter::Info;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("The log level must be at least as verbose as `INFO`, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Could not open the session log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("A logger has already been set: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise logging to the terminal and to the session log file.
///
/// `min_level` must be `Info` or more verbose, warnings and errors alone do
/// not leave enough of a record of a control run. Only the first call in a
/// process can succeed.
pub fn logger_init(min_level: LevelFilter, session: &Session) -> Result<(), LoggerInitError> {
    check_min_level(min_level)?;

    dispatch(min_level, &session.log_file_path)?
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised at {:?}", min_level);
    if let Some(epoch) = session::get_epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Log file: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn check_min_level(min_level: LevelFilter) -> Result<(), LoggerInitError> {
    if min_level < LevelFilter::Info {
        Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }
    else {
        Ok(())
    }
}

/// Build the two sink dispatch without installing it.
fn dispatch(min_level: LevelFilter, log_file: &Path) -> Result<fern::Dispatch, LoggerInitError> {
    let mut terminal = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}",
                format_line(
                    session::get_elapsed_seconds(),
                    record.level(),
                    record.target(),
                    message,
                    true
                )
            ))
        })
        .chain(std::io::stdout());

    for target in PER_STEP_TARGETS.iter() {
        terminal = terminal.level_for(*target, min_level.min(PER_STEP_TERMINAL_LEVEL));
    }

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}",
                format_line(
                    session::get_elapsed_seconds(),
                    record.level(),
                    record.target(),
                    message,
                    false
                )
            ))
        })
        .chain(fern::log_file(log_file).map_err(LoggerInitError::LogFileInitError)?);

    Ok(fern::Dispatch::new()
        .level(min_level)
        .chain(terminal)
        .chain(file))
}

/// Format one log line. Debug and trace lines carry their target.
fn format_line(
    elapsed_s: f64,
    level: Level,
    target: &str,
    message: &std::fmt::Arguments,
    coloured: bool
) -> String {
    let tag = match level {
        Level::Trace => "TRC",
        Level::Debug => "DBG",
        Level::Info => "INF",
        Level::Warn => "WRN",
        Level::Error => "ERR",
    };
    let tag = if coloured {
        match level {
            Level::Trace => tag.dimmed().italic().to_string(),
            Level::Debug => tag.dimmed().to_string(),
            Level::Info => tag.to_string(),
            Level::Warn => tag.yellow().to_string(),
            Level::Error => tag.red().bold().to_string(),
        }
    }
    else {
        tag.to_string()
    };

    if level > Level::Info {
        format!("[{:10.6} {}] {}: {}", elapsed_s, tag, target, message)
    }
    else {
        format!("[{:10.6} {}] {}", elapsed_s, tag, message)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_min_level() {
        for level in [LevelFilter::Off, LevelFilter::Error, LevelFilter::Warn].iter() {
            match check_min_level(*level) {
                Err(LoggerInitError::InvalidMinLogLevel(l)) => assert_eq!(l, *level),
                other => panic!("{:?} accepted: {:?}", level, other),
            }
        }

        for level in [LevelFilter::Info, LevelFilter::Debug, LevelFilter::Trace].iter() {
            assert!(check_min_level(*level).is_ok());
        }

        let msg = check_min_level(LevelFilter::Warn).unwrap_err().to_string();
        assert!(msg.contains("at least as verbose as `INFO`"), "{}", msg);
    }

    #[test]
    fn test_file_lines_are_plain() {
        let line = format_line(1.5, Level::Warn, "smc_lib::dynamics", &format_args!("fell"), false);
        assert_eq!(line, "[  1.500000 WRN] fell");

        let line = format_line(0.25, Level::Debug, "smc_lib::num_stab", &format_args!("x = {}", 2), false);
        assert_eq!(line, "[  0.250000 DBG] smc_lib::num_stab: x = 2");
        assert!(!line.contains('\u{1b}'));
    }

    #[test]
    fn test_dispatch_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smc.log");

        assert!(dispatch(LevelFilter::Debug, &path).is_ok());
        assert!(path.exists());

        let missing = dir.path().join("no_such_dir").join("smc.log");
        assert!(matches!(
            dispatch(LevelFilter::Debug, &missing),
            Err(LoggerInitError::LogFileInitError(_))
        ));
    }
}
