//! Nicely formatted `cefmat` output.

use std::fmt;

use log;

const CEFMAT_BANNER_LENGTH: usize = 79;

/// Logs an error to the `cefmat-output` logger as well as to the default logger.
macro_rules! cefmat_error {
    ($fmt:expr $(, $($arg:tt)*)?) => {
        log::error!($fmt, $($($arg)*)?);
        log::error!(target: "cefmat-output", $fmt, $($($arg)*)?);
    }
}

/// Logs a warning to the `cefmat-output` logger.
macro_rules! cefmat_warn {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::warn!(target: "cefmat-output", $fmt, $($($arg)*)?); }
}

/// Logs a main output line to the `cefmat-output` logger.
macro_rules! cefmat_output {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::info!(target: "cefmat-output", $fmt, $($($arg)*)?); }
}

pub(crate) use {cefmat_error, cefmat_output, cefmat_warn};

/// Logs a nicely formatted section title to the `cefmat-output` logger.
pub(crate) fn log_title(title: &str) {
    let length = title.chars().count().max(CEFMAT_BANNER_LENGTH - 6);
    let bar = "─".repeat(length);
    cefmat_output!("┌──{bar}──┐");
    cefmat_output!("│§ {title:^length$} §│");
    cefmat_output!("└──{bar}──┘");
}

/// Writes a nicely formatted subtitle.
pub(crate) fn write_subtitle(f: &mut fmt::Formatter<'_>, subtitle: &str) -> fmt::Result {
    let length = subtitle.chars().count();
    let bar = "═".repeat(length);
    writeln!(f, "{subtitle}")?;
    writeln!(f, "{bar}")?;
    Ok(())
}

/// Logs a nicely formatted subtitle to the `cefmat-output` logger.
pub(crate) fn log_subtitle(subtitle: &str) {
    let length = subtitle.chars().count();
    let bar = "═".repeat(length);
    cefmat_output!("{}", subtitle);
    cefmat_output!("{}", bar);
}

/// Turns a boolean into a string of `yes` or `no`.
pub(crate) fn nice_bool(b: bool) -> String {
    if b {
        "yes".to_string()
    } else {
        "no".to_string()
    }
}

/// A trait for logging `cefmat` outputs nicely.
pub(crate) trait CefmatOutput: fmt::Debug + fmt::Display {
    /// Logs display output nicely.
    fn log_output_display(&self) {
        let lines = self.to_string();
        lines.lines().for_each(|line| {
            cefmat_output!("{line}");
        })
    }
}

// Blanket implementation
impl<T> CefmatOutput for T where T: fmt::Debug + fmt::Display {}
