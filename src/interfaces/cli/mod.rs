//! Command-line interface and logging set-up for the `cefmat` binary.

use std::path::{Path, PathBuf};

use anyhow::{self, format_err};
use clap::{ArgAction, Parser};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::append::Append;
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::io::format::cefmat_output;

const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

/// Logs a nicely formatted `cefmat` heading to the `cefmat-output` logger.
pub fn log_heading() {
    let version = if let Some(ver) = VERSION {
        format!("v{ver}")
    } else {
        "v unknown".to_string()
    };
    let bar = "─".repeat(79);
    cefmat_output!("╭{bar}╮");
    cefmat_output!("│{:^79}│", "cefmat");
    cefmat_output!("│{:^79}│", "Angular-momentum operators, transitions and magnetism of J multiplets");
    cefmat_output!("│{version:>78} │");
    cefmat_output!("╰{bar}╯");
    cefmat_output!("");
}

/// Command-line arguments of the `cefmat` binary.
#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// The YAML input file.
    #[arg(short, long)]
    pub config: PathBuf,

    /// The file to which the output is written. If absent, the output goes to standard output.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Increases the verbosity of diagnostic messages on standard error. May be repeated.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Configures `log4rs` for the `cefmat` binary.
///
/// The `cefmat-output` logger writes plain lines to `output`, or to standard output if `output` is
/// `None`. All other records go to standard error, filtered at a level set by `verbose`.
///
/// # Arguments
///
/// * `output` - An optional output file, which is truncated.
/// * `verbose` - The number of `-v` flags given.
///
/// # Errors
///
/// Errors if the output file cannot be created or a logger has already been installed.
pub fn setup_logging(output: Option<&Path>, verbose: u8) -> Result<(), anyhow::Error> {
    let output_appender: Box<dyn Append> = match output {
        Some(path) => Box::new(
            FileAppender::builder()
                .encoder(Box::new(PatternEncoder::new("{m}{n}")))
                .append(false)
                .build(path)
                .map_err(|err| format_err!("Unable to create `{}`: {err}", path.display()))?,
        ),
        None => Box::new(
            ConsoleAppender::builder()
                .encoder(Box::new(PatternEncoder::new("{m}{n}")))
                .target(Target::Stdout)
                .build(),
        ),
    };
    let diagnostics_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("[{l:<5}] {t}: {m}{n}")))
        .target(Target::Stderr)
        .build();
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let config = Config::builder()
        .appender(Appender::builder().build("output", output_appender))
        .appender(Appender::builder().build("diagnostics", Box::new(diagnostics_appender)))
        .logger(
            Logger::builder()
                .appender("output")
                .additive(false)
                .build("cefmat-output", LevelFilter::Info),
        )
        .build(Root::builder().appender("diagnostics").build(level))
        .map_err(|err| format_err!(err))?;
    log4rs::init_config(config).map_err(|err| format_err!(err))?;
    Ok(())
}
