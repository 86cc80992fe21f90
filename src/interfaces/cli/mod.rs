//! Command-line interface and logging configuration for the `pbcell` binary.

use std::path::{Path, PathBuf};

use anyhow::{self, format_err};
use clap::{ArgAction, Parser};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::append::Append;
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::io::format::pbcell_output;

const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

/// Logs a nicely formatted PBCell heading to the `pbcell-output` logger.
pub fn log_heading() {
    let version = if let Some(ver) = VERSION {
        format!("v{ver}")
    } else {
        "v unknown".to_string()
    };
    pbcell_output!("╭───────────────────────────────────────────────────────────────────────────────────────╮");
    pbcell_output!("│                                                                                       │");
    pbcell_output!("│   PPPPPP   BBBBBB    CCCCC  EEEEEEE LL      LL                                        │");
    pbcell_output!("│   PP   PP  BB   BB  CC      EE      LL      LL          Periodic cells and lattice    │");
    pbcell_output!("│   PPPPPP   BBBBBB   CC      EEEEE   LL      LL          point selection               │");
    pbcell_output!("│   PP       BB   BB  CC      EE      LL      LL                                        │");
    pbcell_output!("│   PP       BBBBBB    CCCCC  EEEEEEE LLLLLLL LLLLLLL                     {version:>13} │");
    pbcell_output!("│                                                                                       │");
    pbcell_output!("╰───────────────────────────────────────────────────────────────────────────────────────╯");
    pbcell_output!("");
}

/// The command-line arguments of the `pbcell` binary.
#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a YAML input file. If not given, a template input file is written instead.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Name of the output file, without extension. If not given, output is written to the
    /// console.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Verbosity of the diagnostic log written to standard error. May be repeated.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Configures `log4rs` for the `pbcell` binary.
///
/// Main output from the `pbcell-output` target goes to `<output>.out` if `output` is given, or to
/// standard output otherwise. All other diagnostics go to standard error, filtered by
/// `verbose`.
///
/// # Arguments
///
/// * `output` - Optional name of the output file, without extension.
/// * `verbose` - The verbosity level of the diagnostics.
///
/// # Returns
///
/// A handle to the installed logger.
pub fn configure_logging(
    output: Option<&Path>,
    verbose: u8,
) -> Result<log4rs::Handle, anyhow::Error> {
    let output_appender: Box<dyn Append> = if let Some(name) = output {
        let mut path = name.to_path_buf();
        path.set_extension("out");
        Box::new(
            FileAppender::builder()
                .encoder(Box::new(PatternEncoder::new("{m}{n}")))
                .append(false)
                .build(path)?,
        )
    } else {
        Box::new(
            ConsoleAppender::builder()
                .encoder(Box::new(PatternEncoder::new("{m}{n}")))
                .target(Target::Stdout)
                .build(),
        )
    };
    let diagnostics_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S)} {h({l:<5})} {t} - {m}{n}")))
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
                .build("pbcell-output", LevelFilter::Info),
        )
        .build(Root::builder().appender("diagnostics").build(level))
        .map_err(|err| format_err!(err))?;
    log4rs::init_config(config).map_err(|err| format_err!(err))
}
