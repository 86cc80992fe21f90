//! Nice PBCell output formatting.

use std::fmt;

use log;

const PBCELL_BANNER_LENGTH: usize = 89;

/// Logs a warning to the `pbcell-output` logger as well as to the default logger.
macro_rules! pbcell_warn {
    ($fmt:expr $(, $($arg:tt)*)?) => {
        log::warn!($fmt, $($($arg)*)?);
        log::warn!(target: "pbcell-output", $fmt, $($($arg)*)?);
    }
}

/// Logs a main output line to the `pbcell-output` logger.
macro_rules! pbcell_output {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::info!(target: "pbcell-output", $fmt, $($($arg)*)?); }
}

pub(crate) use {pbcell_output, pbcell_warn};

/// Writes a nicely formatted subtitle.
pub(crate) fn write_subtitle(f: &mut fmt::Formatter<'_>, subtitle: &str) -> fmt::Result {
    let length = subtitle.chars().count();
    let bar = "═".repeat(length);
    writeln!(f, "{subtitle}")?;
    writeln!(f, "{bar}")?;
    Ok(())
}

/// Logs a nicely formatted section title to the `pbcell-output` logger.
pub(crate) fn log_title(title: &str) {
    let length = title.chars().count().max(PBCELL_BANNER_LENGTH - 6);
    let bar = "─".repeat(length);
    pbcell_output!("┌──{bar}──┐");
    pbcell_output!("│§ {title:^length$} §│");
    pbcell_output!("└──{bar}──┘");
}

/// Logs a nicely formatted subtitle to the `pbcell-output` logger.
pub(crate) fn log_subtitle(subtitle: &str) {
    let length = subtitle.chars().count();
    let bar = "═".repeat(length);
    pbcell_output!("{}", subtitle);
    pbcell_output!("{}", bar);
}

/// Logs a nicely formatted macro-section beginning to the `pbcell-output` logger.
pub(crate) fn log_macsec_begin(sectitle: &str) {
    let width = PBCELL_BANNER_LENGTH - 14;
    let sectitle_space = sectitle.to_string() + " ";
    pbcell_output!("❬❬❬❬❬ [Begin] {sectitle_space:❬<width$}");
}

/// Logs a nicely formatted macro-section ending to the `pbcell-output` logger.
pub(crate) fn log_macsec_end(sectitle: &str) {
    let width = PBCELL_BANNER_LENGTH - 14;
    let sectitle_space = sectitle.to_string() + " ";
    pbcell_output!("❭❭❭❭❭ [ End ] {sectitle_space:❭<width$}");
}

/// Turns a boolean into a string of `yes` or `no`.
pub(crate) fn nice_bool(b: bool) -> String {
    if b {
        "yes".to_string()
    } else {
        "no".to_string()
    }
}

/// A trait for logging `PBCell` outputs nicely.
pub(crate) trait PBCellOutput: fmt::Debug + fmt::Display {
    /// Logs display output nicely.
    fn log_output_display(&self) {
        let lines = self.to_string();
        lines.lines().for_each(|line| {
            pbcell_output!("{line}");
        })
    }
}

// Blanket implementation
impl<T> PBCellOutput for T where T: fmt::Debug + fmt::Display {}
