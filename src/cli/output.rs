//! Output formatting utilities

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::core::{ErrorKind, LedgerError};

/// Print the outcome of a mutating command
///
/// JSON output serializes `payload`; the other formats print `summary`
/// followed by indented `details`.
pub fn print_outcome<T: Serialize>(
    format: OutputFormat,
    payload: &T,
    summary: &str,
    details: &[String],
) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(payload),
        OutputFormat::Table | OutputFormat::Tsv => {
            println!("{} {}", style("✓").green(), summary);
            for line in details {
                println!("   {}", line);
            }
            Ok(())
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(payload: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(payload).into_diagnostic()?;
    println!("{}", json);
    Ok(())
}

/// Hint shown under an error of the given kind
fn help_for(kind: ErrorKind) -> Option<&'static str> {
    match kind {
        ErrorKind::UnknownUser => Some("Add the user with 'dlms user add' or pass --user"),
        ErrorKind::StaleState => {
            Some("The record has moved on; list it again and act on its current status")
        }
        ErrorKind::InsufficientStock => Some("Receive more stock with 'dlms item receive'"),
        ErrorKind::NoSuchHolding => Some("Check holdings with 'dlms pll'"),
        ErrorKind::AmbiguousId => Some("Type more characters of the id"),
        ErrorKind::NotEnabled => Some("Enable the setting in dlms.yaml"),
        _ => None,
    }
}

/// Convert a workflow error into a diagnostic for display
pub fn report(e: LedgerError) -> miette::Report {
    let code = format!("dlms::{}", e.kind());
    match help_for(e.kind()) {
        Some(help) => miette::miette!(code = code, help = help, "{}", e),
        None => miette::miette!(code = code, "{}", e),
    }
}
