//! Shared helper functions for CLI commands

use miette::{bail, IntoDiagnostic, Result};

use crate::cli::args::GlobalOpts;
use crate::core::{Config, CsvStore, LedgerEngine, RecordId};

/// Format a RecordId for display as its prefix and the first ULID characters
///
/// Any unique fragment is accepted back wherever an id is expected.
pub fn format_short_id(id: &RecordId) -> String {
    id.short()
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Load configuration for the global options
pub fn load_config(global: &GlobalOpts) -> Result<Config> {
    Config::load(global.data_dir.as_deref()).into_diagnostic()
}

/// Open the workflow engine over the configured data directory
///
/// Fails when the directory has not been set up with `dlms init`.
pub fn open_engine(global: &GlobalOpts) -> Result<(LedgerEngine<CsvStore>, Config)> {
    let config = load_config(global)?;
    let dir = config.data_dir();
    if !dir.exists() {
        bail!(
            help = format!("Run 'dlms init' to create {}", dir.display()),
            "No DLMS data directory found"
        );
    }
    let store = CsvStore::open(&dir).into_diagnostic()?;
    let engine = LedgerEngine::new(store, config.workflow.clone());
    Ok((engine, config))
}

/// Operator for this invocation: `--user`, then `DLMS_USER`, then `default_user`
pub fn operator(global: &GlobalOpts, config: &Config) -> Result<String> {
    match global.user.clone().or_else(|| config.default_user.clone()) {
        Some(user) if !user.trim().is_empty() => Ok(user.trim().to_string()),
        _ => Err(miette::miette!(
            code = "dlms::unknown_user",
            help = "Pass --user, set DLMS_USER, or set default_user in the config",
            "No operator given"
        )),
    }
}
