//! `dlms init` command - set up a data directory

use clap::Args;
use console::style;
use miette::{bail, IntoDiagnostic, Result};
use std::fs;

use crate::cli::helpers::load_config;
use crate::cli::output::print_outcome;
use crate::cli::GlobalOpts;
use crate::core::config::DATA_DIR_CONFIG;
use crate::core::{CsvStore, LedgerEngine, RecordStore, Role, TableId, User};

const CONFIG_TEMPLATE: &str = "\
# DLMS data directory settings
workflow:
  # Let the store accept or reject returned items (restocks and clears the PLL)
  complete_returns: false
  # Let Admin users approve or reject S-156 requests in place of the store
  allow_admin_approval: false
";

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Create the first user as an Admin
    #[arg(long)]
    pub admin: Option<String>,

    /// Rewrite dlms.yaml in an existing data directory; tables are kept
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let dir = config.data_dir();
    let store = CsvStore::open(&dir).into_diagnostic()?;

    if store.is_initialized() && !args.force {
        bail!(
            help = format!(
                "{} is in use; pass --force to rewrite {}",
                dir.display(),
                DATA_DIR_CONFIG
            ),
            "Data directory already initialized"
        );
    }

    let config_path = dir.join(DATA_DIR_CONFIG);
    if args.force || !config_path.exists() {
        fs::write(&config_path, CONFIG_TEMPLATE).into_diagnostic()?;
    }

    {
        let _guard = store.lock().into_diagnostic()?;
        let missing: Vec<(TableId, String)> = TableId::all()
            .iter()
            .filter(|t| !store.table_path(**t).exists())
            .map(|t| (*t, String::new()))
            .collect();
        store.write_tables(&missing).into_diagnostic()?;
    }

    let mut details = vec![format!("{}", style(config_path.display()).dim())];
    if let Some(username) = args.admin {
        let engine = LedgerEngine::new(store, config.workflow.clone());
        let admin = engine
            .add_user(
                global.user.as_deref(),
                User {
                    username,
                    role: Role::Admin,
                    department: None,
                },
            )
            .map_err(crate::cli::output::report)?;
        details.push(format!("Admin: {}", style(&admin.username).yellow()));
    }

    print_outcome(
        global.format,
        &serde_json::json!({ "data_dir": dir }),
        &format!("Initialized DLMS data directory {}", style(dir.display()).cyan()),
        &details,
    )
}
