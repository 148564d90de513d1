//! Command-line arguments

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::consumable::ConsumableCommands;
use crate::cli::commands::dept::DeptCommands;
use crate::cli::commands::init::InitArgs;
use crate::cli::commands::item::ItemCommands;
use crate::cli::commands::request::RequestCommands;
use crate::cli::commands::ret::ReturnCommands;
use crate::cli::commands::survey::{SurveyCommands, WriteoffCommands};
use crate::cli::commands::user::UserCommands;
use crate::cli::commands::view::CompletionsArgs;

/// Digital Ledger Management System
///
/// Store stock, S-156 requests, the permanent loan ledger, returns, surveys
/// and write-offs, kept as plain-text CSV tables.
#[derive(Debug, Parser)]
#[command(name = "dlms", author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(Debug, Clone, Args)]
pub struct GlobalOpts {
    /// Operator username
    #[arg(long, short = 'u', global = true, env = "DLMS_USER")]
    pub user: Option<String>,

    /// Directory holding the CSV tables
    #[arg(long, global = true, env = "DLMS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Log workflow decisions to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Table for lists, a summary line for single records
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
    /// Tab-separated values with a header row
    Tsv,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a data directory and optionally its first admin
    Init(InitArgs),

    /// Operators and roles
    #[command(subcommand)]
    User(UserCommands),

    /// Department master
    #[command(subcommand)]
    Dept(DeptCommands),

    /// Item master and store stock
    #[command(subcommand)]
    Item(ItemCommands),

    /// S-156 requests: raise, approve, reject, confirm receipt
    #[command(subcommand)]
    Request(RequestCommands),

    /// Returns of PLL holdings
    #[command(subcommand)]
    Return(ReturnCommands),

    /// Surveys of unserviceable or lost items
    #[command(subcommand)]
    Survey(SurveyCommands),

    /// Write-offs of surveyed items
    #[command(subcommand)]
    Writeoff(WriteoffCommands),

    /// Consumable issues and usage summary
    #[command(subcommand)]
    Consumable(ConsumableCommands),

    /// Ledger entries posted on receipt
    Ledger,

    /// Permanent loan ledger holdings
    Pll,

    /// Role dashboard
    Dashboard,

    /// Generate shell completions
    Completions(CompletionsArgs),
}
