//! CLI module - argument parsing and command implementations

pub mod args;
pub mod commands;
pub mod filters;
pub mod helpers;
pub mod output;
pub mod table;

pub use args::{Cli, Commands, GlobalOpts, OutputFormat};
pub use filters::{RequestStatusFilter, ReturnStatusFilter};
