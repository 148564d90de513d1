//! `dlms consumable` command - direct issue of consumable stock

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{format_short_id, open_engine, operator};
use crate::cli::output::{print_outcome, report};
use crate::cli::table::print_list;
use crate::cli::GlobalOpts;
use crate::core::views;

#[derive(Subcommand, Debug)]
pub enum ConsumableCommands {
    /// Issue consumable stock to a department (store)
    Issue(IssueArgs),

    /// Consumable usage visible to you
    List,
}

#[derive(clap::Args, Debug)]
pub struct IssueArgs {
    /// Consumable item name
    pub item: String,

    /// Receiving department
    pub department: String,

    /// Quantity issued
    pub quantity: u32,
}

pub fn run(cmd: ConsumableCommands, global: &GlobalOpts) -> Result<()> {
    let (engine, config) = open_engine(global)?;
    let actor = operator(global, &config)?;

    match cmd {
        ConsumableCommands::Issue(args) => {
            let issue = engine
                .issue_consumable(&actor, &args.item, &args.department, args.quantity)
                .map_err(report)?;
            print_outcome(
                global.format,
                &issue,
                &format!(
                    "Issued {} x {} to {}",
                    issue.quantity,
                    style(&issue.item).yellow(),
                    issue.department
                ),
                &[format!("Issue {}", style(format_short_id(&issue.id)).cyan())],
            )
        }
        ConsumableCommands::List => {
            let issues = engine
                .view(&actor, views::consumable_summary)
                .map_err(report)?;
            print_list(&issues, global.format)
        }
    }
}
