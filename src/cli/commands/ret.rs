//! `dlms return` command - handing PLL holdings back to the store

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::filters::ReturnStatusFilter;
use crate::cli::helpers::{format_short_id, open_engine, operator};
use crate::cli::output::{print_outcome, report};
use crate::cli::table::print_list;
use crate::cli::GlobalOpts;
use crate::core::views;
use crate::core::ReturnOutcome;

#[derive(Subcommand, Debug)]
pub enum ReturnCommands {
    /// Return part of your department's holding of an item
    Submit(SubmitArgs),

    /// Accept a pending return: clears the PLL and restocks (store)
    Accept(IdArgs),

    /// Refuse a pending return (store)
    Reject(IdArgs),

    /// List returns visible to you
    List(ListArgs),
}

#[derive(clap::Args, Debug)]
pub struct SubmitArgs {
    /// Item name
    pub item: String,

    /// Quantity to return
    pub quantity: u32,
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Return ID or a unique fragment of it
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by status
    #[arg(long, short = 's', value_enum, default_value_t = ReturnStatusFilter::All)]
    pub status: ReturnStatusFilter,
}

pub fn run(cmd: ReturnCommands, global: &GlobalOpts) -> Result<()> {
    let (engine, config) = open_engine(global)?;
    let actor = operator(global, &config)?;

    match cmd {
        ReturnCommands::Submit(args) => {
            let ret = engine
                .submit_return(&actor, &args.item, args.quantity)
                .map_err(report)?;
            print_outcome(
                global.format,
                &ret,
                &format!("Submitted return {}", style(format_short_id(&ret.id)).cyan()),
                &[format!(
                    "{} x {} from {}",
                    ret.quantity,
                    style(&ret.item).yellow(),
                    ret.department
                )],
            )
        }
        ReturnCommands::Accept(args) => {
            let outcome = engine.accept_return(&actor, &args.id).map_err(report)?;
            print_completion(global, &outcome, "Accepted")
        }
        ReturnCommands::Reject(args) => {
            let outcome = engine.reject_return(&actor, &args.id).map_err(report)?;
            print_completion(global, &outcome, "Rejected")
        }
        ReturnCommands::List(args) => {
            let returns = engine
                .view(&actor, views::returns)
                .map_err(report)?;
            let returns: Vec<_> = returns
                .into_iter()
                .filter(|r| args.status.matches(r.status))
                .collect();
            print_list(&returns, global.format)
        }
    }
}

fn print_completion(global: &GlobalOpts, outcome: &ReturnOutcome, verb: &str) -> Result<()> {
    let mut details = Vec::new();
    if let Some(holding) = &outcome.holding {
        details.push(format!(
            "{} now holds {} x {}",
            holding.department,
            style(holding.quantity_held).yellow(),
            holding.item
        ));
    }
    if let Some(item) = &outcome.item {
        details.push(format!("Stock of {}: {}", item.name, style(item.stock).yellow()));
    }
    print_outcome(
        global.format,
        outcome,
        &format!(
            "{} return {}",
            verb,
            style(format_short_id(&outcome.ret.id)).cyan()
        ),
        &details,
    )
}
