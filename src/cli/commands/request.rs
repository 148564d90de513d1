//! `dlms request` command - S-156 request lifecycle
//!
//! Requested -> StoreApproved -> Received, or Requested -> Rejected.

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::filters::RequestStatusFilter;
use crate::cli::helpers::{format_short_id, open_engine, operator};
use crate::cli::output::{print_json, print_outcome, report};
use crate::cli::table::print_list;
use crate::cli::GlobalOpts;
use crate::cli::OutputFormat;
use crate::core::views::{self, PendingActions};

#[derive(Subcommand, Debug)]
pub enum RequestCommands {
    /// Raise an S-156 request for your department
    Raise(RaiseArgs),

    /// Approve a request and issue the stock (store)
    Approve(IdArgs),

    /// Reject a request (store)
    Reject(RejectArgs),

    /// Confirm your department received an approved request
    Receive(IdArgs),

    /// List requests visible to you
    List(ListArgs),

    /// What is waiting on your role
    Pending,
}

#[derive(clap::Args, Debug)]
pub struct RaiseArgs {
    /// Item name
    pub item: String,

    /// Quantity requested
    pub quantity: u32,
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Request ID or a unique fragment of it
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct RejectArgs {
    /// Request ID or a unique fragment of it
    pub id: String,

    /// Reason recorded on the request
    #[arg(long, short = 'r')]
    pub reason: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by status
    #[arg(long, short = 's', value_enum, default_value_t = RequestStatusFilter::All)]
    pub status: RequestStatusFilter,
}

pub fn run(cmd: RequestCommands, global: &GlobalOpts) -> Result<()> {
    let (engine, config) = open_engine(global)?;
    let actor = operator(global, &config)?;

    match cmd {
        RequestCommands::Raise(args) => {
            let request = engine
                .raise_request(&actor, &args.item, args.quantity)
                .map_err(report)?;
            print_outcome(
                global.format,
                &request,
                &format!(
                    "Raised S-156 request {}",
                    style(format_short_id(&request.id)).cyan()
                ),
                &[format!(
                    "{} x {} for {}",
                    request.quantity,
                    style(&request.item).yellow(),
                    request.department
                )],
            )
        }
        RequestCommands::Approve(args) => {
            let request = engine.approve_request(&actor, &args.id).map_err(report)?;
            print_outcome(
                global.format,
                &request,
                &format!(
                    "Approved request {}",
                    style(format_short_id(&request.id)).cyan()
                ),
                &[format!(
                    "Issued {} x {} to {}",
                    request.quantity,
                    style(&request.item).yellow(),
                    request.department
                )],
            )
        }
        RequestCommands::Reject(args) => {
            let request = engine
                .reject_request(&actor, &args.id, args.reason.as_deref())
                .map_err(report)?;
            let details: Vec<String> = request
                .remarks
                .iter()
                .map(|r| format!("Reason: {}", style(r).yellow()))
                .collect();
            print_outcome(
                global.format,
                &request,
                &format!(
                    "Rejected request {}",
                    style(format_short_id(&request.id)).cyan()
                ),
                &details,
            )
        }
        RequestCommands::Receive(args) => {
            let posting = engine.confirm_receipt(&actor, &args.id).map_err(report)?;
            print_outcome(
                global.format,
                &posting,
                &format!(
                    "Received request {}",
                    style(format_short_id(&posting.request.id)).cyan()
                ),
                &[
                    format!(
                        "Ledger entry {} ({} folio {})",
                        style(format_short_id(&posting.ledger_entry.id)).cyan(),
                        posting.ledger_entry.ledger_name,
                        posting.ledger_entry.folio_number
                    ),
                    format!(
                        "{} now holds {} x {}",
                        posting.holding.department,
                        style(posting.holding.quantity_held).yellow(),
                        posting.holding.item
                    ),
                ],
            )
        }
        RequestCommands::List(args) => {
            let requests = engine
                .view(&actor, |snap, user| views::requests(snap, user, None))
                .map_err(report)?;
            let requests: Vec<_> = requests
                .into_iter()
                .filter(|r| args.status.matches(r.status))
                .collect();
            print_list(&requests, global.format)
        }
        RequestCommands::Pending => {
            let pending = engine
                .view(&actor, views::pending_actions)
                .map_err(report)?;
            if global.format == OutputFormat::Json {
                return print_json(&pending);
            }
            match pending {
                PendingActions::Requests(rows) => print_list(&rows, global.format),
                PendingActions::Surveys(rows) => print_list(&rows, global.format),
            }
        }
    }
}
