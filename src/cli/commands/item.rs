//! `dlms item` command - item master and store stock

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{open_engine, operator};
use crate::cli::output::{print_outcome, report};
use crate::cli::table::print_list;
use crate::cli::GlobalOpts;
use crate::core::views;
use crate::core::{ItemType, NewItem};

#[derive(Subcommand, Debug)]
pub enum ItemCommands {
    /// Add an item to the item master
    Add(AddArgs),

    /// Receive goods into store stock
    Receive(ReceiveArgs),

    /// List every item with its stock
    List,

    /// Permanent items with stock left to request
    Available,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Item name, unique across the item master
    pub name: String,

    /// Ledger the item is booked in
    #[arg(long, short = 'l')]
    pub ledger: String,

    /// Folio number within the ledger
    #[arg(long)]
    pub folio: String,

    /// Permanent (loaned to departments) or consumable (issued and used up)
    #[arg(long = "type", short = 't', default_value = "permanent")]
    pub item_type: ItemType,

    /// Opening stock
    #[arg(long, short = 's', default_value_t = 0)]
    pub stock: u32,
}

#[derive(clap::Args, Debug)]
pub struct ReceiveArgs {
    /// Item name
    pub name: String,

    /// Quantity received
    pub quantity: u32,
}

pub fn run(cmd: ItemCommands, global: &GlobalOpts) -> Result<()> {
    let (engine, config) = open_engine(global)?;
    let actor = operator(global, &config)?;

    match cmd {
        ItemCommands::Add(args) => {
            let item = engine
                .add_item(
                    &actor,
                    NewItem {
                        name: args.name,
                        ledger_name: args.ledger,
                        folio_number: args.folio,
                        item_type: args.item_type,
                        stock: args.stock,
                    },
                )
                .map_err(report)?;
            print_outcome(
                global.format,
                &item,
                &format!("Added item {}", style(&item.name).cyan()),
                &[
                    format!(
                        "{} folio {}, {}",
                        style(&item.ledger_name).yellow(),
                        item.folio_number,
                        item.item_type
                    ),
                    format!("Stock: {}", item.stock),
                ],
            )
        }
        ItemCommands::Receive(args) => {
            let item = engine
                .receive_stock(&actor, &args.name, args.quantity)
                .map_err(report)?;
            print_outcome(
                global.format,
                &item,
                &format!(
                    "Received {} x {}",
                    args.quantity,
                    style(&item.name).cyan()
                ),
                &[format!("Stock: {}", style(item.stock).yellow())],
            )
        }
        ItemCommands::List => {
            let items = engine
                .view(&actor, |snap, _| views::items(snap))
                .map_err(report)?;
            print_list(&items, global.format)
        }
        ItemCommands::Available => {
            let items = engine
                .view(&actor, |snap, _| views::available_stock(snap))
                .map_err(report)?;
            print_list(&items, global.format)
        }
    }
}
