//! Top-level views: ledger, PLL, dashboard, and shell completions

use clap::{Args, CommandFactory};
use clap_complete::Shell;
use console::style;
use miette::Result;

use crate::cli::helpers::{open_engine, operator};
use crate::cli::output::{print_json, report};
use crate::cli::table::print_list;
use crate::cli::{Cli, GlobalOpts, OutputFormat};
use crate::core::views::{self, Dashboard};

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn run_ledger(global: &GlobalOpts) -> Result<()> {
    let (engine, config) = open_engine(global)?;
    let actor = operator(global, &config)?;
    let entries = engine
        .view(&actor, views::ledger_entries)
        .map_err(report)?;
    print_list(&entries, global.format)
}

pub fn run_pll(global: &GlobalOpts) -> Result<()> {
    let (engine, config) = open_engine(global)?;
    let actor = operator(global, &config)?;
    let holdings = engine.view(&actor, views::holdings).map_err(report)?;
    print_list(&holdings, global.format)
}

pub fn run_dashboard(global: &GlobalOpts) -> Result<()> {
    let (engine, config) = open_engine(global)?;
    let actor = operator(global, &config)?;
    let dashboard = engine.view(&actor, views::dashboard).map_err(report)?;

    if global.format == OutputFormat::Json {
        return print_json(&dashboard);
    }

    match &dashboard {
        Dashboard::Store {
            total_items,
            available_stock,
            ledger_entries,
            pending_requests,
            pending_returns,
            pending_surveys,
        } => {
            header("Store dashboard");
            field("Items", total_items);
            field("Units in stock", available_stock);
            field("Ledger entries", ledger_entries);
            field("Requests awaiting approval", pending_requests);
            field("Pending returns", pending_returns);
            field("Pending surveys", pending_surveys);
        }
        Dashboard::Department {
            department,
            items_on_pll,
            open_requests,
            pending_returns,
            holdings,
        } => {
            header(&format!("{} dashboard", department));
            field("Items on PLL", items_on_pll);
            field("Open requests", open_requests);
            field("Pending returns", pending_returns);
            if !holdings.is_empty() {
                println!();
                print_list(holdings, global.format)?;
            }
        }
        Dashboard::Admin {
            departments,
            pending_surveys,
            write_offs,
            pll_by_department,
        } => {
            header("Admin dashboard");
            field("Departments", departments);
            field("Surveys awaiting write-off", pending_surveys);
            field("Write-offs", write_offs);
            if !pll_by_department.is_empty() {
                println!();
                println!("{}:", style("PLL by department").bold());
                for (dept, held) in pll_by_department {
                    println!("   {:<24} {}", dept, style(held).yellow());
                }
            }
        }
    }
    Ok(())
}

fn header(title: &str) {
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", style(title).bold().cyan());
    println!("{}", style("─".repeat(60)).dim());
}

fn field(label: &str, value: impl std::fmt::Display) {
    println!("{:<28} {}", style(label).bold(), value);
}

pub fn run_completions(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(args.shell, &mut cmd, name, &mut std::io::stdout());
    Ok(())
}
