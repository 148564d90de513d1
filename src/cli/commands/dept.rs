//! `dlms dept` command - department master

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{open_engine, operator};
use crate::cli::output::{print_outcome, report};
use crate::cli::table::print_list;
use crate::cli::GlobalOpts;

#[derive(Subcommand, Debug)]
pub enum DeptCommands {
    /// Add a department
    Add(AddArgs),

    /// List departments
    List,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Department name, e.g. "Physics"
    pub name: String,
}

pub fn run(cmd: DeptCommands, global: &GlobalOpts) -> Result<()> {
    let (engine, config) = open_engine(global)?;
    let actor = operator(global, &config)?;

    match cmd {
        DeptCommands::Add(args) => {
            let dept = engine.add_department(&actor, &args.name).map_err(report)?;
            print_outcome(
                global.format,
                &dept,
                &format!("Added department {}", style(&dept.name).cyan()),
                &[],
            )
        }
        DeptCommands::List => {
            let departments = engine
                .view(&actor, |snap, _| snap.departments.rows().to_vec())
                .map_err(report)?;
            print_list(&departments, global.format)
        }
    }
}
