//! `dlms survey` and `dlms writeoff` commands
//!
//! The store surveys loaned items found unserviceable or lost; an Admin then
//! approves the write-off, which takes the quantity off the department's PLL.

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{format_short_id, open_engine, operator};
use crate::cli::output::{print_outcome, report};
use crate::cli::table::print_list;
use crate::cli::GlobalOpts;
use crate::core::views;
use crate::core::{NewSurvey, SurveyStatus};

#[derive(Subcommand, Debug)]
pub enum SurveyCommands {
    /// Open a survey against a department's holding (store)
    New(NewArgs),

    /// List surveys visible to you
    List(ListArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Item name
    pub item: String,

    /// Department holding the item
    pub department: String,

    /// Quantity found unserviceable or lost
    pub quantity: u32,

    /// Survey board reference number
    #[arg(long = "ref")]
    pub survey_ref: String,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only surveys still waiting for write-off approval
    #[arg(long)]
    pub pending: bool,
}

#[derive(Subcommand, Debug)]
pub enum WriteoffCommands {
    /// Approve the write-off for a pending survey (admin)
    Approve(ApproveArgs),

    /// List write-offs visible to you
    List,
}

#[derive(clap::Args, Debug)]
pub struct ApproveArgs {
    /// Survey ID or a unique fragment of it
    pub survey: String,
}

pub fn run(cmd: SurveyCommands, global: &GlobalOpts) -> Result<()> {
    let (engine, config) = open_engine(global)?;
    let actor = operator(global, &config)?;

    match cmd {
        SurveyCommands::New(args) => {
            let survey = engine
                .initiate_survey(
                    &actor,
                    NewSurvey {
                        item: args.item,
                        department: args.department,
                        quantity: args.quantity,
                        survey_ref: args.survey_ref,
                    },
                )
                .map_err(report)?;
            print_outcome(
                global.format,
                &survey,
                &format!("Opened survey {}", style(format_short_id(&survey.id)).cyan()),
                &[
                    format!(
                        "{} x {} held by {}",
                        survey.quantity,
                        style(&survey.item).yellow(),
                        survey.department
                    ),
                    format!("Ref: {}", survey.survey_ref),
                ],
            )
        }
        SurveyCommands::List(args) => {
            let surveys = engine
                .view(&actor, views::surveys)
                .map_err(report)?;
            let surveys: Vec<_> = surveys
                .into_iter()
                .filter(|s| !args.pending || s.status == SurveyStatus::Pending)
                .collect();
            print_list(&surveys, global.format)
        }
    }
}

pub fn run_writeoff(cmd: WriteoffCommands, global: &GlobalOpts) -> Result<()> {
    let (engine, config) = open_engine(global)?;
    let actor = operator(global, &config)?;

    match cmd {
        WriteoffCommands::Approve(args) => {
            let posting = engine
                .approve_write_off(&actor, &args.survey)
                .map_err(report)?;
            print_outcome(
                global.format,
                &posting,
                &format!(
                    "Wrote off {} x {} (survey {})",
                    posting.write_off.quantity,
                    style(&posting.write_off.item).yellow(),
                    style(format_short_id(&posting.survey.id)).cyan()
                ),
                &[format!(
                    "{} now holds {} x {}",
                    posting.holding.department,
                    style(posting.holding.quantity_held).yellow(),
                    posting.holding.item
                )],
            )
        }
        WriteoffCommands::List => {
            let write_offs = engine
                .view(&actor, views::write_offs)
                .map_err(report)?;
            print_list(&write_offs, global.format)
        }
    }
}
