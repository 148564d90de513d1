//! `dlms user` command - operators and roles

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{open_engine, operator};
use crate::cli::output::{print_outcome, report};
use crate::cli::table::print_list;
use crate::cli::GlobalOpts;
use crate::core::{Role, User};

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Register a user (Admin only, except for the very first user)
    Add(AddArgs),

    /// List users
    List,

    /// Show the current operator and their role
    Whoami,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Login name
    pub username: String,

    /// Role of the new user
    #[arg(long, short = 'r', value_enum)]
    pub role: Role,

    /// Owning department (required for department users)
    #[arg(long, short = 'd')]
    pub department: Option<String>,
}

pub fn run(cmd: UserCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        UserCommands::Add(args) => run_add(args, global),
        UserCommands::List => run_list(global),
        UserCommands::Whoami => run_whoami(global),
    }
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let (engine, config) = open_engine(global)?;
    let actor = global.user.clone().or(config.default_user.clone());

    let user = engine
        .add_user(
            actor.as_deref(),
            User {
                username: args.username,
                role: args.role,
                department: args.department,
            },
        )
        .map_err(report)?;

    let mut details = vec![format!("Role: {}", style(user.role).yellow())];
    if let Some(dept) = &user.department {
        details.push(format!("Department: {}", style(dept).yellow()));
    }
    print_outcome(
        global.format,
        &user,
        &format!("Added user {}", style(&user.username).cyan()),
        &details,
    )
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let (engine, config) = open_engine(global)?;
    let actor = operator(global, &config)?;
    let users = engine
        .view(&actor, |snap, _| snap.users.rows().to_vec())
        .map_err(report)?;
    print_list(&users, global.format)
}

fn run_whoami(global: &GlobalOpts) -> Result<()> {
    let (engine, config) = open_engine(global)?;
    let actor = operator(global, &config)?;
    let user = engine.whoami(&actor).map_err(report)?;

    let summary = match &user.department {
        Some(dept) => format!(
            "{} ({}, {})",
            style(&user.username).cyan(),
            user.role,
            dept
        ),
        None => format!("{} ({})", style(&user.username).cyan(), user.role),
    };
    print_outcome(global.format, &user, &summary, &[])
}
