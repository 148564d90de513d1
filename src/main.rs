use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;

use dlms::cli::commands;
use dlms::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();

    let default_level = if cli.global.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let global = &cli.global;
    match cli.command {
        Commands::Init(args) => commands::init::run(args, global),
        Commands::User(cmd) => commands::user::run(cmd, global),
        Commands::Dept(cmd) => commands::dept::run(cmd, global),
        Commands::Item(cmd) => commands::item::run(cmd, global),
        Commands::Request(cmd) => commands::request::run(cmd, global),
        Commands::Return(cmd) => commands::ret::run(cmd, global),
        Commands::Survey(cmd) => commands::survey::run(cmd, global),
        Commands::Writeoff(cmd) => commands::survey::run_writeoff(cmd, global),
        Commands::Consumable(cmd) => commands::consumable::run(cmd, global),
        Commands::Ledger => commands::view::run_ledger(global),
        Commands::Pll => commands::view::run_pll(global),
        Commands::Dashboard => commands::view::run_dashboard(global),
        Commands::Completions(args) => commands::view::run_completions(args),
    }
}
