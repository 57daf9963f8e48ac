pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::product::ProductCommand;

#[derive(Debug, Parser)]
#[command(
    name = "catalog",
    about = "Product catalog operator CLI",
    long_about = "Inspect configuration, check catalog storage readiness, and create, read, update, or delete products in the catalog file.",
    after_help = "Examples:\n  catalog doctor --json\n  catalog product create --id sku-1 --name Mug\n  catalog product list --page 2"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
    #[command(about = "Validate config and check that the catalog file can be read and replaced")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(subcommand, about = "Create, fetch, list, update, or delete products")]
    Product(ProductCommand),
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Product(command) => commands::product::run(command),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
