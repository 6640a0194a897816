mod adapters;
mod cli;
mod config;
mod core;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let args = Cli::parse();

    let result = match &args.command {
        Commands::Run { interval } => cli::commands::run::execute(&args, *interval),
        Commands::Sync => cli::commands::sync::execute(&args),
        Commands::Status => cli::commands::status::execute(&args),
    };

    if let Err(e) = result {
        cli::output::error(&format!("Error: {e}"));
        std::process::exit(1);
    }
}
