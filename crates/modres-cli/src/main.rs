//! modres CLI
//!
//! Command-line front end for the module dependency resolver

use clap::{Parser, Subcommand};
use modres_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "modres")]
#[command(about = "modres - External module dependency resolution", long_about = None)]
struct Cli {
    /// Emit JSON log lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve the full dependency graph of a root module
    Resolve(commands::resolve::ResolveArgs),
    /// Print the repository spec for one canonical repository name
    RepoSpec(commands::repo_spec::RepoSpecArgs),
}

fn main() {
    let cli = Cli::parse();

    init(if cli.log_json {
        Profile::Production
    } else {
        Profile::Development
    });

    let result = match cli.command {
        Commands::Resolve(args) => commands::resolve::execute(args),
        Commands::RepoSpec(args) => commands::repo_spec::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
