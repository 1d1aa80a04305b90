//! Resolve command
//!
//! Usage: modres resolve [--root <FILE>] [--config <FILE>] [--registry <URL>]... [--json]

use clap::Args;
use serde::Serialize;

use super::RootArgs;
use modres_core::ResolvedModule;

#[derive(Debug, Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub root: RootArgs,

    /// Print the resolution as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ResolveOutput<'a> {
    root: &'a str,
    modules: &'a [ResolvedModule],
    warnings: Vec<String>,
}

/// Execute resolve command
pub fn execute(args: ResolveArgs) -> Result<(), Box<dyn std::error::Error>> {
    let resolver = args.root.resolver()?;
    let resolution = resolver.resolve()?;

    if args.json {
        let output = ResolveOutput {
            root: &resolution.root,
            modules: &resolution.modules,
            warnings: resolution.warnings.iter().map(|w| w.to_string()).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for module in &resolution.modules {
        match &module.registry {
            Some(registry) => println!("{} ({})", module.canonical_name, registry),
            None => println!("{}", module.canonical_name),
        }
    }
    for warning in &resolution.warnings {
        eprintln!("warning: {}", warning);
    }
    Ok(())
}
