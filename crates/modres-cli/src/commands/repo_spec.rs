//! Repo spec command
//!
//! Usage: modres repo-spec <CANONICAL_NAME> [--root <FILE>] [--config <FILE>] [--registry <URL>]...

use clap::Args;

use super::RootArgs;

#[derive(Debug, Args)]
pub struct RepoSpecArgs {
    /// Canonical repository name, e.g. `ccc~1.2`
    pub name: String,

    #[command(flatten)]
    pub root: RootArgs,
}

/// Execute repo-spec command
pub fn execute(args: RepoSpecArgs) -> Result<(), Box<dyn std::error::Error>> {
    let resolver = args.root.resolver()?;

    match resolver.get_repo_spec(&args.name)? {
        Some(spec) => println!("{}", serde_json::to_string_pretty(&spec)?),
        None => return Err(format!("no repository named '{}'", args.name).into()),
    }
    Ok(())
}
