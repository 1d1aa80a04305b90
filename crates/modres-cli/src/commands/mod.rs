pub mod repo_spec;
pub mod resolve;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use modres_core::{
    FileRegistryFactory, ModuleResolver, RegistryFactory, ResolverConfig, TomlDescriptorParser,
};

/// Inputs shared by every command
#[derive(Debug, Args)]
pub struct RootArgs {
    /// Root module descriptor
    #[arg(long, default_value = "MODULE.toml")]
    pub root: PathBuf,

    /// Resolver config file (missing file means defaults)
    #[arg(long, default_value = "modres.toml")]
    pub config: PathBuf,

    /// Registry directory or file:// URL; repeat to search several in order.
    /// Replaces the registries from the config file.
    #[arg(long = "registry")]
    pub registries: Vec<String>,
}

impl RootArgs {
    /// Build a resolver over local file registries
    pub fn resolver(&self) -> Result<ModuleResolver, Box<dyn std::error::Error>> {
        let mut config = ResolverConfig::load(&self.config)?;
        if !self.registries.is_empty() {
            config.registries = self.registries.clone();
        }
        tracing::debug!(
            root = %self.root.display(),
            registries = ?config.registries,
            "building resolver"
        );

        self.check_registries(&config.registries)?;

        let text = std::fs::read_to_string(&self.root)
            .map_err(|e| format!("failed to read {}: {}", self.root.display(), e))?;
        let resolver = ModuleResolver::new(
            &text,
            Arc::new(TomlDescriptorParser),
            Arc::new(FileRegistryFactory),
            config,
        )?;
        Ok(resolver)
    }

    /// Fail before resolving unless every registry can be served from disk
    fn check_registries(&self, registries: &[String]) -> Result<(), Box<dyn std::error::Error>> {
        let hint = format!(
            "pass --registry <DIR> or list registry directories in {}",
            self.config.display()
        );
        if registries.is_empty() {
            return Err(format!("no usable registry: none configured; {hint}").into());
        }
        for url in registries {
            if let Err(e) = FileRegistryFactory.registry(url) {
                return Err(format!("no usable registry: {e}; {hint}").into());
            }
        }
        Ok(())
    }
}
