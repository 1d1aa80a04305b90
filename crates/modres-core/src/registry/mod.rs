//! Registry transport.
//!
//! A registry maps (module name, version) to descriptor text and to a
//! repository rule template. Registries are identified by URL and obtained
//! from a [`RegistryFactory`]; the configured list is tried in order until
//! one of them serves the requested version.

pub mod file;
pub mod in_memory;

use std::sync::Arc;

use crate::env::ModuleFile;
use crate::errors::{ResolveError, Result};
use crate::model::{ModuleKey, RepoSpec};

pub use file::{FileRegistry, FileRegistryFactory};
pub use in_memory::{InMemoryRegistry, InMemoryRegistryFactory};

/// One module registry
pub trait Registry: Send + Sync {
    fn url(&self) -> &str;

    /// Descriptor text for `key`, or `None` if this registry lacks it
    ///
    /// # Errors
    /// Returns [`ResolveError::Registry`] when the registry cannot be read.
    fn module_file(&self, key: &ModuleKey) -> Result<Option<String>>;

    /// Whether this registry has any version of the module
    ///
    /// # Errors
    /// Returns [`ResolveError::Registry`] when the registry cannot be read.
    fn knows_module(&self, name: &str) -> Result<bool>;

    /// Repository rule template for `key`, materialized as `repo_name`
    ///
    /// # Errors
    /// Returns [`ResolveError::DescriptorNotFound`] for unknown keys and
    /// [`ResolveError::Registry`] when the registry cannot be read.
    fn repo_rule(&self, key: &ModuleKey, repo_name: &str) -> Result<RepoSpec>;
}

/// Resolves registry URLs to registries
pub trait RegistryFactory: Send + Sync {
    /// # Errors
    /// Returns [`ResolveError::Configuration`] for URLs it cannot serve.
    fn registry(&self, url: &str) -> Result<Arc<dyn Registry>>;
}

/// Fetch descriptor text for `key` from the first registry that has it.
///
/// # Errors
/// * `RegistryLookup` - no registry knows the module name
/// * `DescriptorNotFound` - a registry knows the name but not the version
/// * `Registry` - a registry could not be read
pub fn fetch_module_file(
    factory: &dyn RegistryFactory,
    registries: &[String],
    key: &ModuleKey,
) -> Result<ModuleFile> {
    let version = key
        .version()
        .ok_or_else(|| ResolveError::internal("the root module is never fetched"))?;

    let mut resolved = Vec::with_capacity(registries.len());
    for url in registries {
        let registry = factory.registry(url)?;
        if let Some(text) = registry.module_file(key)? {
            tracing::debug!(module = %key, registry = url.as_str(), "descriptor fetched");
            return Ok(ModuleFile {
                registry: url.clone(),
                text,
            });
        }
        resolved.push(registry);
    }

    for registry in &resolved {
        if registry.knows_module(&key.name)? {
            return Err(ResolveError::DescriptorNotFound {
                module: key.name.clone(),
                version: version.to_string(),
                registries: registries.to_vec(),
            });
        }
    }
    Err(ResolveError::RegistryLookup {
        module: key.name.clone(),
        registries: registries.to_vec(),
    })
}

/// Fetch the repository rule template for `key` from `registry_url`.
///
/// # Errors
/// Propagates the registry's failure.
pub fn fetch_repo_rule(
    factory: &dyn RegistryFactory,
    registry_url: &str,
    key: &ModuleKey,
    repo_name: &str,
) -> Result<RepoSpec> {
    let registry = factory.registry(registry_url)?;
    registry.repo_rule(key, repo_name)
}

/// Classify an I/O failure as transient or persistent
pub(crate) fn io_error(registry: &str, err: &std::io::Error) -> ResolveError {
    use std::io::ErrorKind;
    ResolveError::Registry {
        registry: registry.to_string(),
        message: err.to_string(),
        transient: matches!(
            err.kind(),
            ErrorKind::Interrupted | ErrorKind::TimedOut | ErrorKind::WouldBlock
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::version::Version;

    fn key(name: &str, version: &str) -> ModuleKey {
        ModuleKey::new(name, Version::parse(version).unwrap())
    }

    #[test]
    fn test_registries_are_tried_in_order() {
        let factory = InMemoryRegistryFactory::new();
        factory
            .new_registry("/first")
            .add_module(key("bbb", "1.0"), "[module]\nname = \"bbb\"\n");
        factory
            .new_registry("/second")
            .add_module(key("bbb", "1.0"), "second")
            .add_module(key("ccc", "1.0"), "ccc");

        let urls = vec!["/first".to_string(), "/second".to_string()];
        let file = fetch_module_file(&factory, &urls, &key("bbb", "1.0")).unwrap();
        assert_eq!(file.registry, "/first");

        let file = fetch_module_file(&factory, &urls, &key("ccc", "1.0")).unwrap();
        assert_eq!(file.registry, "/second");
    }

    #[test]
    fn test_missing_version_vs_missing_module() {
        let factory = InMemoryRegistryFactory::new();
        factory
            .new_registry("/r")
            .add_module(key("bbb", "1.0"), "bbb");
        let urls = vec!["/r".to_string()];

        let err = fetch_module_file(&factory, &urls, &key("bbb", "2.0")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DescriptorNotFound);

        let err = fetch_module_file(&factory, &urls, &key("zzz", "1.0")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RegistryLookup);
    }

    #[test]
    fn test_unknown_registry_url() {
        let factory = InMemoryRegistryFactory::new();
        let err = fetch_module_file(&factory, &["/nowhere".to_string()], &key("a", "1")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_io_error_classification() {
        let timeout = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no");
        assert!(io_error("/r", &timeout).is_transient());
        assert!(!io_error("/r", &denied).is_transient());
    }
}
