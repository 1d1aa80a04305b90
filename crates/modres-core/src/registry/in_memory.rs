//! Registry held entirely in memory.
//!
//! Used by tests and by embedders that already have descriptors at hand.
//! Unless a module has an explicit repo rule, its template is a
//! `local_repository` at `<url>/<canonical name>`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};

use super::{Registry, RegistryFactory};
use crate::errors::{ResolveError, Result};
use crate::model::{ModuleKey, RepoSpec};

/// In-memory registry
#[derive(Debug)]
pub struct InMemoryRegistry {
    url: String,
    modules: RwLock<BTreeMap<ModuleKey, String>>,
    repo_rules: RwLock<BTreeMap<ModuleKey, RepoSpec>>,
    failures: RwLock<BTreeMap<ModuleKey, ResolveError>>,
    module_fetches: Mutex<Vec<ModuleKey>>,
    repo_rule_fetches: Mutex<Vec<ModuleKey>>,
}

fn poisoned(url: &str) -> ResolveError {
    ResolveError::internal(format!("registry {url}: lock poisoned"))
}

impl InMemoryRegistry {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            modules: RwLock::new(BTreeMap::new()),
            repo_rules: RwLock::new(BTreeMap::new()),
            failures: RwLock::new(BTreeMap::new()),
            module_fetches: Mutex::new(Vec::new()),
            repo_rule_fetches: Mutex::new(Vec::new()),
        }
    }

    /// Add or replace a module's descriptor text
    pub fn add_module(&self, key: ModuleKey, text: impl Into<String>) -> &Self {
        if let Ok(mut modules) = self.modules.write() {
            modules.insert(key, text.into());
        }
        self
    }

    /// Serve `spec` as the repo rule template for `key`
    pub fn add_repo_rule(&self, key: ModuleKey, spec: RepoSpec) -> &Self {
        if let Ok(mut rules) = self.repo_rules.write() {
            rules.insert(key, spec);
        }
        self
    }

    /// Make every fetch of `key` fail with `err` until cleared
    pub fn fail_module(&self, key: ModuleKey, err: ResolveError) -> &Self {
        if let Ok(mut failures) = self.failures.write() {
            failures.insert(key, err);
        }
        self
    }

    pub fn clear_failures(&self) {
        if let Ok(mut failures) = self.failures.write() {
            failures.clear();
        }
    }

    /// Keys whose descriptors were fetched, in fetch order
    pub fn module_fetches(&self) -> Vec<ModuleKey> {
        self.module_fetches
            .lock()
            .map(|f| f.clone())
            .unwrap_or_default()
    }

    /// Keys whose repo rules were fetched, in fetch order
    pub fn repo_rule_fetches(&self) -> Vec<ModuleKey> {
        self.repo_rule_fetches
            .lock()
            .map(|f| f.clone())
            .unwrap_or_default()
    }

    fn check_failure(&self, key: &ModuleKey) -> Result<()> {
        let failures = self.failures.read().map_err(|_| poisoned(&self.url))?;
        match failures.get(key) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl Registry for InMemoryRegistry {
    fn url(&self) -> &str {
        &self.url
    }

    fn module_file(&self, key: &ModuleKey) -> Result<Option<String>> {
        if let Ok(mut fetches) = self.module_fetches.lock() {
            fetches.push(key.clone());
        }
        self.check_failure(key)?;
        let modules = self.modules.read().map_err(|_| poisoned(&self.url))?;
        Ok(modules.get(key).cloned())
    }

    fn knows_module(&self, name: &str) -> Result<bool> {
        let modules = self.modules.read().map_err(|_| poisoned(&self.url))?;
        Ok(modules.keys().any(|k| k.name == name))
    }

    fn repo_rule(&self, key: &ModuleKey, repo_name: &str) -> Result<RepoSpec> {
        if let Ok(mut fetches) = self.repo_rule_fetches.lock() {
            fetches.push(key.clone());
        }
        self.check_failure(key)?;
        let rules = self.repo_rules.read().map_err(|_| poisoned(&self.url))?;
        if let Some(spec) = rules.get(key) {
            return Ok(spec.clone());
        }
        let modules = self.modules.read().map_err(|_| poisoned(&self.url))?;
        if !modules.contains_key(key) {
            return Err(ResolveError::DescriptorNotFound {
                module: key.name.clone(),
                version: key.version().map(|v| v.to_string()).unwrap_or_default(),
                registries: vec![self.url.clone()],
            });
        }
        Ok(RepoSpec::local_repository(
            repo_name,
            format!("{}/{}", self.url, repo_name),
        ))
    }
}

/// Factory handing out [`InMemoryRegistry`] instances by URL
#[derive(Debug, Default)]
pub struct InMemoryRegistryFactory {
    registries: RwLock<BTreeMap<String, Arc<InMemoryRegistry>>>,
}

impl InMemoryRegistryFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or replace) the registry served at `url`
    pub fn new_registry(&self, url: impl Into<String>) -> Arc<InMemoryRegistry> {
        let url = url.into();
        let registry = Arc::new(InMemoryRegistry::new(url.clone()));
        if let Ok(mut registries) = self.registries.write() {
            registries.insert(url, registry.clone());
        }
        registry
    }
}

impl RegistryFactory for InMemoryRegistryFactory {
    fn registry(&self, url: &str) -> Result<Arc<dyn Registry>> {
        let registries = self
            .registries
            .read()
            .map_err(|_| ResolveError::internal("registry factory lock poisoned"))?;
        match registries.get(url) {
            Some(registry) => Ok(registry.clone() as Arc<dyn Registry>),
            None => Err(ResolveError::configuration(format!(
                "unknown registry '{url}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;

    fn key(name: &str, version: &str) -> ModuleKey {
        ModuleKey::new(name, Version::parse(version).unwrap())
    }

    #[test]
    fn test_default_repo_rule_is_local_repository_under_url() {
        let registry = InMemoryRegistry::new("/usr/local/modules");
        registry.add_module(key("ccc", "2.0"), "");
        let spec = registry.repo_rule(&key("ccc", "2.0"), "ccc~2.0").unwrap();
        assert_eq!(
            spec,
            RepoSpec::local_repository("ccc~2.0", "/usr/local/modules/ccc~2.0")
        );
    }

    #[test]
    fn test_repo_rule_for_unknown_key_fails() {
        let registry = InMemoryRegistry::new("/r");
        assert!(registry.repo_rule(&key("ccc", "2.0"), "ccc~2.0").is_err());
    }

    #[test]
    fn test_fetches_are_recorded() {
        let registry = InMemoryRegistry::new("/r");
        registry.add_module(key("ccc", "2.0"), "");
        registry.module_file(&key("ccc", "2.0")).unwrap();
        registry.module_file(&key("ddd", "1.0")).unwrap();
        assert_eq!(
            registry.module_fetches(),
            vec![key("ccc", "2.0"), key("ddd", "1.0")]
        );
    }

    #[test]
    fn test_injected_failure() {
        let registry = InMemoryRegistry::new("/r");
        registry.add_module(key("ccc", "2.0"), "").fail_module(
            key("ccc", "2.0"),
            ResolveError::Registry {
                registry: "/r".to_string(),
                message: "timed out".to_string(),
                transient: true,
            },
        );
        assert!(registry.module_file(&key("ccc", "2.0")).is_err());
        registry.clear_failures();
        assert!(registry.module_file(&key("ccc", "2.0")).unwrap().is_some());
    }
}
