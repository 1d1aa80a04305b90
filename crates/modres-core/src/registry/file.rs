//! Directory-backed registry.
//!
//! Layout under the registry root:
//!
//! ```text
//! modules/<name>/<version>/MODULE.toml   descriptor text
//! modules/<name>/<version>/source.toml   optional repo rule template
//! ```
//!
//! Without a `source.toml`, the template is a `local_repository` at
//! `<root>/<canonical name>`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{io_error, Registry, RegistryFactory};
use crate::errors::{ResolveError, Result};
use crate::model::{ModuleKey, RepoSpec};

const MODULE_FILE: &str = "MODULE.toml";
const SOURCE_FILE: &str = "source.toml";

/// Registry stored in a local directory
#[derive(Debug, Clone)]
pub struct FileRegistry {
    url: String,
    root: PathBuf,
}

impl FileRegistry {
    pub fn new(url: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn version_dir(&self, key: &ModuleKey) -> Result<PathBuf> {
        let version = key
            .version()
            .ok_or_else(|| ResolveError::internal("the root module is never fetched"))?;
        Ok(self
            .root
            .join("modules")
            .join(&key.name)
            .join(version.as_str()))
    }

    fn read_optional(&self, path: &Path) -> Result<Option<String>> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&self.url, &e)),
        }
    }
}

impl Registry for FileRegistry {
    fn url(&self) -> &str {
        &self.url
    }

    fn module_file(&self, key: &ModuleKey) -> Result<Option<String>> {
        let path = self.version_dir(key)?.join(MODULE_FILE);
        self.read_optional(&path)
    }

    fn knows_module(&self, name: &str) -> Result<bool> {
        Ok(self.root.join("modules").join(name).is_dir())
    }

    fn repo_rule(&self, key: &ModuleKey, repo_name: &str) -> Result<RepoSpec> {
        let dir = self.version_dir(key)?;
        if let Some(text) = self.read_optional(&dir.join(SOURCE_FILE))? {
            return toml::from_str(&text).map_err(|e| ResolveError::Registry {
                registry: self.url.clone(),
                message: format!("malformed {SOURCE_FILE} for {key}: {e}"),
                transient: false,
            });
        }
        if !dir.join(MODULE_FILE).is_file() {
            return Err(ResolveError::DescriptorNotFound {
                module: key.name.clone(),
                version: key.version().map(|v| v.to_string()).unwrap_or_default(),
                registries: vec![self.url.clone()],
            });
        }
        Ok(RepoSpec::local_repository(
            repo_name,
            self.root.join(repo_name).to_string_lossy().into_owned(),
        ))
    }
}

/// Factory for `file://` URLs and plain directory paths
#[derive(Debug, Clone, Copy, Default)]
pub struct FileRegistryFactory;

impl RegistryFactory for FileRegistryFactory {
    fn registry(&self, url: &str) -> Result<Arc<dyn Registry>> {
        let path = match url.strip_prefix("file://") {
            Some(path) => path,
            None if url.contains("://") => {
                return Err(ResolveError::configuration(format!(
                    "unsupported registry url '{url}': only file:// and local paths are supported"
                )))
            }
            None => url,
        };
        Ok(Arc::new(FileRegistry::new(url, path)))
    }
}
