//! Resolver configuration.
//!
//! One [`ResolverConfig`] is frozen for the duration of an evaluation and
//! threaded into every stage. It can be built in code or loaded from TOML:
//!
//! ```toml
//! registries = ["https://bcr.example.com", "file:///opt/registry"]
//! ignore_dev_dependencies = true
//! check_direct_dependencies = "error"
//! compatibility_mode = "warning"
//!
//! [[module_overrides]]
//! kind = "local_path"
//! module_name = "ccc"
//! path = "/src/ccc"
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{ResolveError, Result};
use crate::model::OverrideDecl;

/// Registry used when configuration names none
pub const DEFAULT_REGISTRY: &str = "https://bcr.bazel.build";

/// How a selection check reacts to a violation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckMode {
    /// Fail the affected module
    Error,
    /// Continue and surface a warning
    #[default]
    Warning,
    /// Continue silently
    Off,
}

impl fmt::Display for CheckMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Off => write!(f, "off"),
        }
    }
}

/// Evaluation-scoped resolver settings
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Registries tried in order for every module without a registry pin
    #[serde(default = "default_registries")]
    pub registries: Vec<String>,

    /// Overrides injected from outside the root descriptor. Root
    /// declarations win when both name the same module.
    #[serde(default)]
    pub module_overrides: Vec<OverrideDecl>,

    /// Drop the root's dev dependencies from traversal
    #[serde(default)]
    pub ignore_dev_dependencies: bool,

    /// Reaction to a root direct dependency resolving to another version
    #[serde(default)]
    pub check_direct_dependencies: CheckMode,

    /// Reaction to a selection that changes a dependent's compatibility level
    #[serde(default = "default_compatibility_mode")]
    pub compatibility_mode: CheckMode,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            registries: default_registries(),
            module_overrides: Vec::new(),
            ignore_dev_dependencies: false,
            check_direct_dependencies: CheckMode::default(),
            compatibility_mode: default_compatibility_mode(),
        }
    }
}

fn default_registries() -> Vec<String> {
    vec![DEFAULT_REGISTRY.to_owned()]
}

fn default_compatibility_mode() -> CheckMode {
    CheckMode::Error
}

impl ResolverConfig {
    /// Config using exactly the given registries
    pub fn with_registries<I, S>(registries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            registries: registries.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Parse config from TOML text
    ///
    /// # Errors
    /// Returns [`ResolveError::Configuration`] for malformed TOML, unknown
    /// keys or an empty registry list.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| ResolveError::configuration(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a TOML file. A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns [`ResolveError::Configuration`] if the file cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ResolveError::configuration(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.registries.is_empty() {
            return Err(ResolveError::configuration(
                "at least one registry must be configured",
            ));
        }
        if let Some(blank) = self.registries.iter().find(|r| r.trim().is_empty()) {
            return Err(ResolveError::configuration(format!(
                "registry url '{blank}' is blank"
            )));
        }
        Ok(())
    }
}
