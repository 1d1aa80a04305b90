//! Module descriptor parsing.
//!
//! The resolver consumes descriptors through [`DescriptorParser`], a pure
//! function from text to [`ModuleDescriptor`]. [`TomlDescriptorParser`] is
//! the format shipped with this crate:
//!
//! ```toml
//! [module]
//! name = "bbb"
//! version = "1.0"
//! compatibility_level = 1
//!
//! [[deps]]
//! name = "ccc"
//! version = "2.0"
//!
//! [[overrides]]
//! kind = "single_version"
//! module_name = "ccc"
//! version = "3.0"
//! patches = ["//:foo.patch"]
//! patch_strip = 1
//! ```

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::errors::{ResolveError, Result};
use crate::model::{validate_module_name, DepEdge, ModuleDescriptor, OverrideDecl};
use crate::version::Version;

/// Turns descriptor text into a structured descriptor
pub trait DescriptorParser: Send + Sync {
    /// Parse `text`; `origin` names where the text came from and is only
    /// used in error messages.
    ///
    /// # Errors
    /// Returns [`ResolveError::Parse`] for malformed text.
    fn parse(&self, text: &str, origin: &str) -> Result<ModuleDescriptor>;
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDescriptor {
    #[serde(default)]
    module: RawModule,
    #[serde(default)]
    deps: Vec<RawDep>,
    #[serde(default)]
    overrides: Vec<OverrideDecl>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawModule {
    #[serde(default)]
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    compatibility_level: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDep {
    name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    dev_dependency: bool,
}

/// Parser for the TOML descriptor format
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlDescriptorParser;

impl DescriptorParser for TomlDescriptorParser {
    fn parse(&self, text: &str, origin: &str) -> Result<ModuleDescriptor> {
        let raw: RawDescriptor =
            toml::from_str(text).map_err(|e| ResolveError::parse(origin, e.to_string()))?;

        if !raw.module.name.is_empty() {
            validate_module_name(&raw.module.name)
                .map_err(|reason| ResolveError::parse(origin, reason))?;
        }
        let version = raw
            .module
            .version
            .as_deref()
            .map(Version::parse)
            .transpose()
            .map_err(|e| ResolveError::parse(origin, e.to_string()))?;

        let mut seen = BTreeSet::new();
        let mut deps = Vec::with_capacity(raw.deps.len());
        for dep in raw.deps {
            validate_module_name(&dep.name).map_err(|reason| ResolveError::parse(origin, reason))?;
            if !seen.insert(dep.name.clone()) {
                return Err(ResolveError::parse(
                    origin,
                    format!("duplicate dependency on '{}'", dep.name),
                ));
            }
            let version =
                Version::parse(&dep.version).map_err(|e| ResolveError::parse(origin, e.to_string()))?;
            deps.push(DepEdge {
                name: dep.name,
                version,
                dev_dependency: dep.dev_dependency,
            });
        }

        Ok(ModuleDescriptor {
            name: raw.module.name,
            version,
            compatibility_level: raw.module.compatibility_level,
            deps,
            overrides: raw.overrides,
        })
    }
}
