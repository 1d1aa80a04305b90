//! Override table.
//!
//! Extracted once from the root descriptor before anything is fetched, then
//! read-only. Configured overrides are merged in underneath the root's own
//! declarations.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::ResolverConfig;
use crate::errors::{ResolveError, Result};
use crate::model::{validate_module_name, ModuleDescriptor, OverrideDecl, PatchStrip};
use crate::version::Version;

/// A validated `single_version_override`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleVersionOverride {
    pub module_name: String,
    /// Pinned version; `None` leaves selection to the normal policy
    pub version: Option<Version>,
    pub registry: Option<String>,
    pub patches: Vec<String>,
    pub patch_cmds: Vec<String>,
    pub patch_strip: u32,
}

impl SingleVersionOverride {
    /// Whether the override carries anything to merge into a repo spec
    pub fn has_patches(&self) -> bool {
        !self.patches.is_empty() || !self.patch_cmds.is_empty()
    }
}

/// A validated override directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideDirective {
    LocalPath {
        module_name: String,
        path: String,
    },
    SingleVersion(SingleVersionOverride),
    MultipleVersion {
        module_name: String,
        versions: BTreeSet<Version>,
        registry: Option<String>,
    },
    Registry {
        module_name: String,
        registry: String,
    },
}

impl OverrideDirective {
    pub fn module_name(&self) -> &str {
        match self {
            OverrideDirective::LocalPath { module_name, .. }
            | OverrideDirective::MultipleVersion { module_name, .. }
            | OverrideDirective::Registry { module_name, .. } => module_name,
            OverrideDirective::SingleVersion(svo) => &svo.module_name,
        }
    }

    /// Registry pinned by this directive, if any
    pub fn registry(&self) -> Option<&str> {
        match self {
            OverrideDirective::LocalPath { .. } => None,
            OverrideDirective::SingleVersion(svo) => svo.registry.as_deref(),
            OverrideDirective::MultipleVersion { registry, .. } => registry.as_deref(),
            OverrideDirective::Registry { registry, .. } => Some(registry),
        }
    }

    fn from_decl(decl: &OverrideDecl) -> Result<Self> {
        validate_module_name(decl.module_name()).map_err(|reason| {
            ResolveError::configuration(format!("{}: {}", decl.label(), reason))
        })?;
        let directive = match decl {
            OverrideDecl::LocalPath { module_name, path } => {
                if path.is_empty() {
                    return Err(ResolveError::configuration(format!(
                        "local_path_override for '{module_name}' has an empty path"
                    )));
                }
                OverrideDirective::LocalPath {
                    module_name: module_name.clone(),
                    path: path.clone(),
                }
            }
            OverrideDecl::SingleVersion {
                module_name,
                version,
                registry,
                patches,
                patch_cmds,
                patch_strip,
            } => {
                let version = match version.as_deref() {
                    None | Some("") => None,
                    Some(raw) => Some(parse_override_version(module_name, raw)?),
                };
                OverrideDirective::SingleVersion(SingleVersionOverride {
                    module_name: module_name.clone(),
                    version,
                    registry: registry.clone(),
                    patches: patches.clone(),
                    patch_cmds: patch_cmds.clone(),
                    patch_strip: parse_patch_strip(module_name, patch_strip.as_ref())?,
                })
            }
            OverrideDecl::MultipleVersion {
                module_name,
                versions,
                registry,
            } => {
                if versions.is_empty() {
                    return Err(ResolveError::configuration(format!(
                        "multiple_version_override for '{module_name}' lists no versions"
                    )));
                }
                let versions = versions
                    .iter()
                    .map(|raw| parse_override_version(module_name, raw))
                    .collect::<Result<BTreeSet<_>>>()?;
                OverrideDirective::MultipleVersion {
                    module_name: module_name.clone(),
                    versions,
                    registry: registry.clone(),
                }
            }
            OverrideDecl::Registry {
                module_name,
                registry,
            } => OverrideDirective::Registry {
                module_name: module_name.clone(),
                registry: registry.clone(),
            },
        };
        Ok(directive)
    }
}

fn parse_override_version(module_name: &str, raw: &str) -> Result<Version> {
    Version::parse(raw)
        .map_err(|e| ResolveError::configuration(format!("override for '{module_name}': {e}")))
}

fn parse_patch_strip(module_name: &str, raw: Option<&PatchStrip>) -> Result<u32> {
    let invalid = |shown: String| {
        ResolveError::configuration(format!(
            "single_version_override for '{module_name}': patch_strip must be a non-negative integer, got '{shown}'"
        ))
    };
    match raw {
        None => Ok(0),
        Some(PatchStrip::Number(n)) => u32::try_from(*n).map_err(|_| invalid(n.to_string())),
        Some(PatchStrip::Text(s)) => s.trim().parse::<u32>().map_err(|_| invalid(s.clone())),
    }
}

/// Reject a second declaration for the same module name
fn check_unique<'a>(
    seen: &mut BTreeMap<&'a str, &'a OverrideDecl>,
    decl: &'a OverrideDecl,
) -> Result<()> {
    if let Some(existing) = seen.get(decl.module_name()) {
        let module = decl.module_name().to_string();
        return Err(if existing.style() == decl.style() {
            ResolveError::DuplicateOverride { module }
        } else {
            ResolveError::ConflictingOverrideKind {
                module,
                first: existing.label().to_string(),
                second: decl.label().to_string(),
            }
        });
    }
    seen.insert(decl.module_name(), decl);
    Ok(())
}

/// Module name → override directive
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideTable {
    directives: BTreeMap<String, OverrideDirective>,
}

impl OverrideTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the table from the root descriptor and configured overrides
    ///
    /// # Errors
    /// * `DuplicateOverride` - a name has two overrides of the same style
    /// * `ConflictingOverrideKind` - a name has a path and a version override
    /// * `Configuration` - a malformed override attribute
    pub fn extract(root: &ModuleDescriptor, config: &ResolverConfig) -> Result<Self> {
        let mut declared = BTreeMap::new();
        for decl in &root.overrides {
            check_unique(&mut declared, decl)?;
        }
        let mut injected = BTreeMap::new();
        for decl in &config.module_overrides {
            check_unique(&mut injected, decl)?;
        }

        let mut directives = BTreeMap::new();
        for (name, decl) in &declared {
            directives.insert(name.to_string(), OverrideDirective::from_decl(decl)?);
        }
        for (name, decl) in &injected {
            if directives.contains_key(*name) {
                tracing::debug!(
                    module = *name,
                    "configured override shadowed by root declaration"
                );
                continue;
            }
            directives.insert(name.to_string(), OverrideDirective::from_decl(decl)?);
        }

        Ok(Self { directives })
    }

    pub fn get(&self, name: &str) -> Option<&OverrideDirective> {
        self.directives.get(name)
    }

    /// Whether the name is replaced by a local path and never fetched
    pub fn is_local_path(&self, name: &str) -> bool {
        matches!(self.get(name), Some(OverrideDirective::LocalPath { .. }))
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OverrideDirective> {
        self.directives.values()
    }
}
