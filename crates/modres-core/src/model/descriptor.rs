use serde::{Deserialize, Serialize};

use crate::version::Version;

/// Structured module descriptor, as produced by a descriptor parser
///
/// Descriptors are immutable once parsed. Only the root descriptor's
/// override declarations are honored.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDescriptor {
    pub name: String,
    /// `None` only for a root module that does not declare a version
    pub version: Option<Version>,
    pub compatibility_level: u32,
    pub deps: Vec<DepEdge>,
    pub overrides: Vec<OverrideDecl>,
}

impl ModuleDescriptor {
    pub fn new(name: impl Into<String>, version: Option<Version>) -> Self {
        Self {
            name: name.into(),
            version,
            compatibility_level: 0,
            deps: Vec::new(),
            overrides: Vec::new(),
        }
    }

    /// Dependency edges that take part in traversal
    ///
    /// Dev dependencies only count for the root, and only when they are not
    /// ignored by configuration.
    pub fn traversed_deps(
        &self,
        is_root: bool,
        ignore_dev_dependencies: bool,
    ) -> impl Iterator<Item = &DepEdge> {
        let keep_dev = is_root && !ignore_dev_dependencies;
        self.deps
            .iter()
            .filter(move |dep| keep_dev || !dep.dev_dependency)
    }
}

/// A declared dependency on another module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepEdge {
    pub name: String,
    pub version: Version,
    pub dev_dependency: bool,
}

impl DepEdge {
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            dev_dependency: false,
        }
    }
}

/// `patch_strip` as written in a descriptor or config file
///
/// Kept raw so that a malformed value is reported while extracting the
/// override table rather than while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatchStrip {
    Number(i64),
    Text(String),
}

/// Override declaration as written in the root descriptor or in config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverrideDecl {
    LocalPath {
        module_name: String,
        path: String,
    },
    SingleVersion {
        module_name: String,
        #[serde(default)]
        version: Option<String>,
        #[serde(default)]
        registry: Option<String>,
        #[serde(default)]
        patches: Vec<String>,
        #[serde(default)]
        patch_cmds: Vec<String>,
        #[serde(default)]
        patch_strip: Option<PatchStrip>,
    },
    MultipleVersion {
        module_name: String,
        versions: Vec<String>,
        #[serde(default)]
        registry: Option<String>,
    },
    Registry {
        module_name: String,
        registry: String,
    },
}

/// Whether an override replaces the source of a module or constrains its
/// version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideStyle {
    Path,
    Version,
}

impl OverrideDecl {
    pub fn module_name(&self) -> &str {
        match self {
            OverrideDecl::LocalPath { module_name, .. }
            | OverrideDecl::SingleVersion { module_name, .. }
            | OverrideDecl::MultipleVersion { module_name, .. }
            | OverrideDecl::Registry { module_name, .. } => module_name,
        }
    }

    pub fn style(&self) -> OverrideStyle {
        match self {
            OverrideDecl::LocalPath { .. } => OverrideStyle::Path,
            OverrideDecl::SingleVersion { .. }
            | OverrideDecl::MultipleVersion { .. }
            | OverrideDecl::Registry { .. } => OverrideStyle::Version,
        }
    }

    /// Directive name as users write it
    pub fn label(&self) -> &'static str {
        match self {
            OverrideDecl::LocalPath { .. } => "local_path_override",
            OverrideDecl::SingleVersion { .. } => "single_version_override",
            OverrideDecl::MultipleVersion { .. } => "multiple_version_override",
            OverrideDecl::Registry { .. } => "registry_override",
        }
    }
}

/// Check a module name: lowercase letter first, then lowercase letters,
/// digits, `.`, `_` or `-`, not ending in a separator.
///
/// # Errors
/// Returns a human-readable reason when the name is invalid.
pub fn validate_module_name(name: &str) -> Result<(), String> {
    let mut chars = name.chars();
    match chars.next() {
        None => return Err("module name is empty".to_string()),
        Some(c) if !c.is_ascii_lowercase() => {
            return Err(format!(
                "module name '{}' must start with a lowercase letter",
                name
            ))
        }
        Some(_) => {}
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-')))
    {
        return Err(format!(
            "module name '{}' contains invalid character '{}'",
            name, bad
        ));
    }
    if name.ends_with(['.', '_', '-']) {
        return Err(format!(
            "module name '{}' must end with a letter or digit",
            name
        ));
    }
    Ok(())
}
