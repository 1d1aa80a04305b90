use std::fmt;

use crate::version::Version;

/// Version component of a [`ModuleKey`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyVersion {
    /// The root module, which is read from the workspace and never versioned
    Root,
    Version(Version),
}

/// Identity of one module instance in the dependency graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleKey {
    pub name: String,
    pub version: KeyVersion,
}

impl ModuleKey {
    /// Key of a registry module
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version: KeyVersion::Version(version),
        }
    }

    /// Key of the root module
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: KeyVersion::Root,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self.version, KeyVersion::Root)
    }

    /// The version, or `None` for the root
    pub fn version(&self) -> Option<&Version> {
        match &self.version {
            KeyVersion::Root => None,
            KeyVersion::Version(v) => Some(v),
        }
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            KeyVersion::Root => write!(f, "<root>"),
            KeyVersion::Version(v) => write!(f, "{}@{}", self.name, v),
        }
    }
}
