//! Canonical repository names.
//!
//! A canonical name is `<module>~<version>` for a registry-resolved module
//! and `<module>~override` for a module replaced by a local path. The same
//! string is the lookup key for repository specs and the name of the
//! materialized repository.

use std::fmt;

use crate::version::Version;

/// Marker used in place of a version for local path overrides
pub const OVERRIDE_MARKER: &str = "override";

const SEPARATOR: char = '~';

/// A version that survived selection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LiveVersion {
    /// Synthetic version of a module replaced by a local path
    Override,
    Version(Version),
}

impl LiveVersion {
    pub fn as_version(&self) -> Option<&Version> {
        match self {
            LiveVersion::Override => None,
            LiveVersion::Version(v) => Some(v),
        }
    }
}

impl fmt::Display for LiveVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiveVersion::Override => f.write_str(OVERRIDE_MARKER),
            LiveVersion::Version(v) => write!(f, "{}", v),
        }
    }
}

/// Build the canonical repository name for a live module version
pub fn canonical_repo_name(module: &str, live: &LiveVersion) -> String {
    format!("{}{}{}", module, SEPARATOR, live)
}

/// Split a canonical repository name into module name and version marker.
///
/// Returns `None` for names without a `~`.
pub fn split_canonical_name(name: &str) -> Option<(&str, &str)> {
    name.split_once(SEPARATOR)
}
