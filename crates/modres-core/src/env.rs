//! Contract with the evaluation substrate.
//!
//! Resolution stages never block on I/O. They ask an [`Environment`] for
//! fetched values; when a value is not available yet the environment
//! answers `Ok(None)`, records the request, and the stage gives up with
//! [`Computed::ValuesMissing`]. The substrate fulfils the recorded requests
//! and runs the stage again from the top, so stages must not keep state
//! between invocations.

use crate::errors::Result;
use crate::model::{ModuleKey, RepoSpec};

/// Outcome of a stage that may be waiting on fetches
#[derive(Debug, Clone, PartialEq)]
pub enum Computed<T> {
    Ready(T),
    ValuesMissing,
}

impl<T> Computed<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Computed::Ready(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Computed<U> {
        match self {
            Computed::Ready(v) => Computed::Ready(f(v)),
            Computed::ValuesMissing => Computed::ValuesMissing,
        }
    }

    /// The ready value, if any
    pub fn ready(self) -> Option<T> {
        match self {
            Computed::Ready(v) => Some(v),
            Computed::ValuesMissing => None,
        }
    }
}

/// Unwrap a [`Computed`] or return `Ok(Computed::ValuesMissing)` from the
/// enclosing function.
#[macro_export]
macro_rules! ready {
    ($e:expr) => {
        match $e {
            $crate::env::Computed::Ready(v) => v,
            $crate::env::Computed::ValuesMissing => {
                return Ok($crate::env::Computed::ValuesMissing)
            }
        }
    };
}

/// Request for a module's descriptor text
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleFileRequest {
    pub key: ModuleKey,
    /// Registry pinned by an override; otherwise the configured list is used
    pub registry: Option<String>,
}

/// Descriptor text together with the registry that served it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFile {
    pub registry: String,
    pub text: String,
}

/// Request for a registry's repository rule template
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoRuleRequest {
    pub registry: String,
    pub key: ModuleKey,
    pub repo_name: String,
}

/// Source of fetched values for resolution stages
pub trait Environment {
    /// Descriptor text for `request.key`, or `None` if not fetched yet
    ///
    /// # Errors
    /// Returns the fetch failure once the substrate has attempted the fetch.
    fn module_file(&self, request: &ModuleFileRequest) -> Result<Option<ModuleFile>>;

    /// Repository rule template, or `None` if not fetched yet
    ///
    /// # Errors
    /// Returns the fetch failure once the substrate has attempted the fetch.
    fn repo_rule(&self, request: &RepoRuleRequest) -> Result<Option<RepoSpec>>;
}
