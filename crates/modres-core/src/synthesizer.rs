//! Repository spec synthesis.
//!
//! Maps a canonical repository name back to the live module version it
//! names and produces the [`RepoSpec`] that materializes it.

use crate::env::{Computed, Environment, RepoRuleRequest};
use crate::errors::{ResolveError, Result};
use crate::model::{split_canonical_name, AttrValue, RepoSpec};
use crate::overrides::{OverrideDirective, OverrideTable};
use crate::selection::SelectionResult;

/// Repo spec for `canonical_name`, or `None` if no live module version
/// carries that name.
///
/// # Errors
/// Returns the failure recorded for the module, or the registry failure
/// from fetching its repository rule.
pub fn spec_for(
    env: &dyn Environment,
    canonical_name: &str,
    selection: &SelectionResult,
    overrides: &OverrideTable,
) -> Result<Computed<Option<RepoSpec>>> {
    let Some((module, marker)) = split_canonical_name(canonical_name) else {
        return Ok(Computed::Ready(None));
    };
    if let Some(err) = selection.failure(module) {
        return Err(err.clone());
    }
    let Some(entry) = selection.module(module).and_then(|m| m.entry(marker)) else {
        return Ok(Computed::Ready(None));
    };

    let Some(key) = &entry.key else {
        return match overrides.get(module) {
            Some(OverrideDirective::LocalPath { path, .. }) => Ok(Computed::Ready(Some(
                RepoSpec::local_repository(canonical_name, path.as_str()),
            ))),
            _ => Err(ResolveError::internal(format!(
                "{canonical_name} is live without a local path override"
            ))),
        };
    };
    let registry = entry.registry.clone().ok_or_else(|| {
        ResolveError::internal(format!("{canonical_name} has no source registry"))
    })?;

    let request = RepoRuleRequest {
        registry,
        key: key.clone(),
        repo_name: canonical_name.to_string(),
    };
    let Some(mut spec) = env.repo_rule(&request)? else {
        return Ok(Computed::ValuesMissing);
    };
    spec.set_attr("name", canonical_name);

    if let Some(OverrideDirective::SingleVersion(svo)) = overrides.get(module) {
        if svo.has_patches() {
            spec.set_attr("patches", AttrValue::from(svo.patches.clone()));
            spec.set_attr("patch_cmds", AttrValue::from(svo.patch_cmds.clone()));
            spec.set_attr(
                "patch_args",
                AttrValue::from(vec![format!("-p{}", svo.patch_strip)]),
            );
        }
    }
    Ok(Computed::Ready(Some(spec)))
}
