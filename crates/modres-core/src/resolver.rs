//! Resolver facade.
//!
//! [`ModuleResolver`] owns one root descriptor, its override table, the
//! configuration and an [`Evaluator`]. Queries rebuild the graph and the
//! selection on top of the evaluator's memo table, so fetched descriptors
//! and repository rules are shared across queries.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use modres_core_types::RequestContext;
use serde::Serialize;

use crate::config::ResolverConfig;
use crate::descriptor::DescriptorParser;
use crate::env::{Computed, Environment};
use crate::errors::{ErrorReport, ResolveError, Result};
use crate::evaluator::Evaluator;
use crate::graph::build_graph;
use crate::model::{split_canonical_name, ModuleDescriptor, RepoSpec};
use crate::overrides::OverrideTable;
use crate::ready;
use crate::registry::RegistryFactory;
use crate::selection::{select, ResolutionWarning, SelectionResult};
use crate::synthesizer::spec_for;
use crate::{log_op_end, log_op_error, log_op_start};

/// Origin reported in parse errors for the root descriptor
const ROOT_ORIGIN: &str = "<root>";

/// One live module version in a completed resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedModule {
    pub name: String,
    /// Version string, or `override` for a local path override
    pub version: String,
    pub canonical_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
}

/// Outcome of a successful full resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub root: String,
    /// Live module versions, ordered by module name then version
    pub modules: Vec<ResolvedModule>,
    pub warnings: Vec<ResolutionWarning>,
}

impl Resolution {
    fn from_selection(root: &str, selection: &SelectionResult) -> Self {
        let modules = selection
            .modules()
            .flat_map(|m| {
                m.entries.iter().map(|e| ResolvedModule {
                    name: m.name.clone(),
                    version: e.version.to_string(),
                    canonical_name: e.canonical_name.clone(),
                    registry: e.registry.clone(),
                })
            })
            .collect();
        Self {
            root: root.to_string(),
            modules,
            warnings: selection.warnings().to_vec(),
        }
    }

    pub fn module(&self, canonical_name: &str) -> Option<&ResolvedModule> {
        self.modules
            .iter()
            .find(|m| m.canonical_name == canonical_name)
    }
}

/// Resolves module dependencies for one root module
pub struct ModuleResolver {
    root: ModuleDescriptor,
    overrides: OverrideTable,
    config: ResolverConfig,
    parser: Arc<dyn DescriptorParser>,
    evaluator: Evaluator,
}

impl ModuleResolver {
    /// Parse the root descriptor and extract its override table.
    ///
    /// # Errors
    /// * `Parse` - the root descriptor is malformed
    /// * `DuplicateOverride` / `ConflictingOverrideKind` - two overrides
    ///   name the same module
    /// * `Configuration` - a malformed override or configuration value
    pub fn new(
        root_text: &str,
        parser: Arc<dyn DescriptorParser>,
        factory: Arc<dyn RegistryFactory>,
        config: ResolverConfig,
    ) -> Result<Self> {
        let root = parser.parse(root_text, ROOT_ORIGIN)?;
        Self::from_descriptor(root, parser, factory, config)
    }

    /// Like [`ModuleResolver::new`] for an already-parsed root
    ///
    /// # Errors
    /// See [`ModuleResolver::new`].
    pub fn from_descriptor(
        root: ModuleDescriptor,
        parser: Arc<dyn DescriptorParser>,
        factory: Arc<dyn RegistryFactory>,
        config: ResolverConfig,
    ) -> Result<Self> {
        let overrides = OverrideTable::extract(&root, &config)?;
        tracing::debug!(
            module = root.name.as_str(),
            overrides = overrides.len(),
            "root module loaded"
        );
        let evaluator = Evaluator::new(factory, config.registries.clone());
        Ok(Self {
            root,
            overrides,
            config,
            parser,
            evaluator,
        })
    }

    pub fn root(&self) -> &ModuleDescriptor {
        &self.root
    }

    pub fn overrides(&self) -> &OverrideTable {
        &self.overrides
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Cancel the running query, or the next one if none is running
    pub fn interrupt(&self) {
        self.evaluator.interrupt();
    }

    /// Drop every fetched value so the next query fetches again
    pub fn invalidate(&self) {
        self.evaluator.invalidate();
    }

    fn selection(&self, env: &dyn Environment) -> Result<Computed<SelectionResult>> {
        let graph = ready!(build_graph(
            env,
            &self.root,
            &self.overrides,
            &self.config,
            self.parser.as_ref(),
        )?);
        Ok(Computed::Ready(select(&graph, &self.overrides, &self.config)))
    }

    /// Repo spec for a canonical repository name such as `ccc~2.0`.
    ///
    /// Returns `None` for names that do not denote a live module version.
    ///
    /// # Errors
    /// Returns the failure recorded for the named module, a registry
    /// failure while fetching its repository rule, or `Interrupted`.
    pub fn get_repo_spec(&self, canonical_name: &str) -> Result<Option<RepoSpec>> {
        if split_canonical_name(canonical_name).is_none() {
            return Ok(None);
        }
        let ctx = RequestContext::new().with_query(canonical_name);
        let start = Instant::now();
        log_op_start!(
            "repo_spec",
            request_id = %ctx.request_id,
            canonical_name = canonical_name
        );

        let result = self.evaluator.evaluate_with(&ctx, |env| {
            let selection = ready!(self.selection(env)?);
            spec_for(env, canonical_name, &selection, &self.overrides)
        });

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(spec) => {
                log_op_end!(
                    "repo_spec",
                    duration_ms = duration_ms,
                    request_id = %ctx.request_id,
                    canonical_name = canonical_name,
                    found = spec.is_some()
                );
            }
            Err(e) => {
                let report =
                    error_report("repo_spec", e, &ctx).with_canonical_name(canonical_name);
                log_op_error!("repo_spec", report, duration_ms = duration_ms);
            }
        }
        result
    }

    /// Resolve the whole dependency graph.
    ///
    /// # Errors
    /// Returns the first recorded failure, by module name, if any module
    /// failed; otherwise only `Interrupted` or an internal error.
    pub fn resolve(&self) -> Result<Resolution> {
        let ctx = RequestContext::new().with_query("resolve");
        let start = Instant::now();
        log_op_start!(
            "resolve",
            request_id = %ctx.request_id,
            module = self.root.name.as_str()
        );

        let result = self
            .evaluator
            .evaluate_with(&ctx, |env| self.selection(env))
            .and_then(|selection| match selection.failures().iter().next() {
                Some((_, err)) => Err(err.clone()),
                None => Ok(Resolution::from_selection(&self.root.name, &selection)),
            });

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(resolution) => {
                log_op_end!(
                    "resolve",
                    duration_ms = duration_ms,
                    request_id = %ctx.request_id,
                    module_count = resolution.modules.len()
                );
            }
            Err(e) => {
                log_op_error!(
                    "resolve",
                    error_report("resolve", e, &ctx),
                    duration_ms = duration_ms
                );
            }
        }
        result
    }

    /// Repo specs for every live module version, keyed by canonical name.
    ///
    /// All repository rules are requested in the same pass, so a cold
    /// evaluator fetches them in one parallel batch.
    ///
    /// # Errors
    /// Same as [`ModuleResolver::resolve`], plus registry failures while
    /// fetching repository rules.
    pub fn repo_specs(&self) -> Result<BTreeMap<String, RepoSpec>> {
        let ctx = RequestContext::new().with_query("repo_specs");
        let start = Instant::now();
        log_op_start!(
            "repo_specs",
            request_id = %ctx.request_id,
            module = self.root.name.as_str()
        );

        let result = self.evaluator.evaluate_with(&ctx, |env| {
            let selection = ready!(self.selection(env)?);
            if let Some((_, err)) = selection.failures().iter().next() {
                return Err(err.clone());
            }
            let mut specs = BTreeMap::new();
            let mut missing = false;
            for module in selection.modules() {
                for entry in &module.entries {
                    match spec_for(env, &entry.canonical_name, &selection, &self.overrides)? {
                        Computed::Ready(Some(spec)) => {
                            specs.insert(entry.canonical_name.clone(), spec);
                        }
                        Computed::Ready(None) => {
                            return Err(ResolveError::internal(format!(
                                "live module {} has no repo spec",
                                entry.canonical_name
                            )))
                        }
                        Computed::ValuesMissing => missing = true,
                    }
                }
            }
            Ok(if missing {
                Computed::ValuesMissing
            } else {
                Computed::Ready(specs)
            })
        });

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(specs) => {
                log_op_end!(
                    "repo_specs",
                    duration_ms = duration_ms,
                    request_id = %ctx.request_id,
                    module_count = specs.len()
                );
            }
            Err(e) => {
                log_op_error!(
                    "repo_specs",
                    error_report("repo_specs", e, &ctx),
                    duration_ms = duration_ms
                );
            }
        }
        result
    }
}

/// Report for a failed query, tagged with the evaluation it belongs to
fn error_report(op: &str, err: &ResolveError, ctx: &RequestContext) -> ErrorReport {
    ErrorReport::from(err)
        .with_op(op)
        .with_request_id(ctx.request_id.clone())
}

impl std::fmt::Debug for ModuleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleResolver")
            .field("root", &self.root.name)
            .field("overrides", &self.overrides.len())
            .field("evaluator", &self.evaluator)
            .finish_non_exhaustive()
    }
}
