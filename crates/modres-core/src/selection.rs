//! Version selection.
//!
//! Turns the raw [`DependencyGraph`] into the set of live module versions:
//!
//! 1. Every module name resolves to its highest fetched version, unless an
//!    override says otherwise. Single-version pins and multiple-version
//!    ceilings were already applied to the graph's edges and are kept as
//!    they are. Local path overrides become the `override` marker.
//! 2. Anything not reachable from the root through the chosen versions is
//!    pruned.
//! 3. Upgrades that change the compatibility level seen by a dependent, and
//!    root direct dependencies that resolved to another version, are
//!    reported according to [`ResolverConfig`].
//!
//! Failures are isolated per module name: a name is failed when its own
//! descriptor could not be obtained or a check rejected it, or when it
//! depends (transitively) on such a name.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use modres_core_types::schema::EVENT_WARNING;

use crate::config::{CheckMode, ResolverConfig};
use crate::errors::ResolveError;
use crate::graph::{DepTarget, DependencyGraph};
use crate::model::{canonical_repo_name, LiveVersion, ModuleKey};
use crate::overrides::{OverrideDirective, OverrideTable};

/// One live version of a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveEntry {
    pub version: LiveVersion,
    pub canonical_name: String,
    /// Graph key; `None` for a local path override
    pub key: Option<ModuleKey>,
    /// Registry that served the descriptor
    pub registry: Option<String>,
}

/// Live versions of one module name, ascending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedModule {
    pub name: String,
    pub entries: Vec<LiveEntry>,
}

impl SelectedModule {
    /// Entry whose canonical suffix is `marker` (a version or `override`)
    pub fn entry(&self, marker: &str) -> Option<&LiveEntry> {
        self.entries
            .iter()
            .find(|e| e.version.to_string() == marker)
    }
}

/// A check violation that did not fail resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionWarning {
    pub module: String,
    pub error: ResolveError,
}

impl fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.error.kind().code(), self.error)
    }
}

/// Output of [`select`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionResult {
    modules: BTreeMap<String, SelectedModule>,
    failures: BTreeMap<String, ResolveError>,
    warnings: Vec<ResolutionWarning>,
}

impl SelectionResult {
    pub fn module(&self, name: &str) -> Option<&SelectedModule> {
        self.modules.get(name)
    }

    pub fn modules(&self) -> impl Iterator<Item = &SelectedModule> {
        self.modules.values()
    }

    /// Failure recorded for a module name
    pub fn failure(&self, name: &str) -> Option<&ResolveError> {
        self.failures.get(name)
    }

    pub fn failures(&self) -> &BTreeMap<String, ResolveError> {
        &self.failures
    }

    pub fn warnings(&self) -> &[ResolutionWarning] {
        &self.warnings
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn report(&mut self, mode: CheckMode, module: &str, err: ResolveError) {
        match mode {
            CheckMode::Error => {
                self.failures.entry(module.to_string()).or_insert(err);
            }
            CheckMode::Warning => {
                tracing::warn!(module, event = EVENT_WARNING, "{}", err);
                self.warnings.push(ResolutionWarning {
                    module: module.to_string(),
                    error: err,
                });
            }
            CheckMode::Off => {}
        }
    }
}

/// Selected key per module name for edges without an exact override
fn highest_versions(graph: &DependencyGraph) -> BTreeMap<&str, &ModuleKey> {
    let mut highest: BTreeMap<&str, &ModuleKey> = BTreeMap::new();
    for node in graph.nodes().filter(|n| !n.key.is_root()) {
        highest
            .entry(node.key.name.as_str())
            .and_modify(|best| {
                if node.key.version > best.version {
                    *best = &node.key;
                }
            })
            .or_insert(&node.key);
    }
    highest
}

/// Whether an override fixes the exact key an edge points at
fn is_exact(overrides: &OverrideTable, name: &str) -> bool {
    match overrides.get(name) {
        Some(OverrideDirective::SingleVersion(svo)) => svo.version.is_some(),
        Some(OverrideDirective::MultipleVersion { .. }) => true,
        _ => false,
    }
}

struct Selector<'a> {
    overrides: &'a OverrideTable,
    highest: BTreeMap<&'a str, &'a ModuleKey>,
}

impl Selector<'_> {
    fn select(&self, requested: &ModuleKey) -> ModuleKey {
        if is_exact(self.overrides, &requested.name) {
            return requested.clone();
        }
        self.highest
            .get(requested.name.as_str())
            .map(|k| (*k).clone())
            .unwrap_or_else(|| requested.clone())
    }
}

/// Select live versions from a complete dependency graph
pub fn select(
    graph: &DependencyGraph,
    overrides: &OverrideTable,
    config: &ResolverConfig,
) -> SelectionResult {
    let selector = Selector {
        overrides,
        highest: highest_versions(graph),
    };
    let mut result = SelectionResult::default();

    // Walk from the root through selected versions only
    let mut reached: BTreeMap<String, BTreeSet<LiveVersion>> = BTreeMap::new();
    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::from([graph.root().clone()]);
    while let Some(key) = queue.pop_front() {
        if !visited.insert(key.clone()) {
            continue;
        }
        let Some(node) = graph.node(&key) else {
            continue;
        };
        for target in &node.deps {
            let requested = match target {
                DepTarget::LocalPath(name) => {
                    reached
                        .entry(name.clone())
                        .or_default()
                        .insert(LiveVersion::Override);
                    continue;
                }
                DepTarget::Registry(requested) => requested,
            };
            let selected = selector.select(requested);
            if let Some(version) = selected.version() {
                reached
                    .entry(selected.name.clone())
                    .or_default()
                    .insert(LiveVersion::Version(version.clone()));
            }
            if &selected != requested {
                check_compatibility(graph, &mut result, config, &key, requested, &selected);
            }
            queue.push_back(selected);
        }
    }

    if let Some(root) = graph.root_node() {
        for (edge, target) in root.edges.iter().zip(&root.deps) {
            let DepTarget::Registry(requested) = target else {
                continue;
            };
            let plain = matches!(
                overrides.get(&edge.name),
                None | Some(OverrideDirective::Registry { .. })
            );
            if !plain || edge.version.is_empty() {
                continue;
            }
            let selected = selector.select(requested);
            if selected.version() != Some(&edge.version) {
                let err = ResolveError::DirectDependencyMismatch {
                    module: edge.name.clone(),
                    declared: edge.version.to_string(),
                    selected: selected
                        .version()
                        .map(ToString::to_string)
                        .unwrap_or_default(),
                };
                result.report(config.check_direct_dependencies, &edge.name, err);
            }
        }
    }

    for (name, err) in graph.tainted_names() {
        result.failures.entry(name).or_insert(err);
    }

    for (name, versions) in reached {
        let entries = versions
            .into_iter()
            .map(|live| {
                let key = live
                    .as_version()
                    .map(|v| ModuleKey::new(name.clone(), v.clone()));
                let registry = key
                    .as_ref()
                    .and_then(|k| graph.node(k))
                    .and_then(|n| n.registry.clone());
                LiveEntry {
                    canonical_name: canonical_repo_name(&name, &live),
                    version: live,
                    key,
                    registry,
                }
            })
            .collect();
        result
            .modules
            .insert(name.clone(), SelectedModule { name, entries });
    }

    tracing::debug!(
        module_count = result.modules.len(),
        failures = result.failures.len(),
        warnings = result.warnings.len(),
        "selection complete"
    );
    result
}

fn check_compatibility(
    graph: &DependencyGraph,
    result: &mut SelectionResult,
    config: &ResolverConfig,
    dependent: &ModuleKey,
    requested: &ModuleKey,
    selected: &ModuleKey,
) {
    let (Some(req_node), Some(sel_node)) = (graph.node(requested), graph.node(selected)) else {
        return;
    };
    let requested_level = req_node.descriptor.compatibility_level;
    let selected_level = sel_node.descriptor.compatibility_level;
    if requested_level == selected_level {
        return;
    }
    let err = ResolveError::CompatibilityLevel {
        module: requested.name.clone(),
        requested: requested
            .version()
            .map(ToString::to_string)
            .unwrap_or_default(),
        requested_level,
        requested_by: dependent.to_string(),
        selected: selected
            .version()
            .map(ToString::to_string)
            .unwrap_or_default(),
        selected_level,
    };
    result.report(config.compatibility_mode, &requested.name, err);
}
