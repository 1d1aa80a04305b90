//! Dependency graph discovery.
//!
//! [`build_graph`] walks from the root descriptor through every dependency
//! edge, asking the [`Environment`] for each distinct module's descriptor.
//! It is restartable: a fresh graph is assembled on every invocation, and
//! when some descriptors are still missing the whole frontier is requested
//! before the builder reports [`Computed::ValuesMissing`].
//!
//! Fetch and parse failures do not abort the walk. They are recorded per
//! key so that queries for modules outside the failing subgraph still
//! resolve; see [`DependencyGraph::tainted_names`].

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::config::ResolverConfig;
use crate::descriptor::DescriptorParser;
use crate::env::{Computed, Environment, ModuleFileRequest};
use crate::errors::{ResolveError, Result};
use crate::model::{DepEdge, KeyVersion, ModuleDescriptor, ModuleKey};
use crate::overrides::{OverrideDirective, OverrideTable};
use crate::version::Version;

/// Where a dependency edge leads after overrides are applied
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum DepTarget {
    /// A registry module at a concrete version
    Registry(ModuleKey),
    /// A module replaced by a local path; never fetched
    LocalPath(String),
}

impl DepTarget {
    pub fn name(&self) -> &str {
        match self {
            DepTarget::Registry(key) => &key.name,
            DepTarget::LocalPath(name) => name,
        }
    }
}

/// A module whose descriptor has been fetched and parsed
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub key: ModuleKey,
    pub descriptor: ModuleDescriptor,
    /// Registry that served the descriptor; `None` for the root
    pub registry: Option<String>,
    /// Traversed dependency edges, one per declared edge, in declaration
    /// order. `deps[i]` is the target of `edges[i]`.
    pub edges: Vec<DepEdge>,
    pub deps: Vec<DepTarget>,
}

/// Raw dependency graph
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyGraph {
    root: ModuleKey,
    nodes: BTreeMap<ModuleKey, GraphNode>,
    dependents: BTreeMap<ModuleKey, BTreeSet<ModuleKey>>,
    failures: BTreeMap<ModuleKey, ResolveError>,
}

impl DependencyGraph {
    fn new(root: ModuleKey) -> Self {
        Self {
            root,
            nodes: BTreeMap::new(),
            dependents: BTreeMap::new(),
            failures: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> &ModuleKey {
        &self.root
    }

    pub fn root_node(&self) -> Option<&GraphNode> {
        self.nodes.get(&self.root)
    }

    pub fn node(&self, key: &ModuleKey) -> Option<&GraphNode> {
        self.nodes.get(key)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, key: &ModuleKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Keys that could not be fetched, parsed or resolved
    pub fn failures(&self) -> &BTreeMap<ModuleKey, ResolveError> {
        &self.failures
    }

    /// Modules with a direct edge to `key`
    pub fn dependents_of(&self, key: &ModuleKey) -> impl Iterator<Item = &ModuleKey> {
        self.dependents.get(key).into_iter().flatten()
    }

    /// Every module that reaches `key` through one or more edges
    pub fn transitive_dependents(&self, key: &ModuleKey) -> BTreeSet<ModuleKey> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<&ModuleKey> = self.dependents_of(key).collect();
        while let Some(next) = queue.pop_front() {
            if seen.insert(next.clone()) {
                queue.extend(self.dependents_of(next));
            }
        }
        seen
    }

    /// Module names whose resolution is poisoned by a recorded failure,
    /// each mapped to the failure responsible: the failed module itself
    /// and every non-root module that depends on it.
    pub fn tainted_names(&self) -> BTreeMap<String, ResolveError> {
        let mut tainted = BTreeMap::new();
        for (key, err) in &self.failures {
            tainted
                .entry(key.name.clone())
                .or_insert_with(|| err.clone());
            for dependent in self.transitive_dependents(key) {
                if !dependent.is_root() {
                    tainted.entry(dependent.name).or_insert_with(|| err.clone());
                }
            }
        }
        tainted
    }

    /// Fetched versions of a module name, in ascending order
    pub fn versions_of(&self, name: &str) -> BTreeSet<&Version> {
        self.nodes
            .keys()
            .filter(|k| k.name == name)
            .filter_map(ModuleKey::version)
            .collect()
    }

    fn add_dependent(&mut self, target: &ModuleKey, from: &ModuleKey) {
        self.dependents
            .entry(target.clone())
            .or_default()
            .insert(from.clone());
    }

    /// Apply overrides to a module's edges and record reverse adjacency
    fn resolve_edges<'a>(
        &mut self,
        from: &ModuleKey,
        edges: impl Iterator<Item = &'a DepEdge>,
        overrides: &OverrideTable,
    ) -> (Vec<DepEdge>, Vec<DepTarget>) {
        let mut kept = Vec::new();
        let mut targets = Vec::new();
        for edge in edges {
            let target = match overrides.get(&edge.name) {
                Some(OverrideDirective::LocalPath { .. }) => DepTarget::LocalPath(edge.name.clone()),
                Some(OverrideDirective::SingleVersion(svo)) => match &svo.version {
                    Some(pinned) => DepTarget::Registry(ModuleKey::new(&edge.name, pinned.clone())),
                    None => DepTarget::Registry(ModuleKey::new(&edge.name, edge.version.clone())),
                },
                Some(OverrideDirective::MultipleVersion { versions, .. }) => {
                    match Version::ceiling(&edge.version, versions) {
                        Some(allowed) => {
                            DepTarget::Registry(ModuleKey::new(&edge.name, allowed.clone()))
                        }
                        None => {
                            let key = ModuleKey::new(&edge.name, edge.version.clone());
                            self.failures.entry(key.clone()).or_insert_with(|| {
                                ResolveError::VersionResolution {
                                    module: edge.name.clone(),
                                    version: edge.version.to_string(),
                                    allowed: versions.iter().map(Version::to_string).collect(),
                                }
                            });
                            DepTarget::Registry(key)
                        }
                    }
                }
                Some(OverrideDirective::Registry { .. }) | None => {
                    DepTarget::Registry(ModuleKey::new(&edge.name, edge.version.clone()))
                }
            };
            if let DepTarget::Registry(key) = &target {
                self.add_dependent(key, from);
            }
            kept.push(edge.clone());
            targets.push(target);
        }
        (kept, targets)
    }
}

/// The fetched descriptor must describe the module it was fetched for
fn check_identity(key: &ModuleKey, descriptor: ModuleDescriptor) -> Result<ModuleDescriptor> {
    let expected = match &key.version {
        KeyVersion::Version(v) => v,
        KeyVersion::Root => return Ok(descriptor),
    };
    if descriptor.name != key.name || descriptor.version.as_ref() != Some(expected) {
        return Err(ResolveError::parse(
            key.to_string(),
            format!(
                "descriptor declares {}@{}",
                descriptor.name,
                descriptor
                    .version
                    .as_ref()
                    .map(Version::to_string)
                    .unwrap_or_default()
            ),
        ));
    }
    Ok(descriptor)
}

/// Build the dependency graph reachable from `root`.
///
/// # Arguments
/// * `env` - source of descriptor texts
/// * `root` - the already-parsed root descriptor
/// * `overrides` - the root's override table
/// * `config` - registry list and dev-dependency handling
/// * `parser` - turns fetched text into descriptors
///
/// # Returns
/// The graph, or `ValuesMissing` if any descriptor still has to be fetched.
/// Per-module failures are recorded in the graph, not returned.
///
/// # Errors
/// None at present; the `Result` carries substrate failures such as
/// interruption.
pub fn build_graph(
    env: &dyn Environment,
    root: &ModuleDescriptor,
    overrides: &OverrideTable,
    config: &ResolverConfig,
    parser: &dyn DescriptorParser,
) -> Result<Computed<DependencyGraph>> {
    let root_key = ModuleKey::root(&root.name);
    let mut graph = DependencyGraph::new(root_key.clone());

    let (edges, deps) = graph.resolve_edges(
        &root_key,
        root.traversed_deps(true, config.ignore_dev_dependencies)
            .filter(|e| e.name != root.name),
        overrides,
    );
    let mut queue: VecDeque<ModuleKey> = registry_targets(&deps).collect();
    graph.nodes.insert(
        root_key.clone(),
        GraphNode {
            key: root_key,
            descriptor: root.clone(),
            registry: None,
            edges,
            deps,
        },
    );

    let mut visited = BTreeSet::new();
    let mut missing = 0usize;
    while let Some(key) = queue.pop_front() {
        if !visited.insert(key.clone()) || graph.failures.contains_key(&key) {
            continue;
        }
        let request = ModuleFileRequest {
            registry: overrides
                .get(&key.name)
                .and_then(OverrideDirective::registry)
                .map(str::to_string),
            key: key.clone(),
        };
        let file = match env.module_file(&request) {
            Ok(Some(file)) => file,
            Ok(None) => {
                missing += 1;
                continue;
            }
            Err(ResolveError::Interrupted) => return Err(ResolveError::Interrupted),
            Err(e) => {
                graph.failures.insert(key, e);
                continue;
            }
        };
        let descriptor = match parser
            .parse(&file.text, &key.to_string())
            .and_then(|d| check_identity(&key, d))
        {
            Ok(d) => d,
            Err(e) => {
                graph.failures.insert(key, e);
                continue;
            }
        };
        if !descriptor.overrides.is_empty() {
            tracing::debug!(
                module = %key,
                count = descriptor.overrides.len(),
                "ignoring overrides declared outside the root module"
            );
        }

        // Edges back to the root are dropped
        let (edges, deps) = graph.resolve_edges(
            &key,
            descriptor
                .traversed_deps(false, false)
                .filter(|e| e.name != root.name),
            overrides,
        );
        queue.extend(registry_targets(&deps));
        graph.nodes.insert(
            key.clone(),
            GraphNode {
                key,
                descriptor,
                registry: Some(file.registry),
                edges,
                deps,
            },
        );
    }

    if missing > 0 {
        tracing::trace!(missing, fetched = graph.len(), "dependency graph incomplete");
        return Ok(Computed::ValuesMissing);
    }
    Ok(Computed::Ready(graph))
}

fn registry_targets(deps: &[DepTarget]) -> impl Iterator<Item = ModuleKey> + '_ {
    deps.iter().filter_map(|d| match d {
        DepTarget::Registry(key) => Some(key.clone()),
        DepTarget::LocalPath(_) => None,
    })
}
