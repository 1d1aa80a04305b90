//! Module dependency resolution
//!
//! Given a root module descriptor and a set of module registries, this crate
//! discovers the transitive dependency graph, applies the root's overrides,
//! selects one live version per module (or several, under a
//! multiple-version override) and produces the repository spec needed to
//! materialize each selected module.
//!
//! - [`graph`] discovers the raw dependency graph
//! - [`overrides`] validates the root's override directives
//! - [`selection`] picks live versions and prunes the rest
//! - [`synthesizer`] maps canonical repository names to repo specs
//! - [`evaluator`] runs the stages with memoized, batched fetches
//! - [`resolver`] ties everything together behind [`ModuleResolver`]

pub mod config;
pub mod descriptor;
pub mod env;
pub mod errors;
pub mod evaluator;
pub mod graph;
pub mod logging_facility;
pub mod model;
pub mod overrides;
pub mod registry;
pub mod resolver;
pub mod selection;
pub mod synthesizer;
pub mod version;

pub use modres_core_types;

// Re-export commonly used types
pub use config::{CheckMode, ResolverConfig};
pub use descriptor::{DescriptorParser, TomlDescriptorParser};
pub use env::{Computed, Environment};
pub use errors::{ErrorKind, ErrorReport, ResolveError, Result};
pub use evaluator::Evaluator;
pub use model::{LiveVersion, ModuleDescriptor, ModuleKey, RepoSpec};
pub use registry::{
    FileRegistryFactory, InMemoryRegistry, InMemoryRegistryFactory, Registry, RegistryFactory,
};
pub use resolver::{ModuleResolver, Resolution, ResolvedModule};
pub use version::Version;
