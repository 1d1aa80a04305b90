use std::sync::Arc;

use modres_core::{
    InMemoryRegistry, InMemoryRegistryFactory, ModuleKey, ModuleResolver, ResolverConfig,
    TomlDescriptorParser, Version,
};

/// Registry URL used by most fixtures; also the prefix of default repo paths
#[allow(dead_code)]
pub const REGISTRY: &str = "/usr/local/modules";

#[allow(dead_code)]
pub fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
}

#[allow(dead_code)]
pub fn key(name: &str, version: &str) -> ModuleKey {
    ModuleKey::new(name, v(version))
}

/// Descriptor text for a registry module
#[allow(dead_code)]
pub fn descriptor(name: &str, version: &str, deps: &[(&str, &str)]) -> String {
    descriptor_with_level(name, version, 0, deps)
}

/// Descriptor text with an explicit compatibility level
#[allow(dead_code)]
pub fn descriptor_with_level(
    name: &str,
    version: &str,
    compatibility_level: u32,
    deps: &[(&str, &str)],
) -> String {
    let mut text = format!(
        "[module]\nname = \"{name}\"\nversion = \"{version}\"\ncompatibility_level = {compatibility_level}\n"
    );
    for (dep, dep_version) in deps {
        text.push_str(&format!(
            "\n[[deps]]\nname = \"{dep}\"\nversion = \"{dep_version}\"\n"
        ));
    }
    text
}

/// Root descriptor text: `aaa@0.1` with the given deps and raw override TOML
#[allow(dead_code)]
pub fn root(deps: &[(&str, &str)], overrides: &str) -> String {
    let mut text = descriptor("aaa", "0.1", deps);
    text.push_str(overrides);
    text
}

/// One in-memory registry behind a factory
#[allow(dead_code)]
pub struct Fixture {
    pub factory: Arc<InMemoryRegistryFactory>,
    pub registry: Arc<InMemoryRegistry>,
}

#[allow(dead_code)]
impl Fixture {
    pub fn new() -> Self {
        let factory = Arc::new(InMemoryRegistryFactory::new());
        let registry = factory.new_registry(REGISTRY);
        Self { factory, registry }
    }

    /// Publish `name@version` depending on `deps`
    pub fn add(&self, name: &str, version: &str, deps: &[(&str, &str)]) -> &Self {
        self.registry
            .add_module(key(name, version), descriptor(name, version, deps));
        self
    }

    pub fn add_with_level(
        &self,
        name: &str,
        version: &str,
        compatibility_level: u32,
        deps: &[(&str, &str)],
    ) -> &Self {
        self.registry.add_module(
            key(name, version),
            descriptor_with_level(name, version, compatibility_level, deps),
        );
        self
    }

    pub fn config(&self) -> ResolverConfig {
        ResolverConfig::with_registries([REGISTRY])
    }

    pub fn resolver(&self, root_text: &str) -> ModuleResolver {
        self.resolver_with(root_text, self.config())
    }

    pub fn resolver_with(&self, root_text: &str, config: ResolverConfig) -> ModuleResolver {
        ModuleResolver::new(
            root_text,
            Arc::new(TomlDescriptorParser),
            self.factory.clone(),
            config,
        )
        .unwrap()
    }

    /// Number of descriptor fetches for one key
    pub fn fetch_count(&self, name: &str, version: &str) -> usize {
        let wanted = key(name, version);
        self.registry
            .module_fetches()
            .iter()
            .filter(|k| **k == wanted)
            .count()
    }
}
