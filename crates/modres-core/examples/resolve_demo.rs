//! Resolution Demonstration
#![allow(clippy::unwrap_used, clippy::expect_used)]
//!
//! Resolves a small graph from an in-memory registry and prints the live
//! modules and the repository spec for each of them.
//!
//! Key concepts illustrated:
//! 1. Highest requested version wins
//! 2. Local path overrides
//! 3. Shared memoization across queries

use std::sync::Arc;

use modres_core::logging_facility::{init, Profile};
use modres_core::{
    InMemoryRegistry, InMemoryRegistryFactory, ModuleKey, ModuleResolver, ResolverConfig,
    TomlDescriptorParser, Version,
};

const REGISTRY: &str = "/opt/modules";

fn publish(registry: &InMemoryRegistry, name: &str, version: &str, deps: &[(&str, &str)]) {
    let mut text = format!("[module]\nname = \"{name}\"\nversion = \"{version}\"\n");
    for (dep, dep_version) in deps {
        text.push_str(&format!(
            "\n[[deps]]\nname = \"{dep}\"\nversion = \"{dep_version}\"\n"
        ));
    }
    registry.add_module(ModuleKey::new(name, Version::parse(version).unwrap()), text);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init(Profile::Development);
    println!("=== modres Resolution Demo ===\n");

    let factory = Arc::new(InMemoryRegistryFactory::new());
    let registry = factory.new_registry(REGISTRY);
    publish(&registry, "bbb", "1.0", &[("ddd", "1.0")]);
    publish(&registry, "ccc", "1.0", &[("ddd", "2.0")]);
    publish(&registry, "ddd", "1.0", &[]);
    publish(&registry, "ddd", "2.0", &[]);

    let root = r#"
[module]
name = "app"
version = "0.1"

[[deps]]
name = "bbb"
version = "1.0"

[[deps]]
name = "ccc"
version = "1.0"

[[deps]]
name = "eee"
version = "1.0"

[[overrides]]
kind = "local_path"
module_name = "eee"
path = "/src/eee"
"#;

    let resolver = ModuleResolver::new(
        root,
        Arc::new(TomlDescriptorParser),
        factory.clone(),
        ResolverConfig::with_registries([REGISTRY]),
    )?;

    // ===== Part 1: Full resolution =====
    println!("## Part 1: Live modules\n");
    let resolution = resolver.resolve()?;
    for module in &resolution.modules {
        println!("✓ {}", module.canonical_name);
    }
    // ddd@1.0 is requested by bbb but ddd@2.0 wins
    assert!(resolution.module("ddd~1.0").is_none());

    // ===== Part 2: Repository specs =====
    println!("\n## Part 2: Repository specs\n");
    for (name, spec) in resolver.repo_specs()? {
        println!("{name}: {}", serde_json::to_string(&spec)?);
    }

    // ===== Part 3: Memoization =====
    println!("\n## Part 3: Memoization\n");
    let cached = resolver.evaluator().cached_len();
    resolver.get_repo_spec("ddd~2.0")?;
    assert_eq!(resolver.evaluator().cached_len(), cached);
    println!("✓ Repeated query served from {cached} memoized values");

    Ok(())
}
