#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use common::{root, Fixture};
use modres_core::descriptor::{DescriptorParser, TomlDescriptorParser};
use modres_core::model::OverrideDecl;
use modres_core::overrides::{OverrideDirective, OverrideTable};
use modres_core::{ErrorKind, ModuleResolver, ResolveError, ResolverConfig};

fn extract(overrides: &str, config: &ResolverConfig) -> modres_core::Result<OverrideTable> {
    let descriptor = TomlDescriptorParser
        .parse(&root(&[], overrides), "<root>")
        .unwrap();
    OverrideTable::extract(&descriptor, config)
}

const LOCAL_CCC: &str = r#"
[[overrides]]
kind = "local_path"
module_name = "ccc"
path = "/src/ccc"
"#;

const PIN_CCC: &str = r#"
[[overrides]]
kind = "single_version"
module_name = "ccc"
version = "3.0"
"#;

#[test]
fn test_table_holds_one_directive_per_module() {
    let overrides = format!(
        "{LOCAL_CCC}\n[[overrides]]\nkind = \"multiple_version\"\nmodule_name = \"ddd\"\nversions = [\"2.0\", \"1.0\"]\n"
    );
    let table = extract(&overrides, &ResolverConfig::default()).unwrap();

    assert_eq!(table.len(), 2);
    assert!(table.is_local_path("ccc"));
    match table.get("ddd").unwrap() {
        OverrideDirective::MultipleVersion { versions, .. } => {
            let listed: Vec<_> = versions.iter().map(ToString::to_string).collect();
            assert_eq!(listed, vec!["1.0", "2.0"]);
        }
        other => panic!("unexpected directive {other:?}"),
    }
}

#[test]
fn test_same_style_twice_is_duplicate() {
    let overrides = format!("{PIN_CCC}\n[[overrides]]\nkind = \"registry\"\nmodule_name = \"ccc\"\nregistry = \"/mirror\"\n");
    let err = extract(&overrides, &ResolverConfig::default()).unwrap_err();
    assert_eq!(
        err,
        ResolveError::DuplicateOverride {
            module: "ccc".to_string()
        }
    );
}

#[test]
fn test_path_and_version_style_conflict() {
    let overrides = format!("{LOCAL_CCC}{PIN_CCC}");
    let err = extract(&overrides, &ResolverConfig::default()).unwrap_err();
    match err {
        ResolveError::ConflictingOverrideKind {
            module,
            first,
            second,
        } => {
            assert_eq!(module, "ccc");
            assert_eq!(first, "local_path_override");
            assert_eq!(second, "single_version_override");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_configured_overrides_are_merged_under_root() {
    let mut config = ResolverConfig::default();
    config.module_overrides = vec![
        OverrideDecl::LocalPath {
            module_name: "ccc".to_string(),
            path: "/elsewhere".to_string(),
        },
        OverrideDecl::Registry {
            module_name: "eee".to_string(),
            registry: "/mirror".to_string(),
        },
    ];
    let table = extract(PIN_CCC, &config).unwrap();

    // Root declaration wins for ccc, config contributes eee
    assert!(matches!(
        table.get("ccc"),
        Some(OverrideDirective::SingleVersion(_))
    ));
    assert_eq!(table.get("eee").unwrap().registry(), Some("/mirror"));
}

#[test]
fn test_malformed_override_is_configuration_error() {
    let bad_version = "\n[[overrides]]\nkind = \"single_version\"\nmodule_name = \"ccc\"\nversion = \"1..0\"\n";
    assert_eq!(
        extract(bad_version, &ResolverConfig::default())
            .unwrap_err()
            .kind(),
        ErrorKind::Configuration
    );

    let empty_versions = "\n[[overrides]]\nkind = \"multiple_version\"\nmodule_name = \"ddd\"\nversions = []\n";
    assert_eq!(
        extract(empty_versions, &ResolverConfig::default())
            .unwrap_err()
            .kind(),
        ErrorKind::Configuration
    );

    let bad_strip = "\n[[overrides]]\nkind = \"single_version\"\nmodule_name = \"ccc\"\npatch_strip = \"x\"\n";
    assert_eq!(
        extract(bad_strip, &ResolverConfig::default())
            .unwrap_err()
            .kind(),
        ErrorKind::Configuration
    );
}

#[test]
fn test_override_errors_fail_before_any_fetch() {
    let fixture = Fixture::new();
    fixture.add("bbb", "1.0", &[]);
    let overrides = format!("{LOCAL_CCC}{PIN_CCC}");

    let err = ModuleResolver::new(
        &root(&[("bbb", "1.0")], &overrides),
        Arc::new(TomlDescriptorParser),
        fixture.factory.clone(),
        fixture.config(),
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConflictingOverrideKind);
    assert!(fixture.registry.module_fetches().is_empty());
}
