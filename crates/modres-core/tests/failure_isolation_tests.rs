#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{key, root, Fixture};
use modres_core::{ErrorKind, ResolveError};

/// aaa -> bbb -> ccc (missing from the registry)
/// aaa -> eee -> fff
fn broken_branch() -> Fixture {
    let fixture = Fixture::new();
    fixture
        .add("bbb", "1.0", &[("ccc", "1.0")])
        .add("eee", "1.0", &[("fff", "1.0")])
        .add("fff", "1.0", &[]);
    fixture
}

#[test]
fn test_failure_poisons_only_its_dependents() {
    let fixture = broken_branch();
    let resolver = fixture.resolver(&root(&[("bbb", "1.0"), ("eee", "1.0")], ""));

    assert!(resolver.get_repo_spec("eee~1.0").unwrap().is_some());
    assert!(resolver.get_repo_spec("fff~1.0").unwrap().is_some());

    let err = resolver.get_repo_spec("ccc~1.0").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RegistryLookup);
    // bbb depends on the missing module and carries its failure
    let err = resolver.get_repo_spec("bbb~1.0").unwrap_err();
    assert_eq!(err.module(), Some("ccc"));
}

#[test]
fn test_full_resolution_reports_the_failure() {
    let fixture = broken_branch();
    let resolver = fixture.resolver(&root(&[("bbb", "1.0"), ("eee", "1.0")], ""));

    let err = resolver.resolve().unwrap_err();
    assert!(matches!(err, ResolveError::RegistryLookup { ref module, .. } if module == "ccc"));
}

#[test]
fn test_failure_for_unrequested_version_still_fails_name() {
    // bbb@1.0 cannot be parsed; bbb@2.0 would win anyway
    let fixture = Fixture::new();
    fixture
        .add("bbb", "2.0", &[])
        .add("ccc", "1.0", &[("bbb", "2.0")]);
    fixture.registry.add_module(key("bbb", "1.0"), "not toml [");
    let resolver = fixture.resolver(&root(&[("bbb", "1.0"), ("ccc", "1.0")], ""));

    assert_eq!(
        resolver.get_repo_spec("bbb~2.0").unwrap_err().kind(),
        ErrorKind::Parse
    );
}

#[test]
fn test_version_resolution_failure_is_isolated() {
    let fixture = Fixture::new();
    fixture
        .add("bbb", "1.0", &[("ddd", "3.0")])
        .add("eee", "1.0", &[])
        .add("ddd", "1.0", &[]);
    let overrides = "\n[[overrides]]\nkind = \"multiple_version\"\nmodule_name = \"ddd\"\nversions = [\"1.0\"]\n";
    let resolver = fixture.resolver(&root(&[("bbb", "1.0"), ("eee", "1.0")], overrides));

    assert_eq!(
        resolver.get_repo_spec("bbb~1.0").unwrap_err().kind(),
        ErrorKind::VersionResolution
    );
    assert!(resolver.get_repo_spec("eee~1.0").unwrap().is_some());
}

#[test]
fn test_repo_rule_failure_affects_only_that_query() {
    let fixture = Fixture::new();
    fixture.add("bbb", "1.0", &[]).add("eee", "1.0", &[]);
    let resolver = fixture.resolver(&root(&[("bbb", "1.0"), ("eee", "1.0")], ""));
    resolver.resolve().unwrap();

    // Descriptors are already memoized; only repo rule fetches see the failure
    fixture.registry.fail_module(
        key("bbb", "1.0"),
        ResolveError::Registry {
            registry: common::REGISTRY.to_string(),
            message: "archive unavailable".to_string(),
            transient: false,
        },
    );
    assert_eq!(
        resolver.get_repo_spec("bbb~1.0").unwrap_err().kind(),
        ErrorKind::Io
    );
    assert!(resolver.get_repo_spec("eee~1.0").unwrap().is_some());
}
