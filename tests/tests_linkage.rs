//! Source linkage: imports, includes, revisions, prefixes.

mod helpers;

use helpers::{build, import, leaf, module, submodule};
use yangr::{ModelPhase, ReactorError, Revision};

#[test]
fn test_two_modules_link_regardless_of_order() {
    let a = || {
        module("alpha", "urn:alpha", "a")
            .child(import("beta", "b"))
            .child(leaf("x", "string"))
    };
    let b = || module("beta", "urn:beta", "b").child(leaf("y", "int32"));

    let forward = build(vec![("alpha.yang", a()), ("beta.yang", b())]).unwrap();
    let backward = build(vec![("beta.yang", b()), ("alpha.yang", a())]).unwrap();

    for outcome in [&forward, &backward] {
        assert!(outcome.context.find_module("alpha", None).is_some());
        assert!(outcome.context.find_module("beta", None).is_some());
    }
}

#[test]
fn test_missing_import_fails_at_linkage() {
    let err = build(vec![(
        "alpha.yang",
        module("alpha", "urn:alpha", "a").child(import("nowhere", "n")),
    )])
    .unwrap_err();
    assert_eq!(err.phase(), Some(ModelPhase::SourceLinkage));
    assert!(err.to_string().contains("nowhere"));
}

#[test]
fn test_self_import_is_rejected() {
    let err = build(vec![(
        "alpha.yang",
        module("alpha", "urn:alpha", "a").child(import("alpha", "a2")),
    )])
    .unwrap_err();
    assert_eq!(err.phase(), Some(ModelPhase::SourceLinkage));
    assert!(err.to_string().contains("imports itself"));
}

#[test]
fn test_import_cycle_is_detected() {
    let err = build(vec![
        ("a.yang", module("a", "urn:a", "a").child(import("b", "b"))),
        ("b.yang", module("b", "urn:b", "b").child(import("c", "c"))),
        ("c.yang", module("c", "urn:c", "c").child(import("a", "a"))),
    ])
    .unwrap_err();
    assert_eq!(err.phase(), Some(ModelPhase::SourceLinkage));
    assert!(err.to_string().contains("import cycle"));
}

#[test]
fn test_duplicate_module_revision_is_rejected() {
    let with_rev = || {
        module("alpha", "urn:alpha", "a")
            .child(yangr::stmt::build::kw("revision").arg("2024-01-01"))
    };
    let err = build(vec![("one.yang", with_rev()), ("two.yang", with_rev())]).unwrap_err();
    assert_eq!(err.phase(), Some(ModelPhase::SourcePreLinkage));
    assert!(err.to_string().contains("duplicate source"));
}

#[test]
fn test_revisionless_import_selects_highest_revision() {
    use yangr::stmt::build::kw;
    let old = module("beta", "urn:beta", "b")
        .child(kw("revision").arg("2020-06-01"))
        .child(leaf("from-old", "string"));
    let new = module("beta", "urn:beta", "b")
        .child(kw("revision").arg("2023-01-15"))
        .child(leaf("from-new", "string"));
    let alpha = module("alpha", "urn:alpha", "a").child(import("beta", "b"));

    let outcome = build(vec![
        ("beta-old.yang", old),
        ("beta-new.yang", new),
        ("alpha.yang", alpha),
    ])
    .unwrap();

    let rev = Revision::parse("2023-01-15").unwrap();
    let found = outcome.context.find_module("beta", None).unwrap();
    assert_eq!(found.qname.revision(), Some(&rev));
    assert!(outcome
        .context
        .find_module("beta", Some(&Revision::parse("2020-06-01").unwrap()))
        .is_some());
}

#[test]
fn test_exact_revision_import_must_match() {
    use yangr::stmt::build::kw;
    let beta = module("beta", "urn:beta", "b").child(kw("revision").arg("2020-06-01"));
    let alpha = module("alpha", "urn:alpha", "a").child(
        kw("import")
            .arg("beta")
            .child(kw("prefix").arg("b"))
            .child(kw("revision-date").arg("2019-01-01")),
    );
    let err = build(vec![("beta.yang", beta), ("alpha.yang", alpha)]).unwrap_err();
    assert_eq!(err.phase(), Some(ModelPhase::SourceLinkage));
    assert!(err.to_string().contains("2019-01-01"));
}

#[test]
fn test_submodule_content_surfaces_in_parent_module() {
    use yangr::stmt::build::kw;
    let main = module("alpha", "urn:alpha", "a").child(kw("include").arg("alpha-sub"));
    let sub = submodule("alpha-sub", "alpha", "a").child(leaf("from-sub", "string"));

    let outcome = build(vec![("alpha.yang", main), ("alpha-sub.yang", sub)]).unwrap();
    let alpha = outcome.context.find_module("alpha", None).unwrap();
    let leaf_node = alpha.child_named("from-sub").unwrap();
    // Submodule definitions carry the parent module's namespace.
    assert_eq!(leaf_node.qname.namespace(), "urn:alpha");
}

#[test]
fn test_include_of_foreign_submodule_is_rejected() {
    use yangr::stmt::build::kw;
    let main = module("alpha", "urn:alpha", "a").child(kw("include").arg("gamma-sub"));
    let sub = submodule("gamma-sub", "gamma", "g");
    let gamma = module("gamma", "urn:gamma", "g");

    let err = build(vec![
        ("alpha.yang", main),
        ("gamma-sub.yang", sub),
        ("gamma.yang", gamma),
    ])
    .unwrap_err();
    assert_eq!(err.phase(), Some(ModelPhase::SourceLinkage));
    assert!(err.to_string().contains("belongs to"));
}

#[test]
fn test_non_module_root_is_rejected() {
    let err = build(vec![("x.yang", yangr::stmt::build::kw("container").arg("c"))]).unwrap_err();
    assert!(matches!(err, ReactorError::Source(_)));
    assert!(err.to_string().contains("expected module or submodule"));
}
