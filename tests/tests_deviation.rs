//! Deviations: not-supported, add, replace, delete, policy.

mod helpers;

use helpers::{build, build_with, import, leaf, module};
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use yangr::stmt::build::kw;
use yangr::{
    DeviationPolicy, EffectiveKind, ModelPhase, ReactorConfig, ReactorError, Severity,
};

fn base_module() -> yangr::stmt::build::StatementBuilder {
    module("base", "urn:base", "b").child(
        kw("container")
            .arg("system")
            .child(leaf("hostname", "string"))
            .child(leaf("mtu", "uint16").child(kw("default").arg("1500"))),
    )
}

#[test]
fn test_not_supported_removes_the_target() {
    let dev = module("dev", "urn:dev", "d")
        .child(import("base", "b"))
        .child(
            kw("deviation")
                .arg("/b:system/b:hostname")
                .child(kw("deviate").arg("not-supported")),
        );

    let outcome = build(vec![("base.yang", base_module()), ("dev.yang", dev)]).unwrap();
    let base = outcome.context.find_module("base", None).unwrap();
    let system = base.child_named("system").unwrap();
    assert!(system.child_named("hostname").is_none());
    assert!(system.child_named("mtu").is_some());
}

#[test]
fn test_not_supported_combined_with_other_deviates_fails() {
    let dev = module("dev", "urn:dev", "d")
        .child(import("base", "b"))
        .child(
            kw("deviation")
                .arg("/b:system/b:hostname")
                .child(kw("deviate").arg("not-supported"))
                .child(kw("deviate").arg("add").child(kw("config").arg("false"))),
        );

    let err = build(vec![("base.yang", base_module()), ("dev.yang", dev)]).unwrap_err();
    assert!(matches!(err, ReactorError::Source(_)));
    assert!(err.to_string().contains("not-supported"));
}

#[test]
fn test_deviate_add_inserts_new_property() {
    let dev = module("dev", "urn:dev", "d")
        .child(import("base", "b"))
        .child(
            kw("deviation")
                .arg("/b:system/b:hostname")
                .child(kw("deviate").arg("add").child(kw("default").arg("router"))),
        );

    let outcome = build(vec![("base.yang", base_module()), ("dev.yang", dev)]).unwrap();
    let base = outcome.context.find_module("base", None).unwrap();
    let hostname = base.child_named("system").unwrap().child_named("hostname").unwrap();
    match &hostname.kind {
        EffectiveKind::Leaf { default, .. } => assert_eq!(default.as_deref(), Some("router")),
        other => panic!("expected leaf, got {other:?}"),
    }
}

#[test]
fn test_deviate_add_of_existing_single_property_fails() {
    let dev = module("dev", "urn:dev", "d")
        .child(import("base", "b"))
        .child(
            kw("deviation")
                .arg("/b:system/b:mtu")
                .child(kw("deviate").arg("add").child(kw("default").arg("9000"))),
        );

    let err = build(vec![("base.yang", base_module()), ("dev.yang", dev)]).unwrap_err();
    assert!(matches!(err, ReactorError::Source(_)));
    assert!(err.to_string().contains("already present"));
}

#[test]
fn test_deviate_replace_swaps_existing_property() {
    let dev = module("dev", "urn:dev", "d")
        .child(import("base", "b"))
        .child(
            kw("deviation")
                .arg("/b:system/b:mtu")
                .child(kw("deviate").arg("replace").child(kw("default").arg("9000"))),
        );

    let outcome = build(vec![("base.yang", base_module()), ("dev.yang", dev)]).unwrap();
    let base = outcome.context.find_module("base", None).unwrap();
    let mtu = base.child_named("system").unwrap().child_named("mtu").unwrap();
    match &mtu.kind {
        EffectiveKind::Leaf { default, .. } => assert_eq!(default.as_deref(), Some("9000")),
        other => panic!("expected leaf, got {other:?}"),
    }
}

#[test]
fn test_deviate_replace_of_missing_config_fails_hard() {
    let dev = module("dev", "urn:dev", "d")
        .child(import("base", "b"))
        .child(
            kw("deviation")
                .arg("/b:system/b:hostname")
                .child(kw("deviate").arg("replace").child(kw("config").arg("false"))),
        );

    let err = build(vec![("base.yang", base_module()), ("dev.yang", dev)]).unwrap_err();
    assert!(matches!(err, ReactorError::Source(_)));
    assert!(err.to_string().contains("no such property"));
}

#[test]
fn test_deviate_replace_of_missing_units_degrades_to_warning() {
    let dev = module("dev", "urn:dev", "d")
        .child(import("base", "b"))
        .child(
            kw("deviation")
                .arg("/b:system/b:mtu")
                .child(kw("deviate").arg("replace").child(kw("units").arg("octets"))),
        );

    let outcome = build(vec![("base.yang", base_module()), ("dev.yang", dev)]).unwrap();
    assert!(outcome
        .diagnostics
        .iter()
        .any(|d| d.severity == Severity::Warning && d.message.contains("units")));
    let base = outcome.context.find_module("base", None).unwrap();
    let mtu = base.child_named("system").unwrap().child_named("mtu").unwrap();
    match &mtu.kind {
        EffectiveKind::Leaf { units, .. } => assert_eq!(units.as_deref(), Some("octets")),
        other => panic!("expected leaf, got {other:?}"),
    }
}

#[test]
fn test_deviate_delete_mismatch_warns_and_leaves_target() {
    let dev = module("dev", "urn:dev", "d")
        .child(import("base", "b"))
        .child(
            kw("deviation")
                .arg("/b:system/b:mtu")
                .child(kw("deviate").arg("delete").child(kw("default").arg("1400"))),
        );

    let outcome = build(vec![("base.yang", base_module()), ("dev.yang", dev)]).unwrap();
    assert!(outcome
        .diagnostics
        .iter()
        .any(|d| d.severity == Severity::Warning && d.message.contains("no matching property")));
    let base = outcome.context.find_module("base", None).unwrap();
    let mtu = base.child_named("system").unwrap().child_named("mtu").unwrap();
    match &mtu.kind {
        EffectiveKind::Leaf { default, .. } => assert_eq!(default.as_deref(), Some("1500")),
        other => panic!("expected leaf, got {other:?}"),
    }
}

#[test]
fn test_deviate_delete_with_matching_argument_removes_property() {
    let dev = module("dev", "urn:dev", "d")
        .child(import("base", "b"))
        .child(
            kw("deviation")
                .arg("/b:system/b:mtu")
                .child(kw("deviate").arg("delete").child(kw("default").arg("1500"))),
        );

    let outcome = build(vec![("base.yang", base_module()), ("dev.yang", dev)]).unwrap();
    let base = outcome.context.find_module("base", None).unwrap();
    let mtu = base.child_named("system").unwrap().child_named("mtu").unwrap();
    match &mtu.kind {
        EffectiveKind::Leaf { default, .. } => assert_eq!(default.as_deref(), None),
        other => panic!("expected leaf, got {other:?}"),
    }
}

#[test]
fn test_module_cannot_deviate_itself() {
    let m = module("alpha", "urn:alpha", "a")
        .child(kw("container").arg("c").child(leaf("x", "string")))
        .child(
            kw("deviation")
                .arg("/c/x")
                .child(kw("deviate").arg("not-supported")),
        );

    let err = build(vec![("alpha.yang", m)]).unwrap_err();
    assert_eq!(err.phase(), Some(ModelPhase::FullDeclaration));
    assert!(err.to_string().contains("deviates its own node"));
}

#[test]
fn test_deviation_policy_skips_unauthorized_modules() {
    let dev = module("dev", "urn:dev", "d")
        .child(import("base", "b"))
        .child(
            kw("deviation")
                .arg("/b:system/b:hostname")
                .child(kw("deviate").arg("not-supported")),
        );

    let mut allowed: FxHashMap<SmolStr, FxHashSet<SmolStr>> = FxHashMap::default();
    allowed.insert(
        SmolStr::new("base"),
        [SmolStr::new("vendor")].into_iter().collect(),
    );
    let config = ReactorConfig {
        deviations: DeviationPolicy::PerModule(allowed),
        ..ReactorConfig::default()
    };

    let outcome =
        build_with(config, vec![("base.yang", base_module()), ("dev.yang", dev)]).unwrap();
    let base = outcome.context.find_module("base", None).unwrap();
    // "dev" is not on the allow list; the deviation is ignored.
    assert!(base.child_named("system").unwrap().child_named("hostname").is_some());
}
