//! Type derivation: typedef chains, restriction narrowing, inheritance.

mod helpers;

use helpers::{build, import, leaf, module};
use yangr::resolve::BuiltinType;
use yangr::stmt::build::kw;
use yangr::{EffectiveKind, ModelPhase, QNameModule};

#[test]
fn test_typedef_chain_resolves_to_builtin() {
    let m = module("net", "urn:net", "n")
        .child(
            kw("typedef")
                .arg("percent")
                .child(kw("type").arg("uint8").child(kw("range").arg("0..100"))),
        )
        .child(
            kw("typedef")
                .arg("load")
                .child(kw("type").arg("percent"))
                .child(kw("units").arg("percent")),
        )
        .child(leaf("cpu", "load"));

    let outcome = build(vec![("net.yang", m)]).unwrap();
    let net = outcome.context.find_module("net", None).unwrap();
    let cpu = net.child_named("cpu").unwrap();
    match &cpu.kind {
        EffectiveKind::Leaf { ty, units, .. } => {
            assert_eq!(ty.builtin(), BuiltinType::Uint8);
            // Chain is walkable, most-derived first.
            let chain: Vec<&str> = ty.chain().iter().map(|q| q.local_name()).collect();
            assert_eq!(chain, vec!["load", "percent"]);
            assert_eq!(units.as_deref(), Some("percent"));
            assert!(ty.range().unwrap().contains(100.0));
            assert!(!ty.range().unwrap().contains(101.0));
        }
        other => panic!("expected leaf, got {other:?}"),
    }
}

#[test]
fn test_three_level_narrowing_intersects() {
    let m = module("net", "urn:net", "n")
        .child(
            kw("typedef")
                .arg("name")
                .child(kw("type").arg("string").child(kw("length").arg("1..64"))),
        )
        .child(
            kw("typedef")
                .arg("short-name")
                .child(kw("type").arg("name").child(kw("length").arg("1..16"))),
        )
        .child(
            kw("leaf").arg("tag").child(
                kw("type")
                    .arg("short-name")
                    .child(kw("length").arg("min..8"))
                    .child(kw("pattern").arg("[a-z]+")),
            ),
        );

    let outcome = build(vec![("net.yang", m)]).unwrap();
    let net = outcome.context.find_module("net", None).unwrap();
    let tag = net.child_named("tag").unwrap();
    match &tag.kind {
        EffectiveKind::Leaf { ty, .. } => {
            let length = ty.length().unwrap();
            assert!(length.allows(1));
            assert!(length.allows(8));
            assert!(!length.allows(9));
            assert_eq!(ty.patterns().len(), 1);
        }
        other => panic!("expected leaf, got {other:?}"),
    }
}

#[test]
fn test_widening_restriction_is_rejected() {
    let m = module("net", "urn:net", "n")
        .child(
            kw("typedef")
                .arg("small")
                .child(kw("type").arg("uint8").child(kw("range").arg("0..10"))),
        )
        .child(
            kw("leaf")
                .arg("x")
                .child(kw("type").arg("small").child(kw("range").arg("0..20"))),
        );

    let err = build(vec![("net.yang", m)]).unwrap_err();
    assert_eq!(err.phase(), Some(ModelPhase::EffectiveModel));
    assert!(err.to_string().contains("widens"));
}

#[test]
fn test_patterns_accumulate_along_the_chain() {
    let m = module("net", "urn:net", "n")
        .child(
            kw("typedef")
                .arg("word")
                .child(kw("type").arg("string").child(kw("pattern").arg("\\w+"))),
        )
        .child(
            kw("leaf")
                .arg("x")
                .child(kw("type").arg("word").child(kw("pattern").arg("[a-m]+"))),
        );

    let outcome = build(vec![("net.yang", m)]).unwrap();
    let net = outcome.context.find_module("net", None).unwrap();
    match &net.child_named("x").unwrap().kind {
        EffectiveKind::Leaf { ty, .. } => assert_eq!(ty.patterns().len(), 2),
        other => panic!("expected leaf, got {other:?}"),
    }
}

#[test]
fn test_default_inherits_from_typedef_unless_overridden() {
    let m = module("net", "urn:net", "n")
        .child(
            kw("typedef")
                .arg("mtu")
                .child(kw("type").arg("uint16"))
                .child(kw("default").arg("1500")),
        )
        .child(leaf("a", "mtu"))
        .child(leaf("b", "mtu").child(kw("default").arg("9000")));

    let outcome = build(vec![("net.yang", m)]).unwrap();
    let net = outcome.context.find_module("net", None).unwrap();
    let default_of = |name: &str| match &net.child_named(name).unwrap().kind {
        EffectiveKind::Leaf { default, .. } => default.clone(),
        other => panic!("expected leaf, got {other:?}"),
    };
    assert_eq!(default_of("a").as_deref(), Some("1500"));
    assert_eq!(default_of("b").as_deref(), Some("9000"));
}

#[test]
fn test_typedef_cycle_is_fatal() {
    let m = module("net", "urn:net", "n")
        .child(kw("typedef").arg("a").child(kw("type").arg("b")))
        .child(kw("typedef").arg("b").child(kw("type").arg("a")))
        .child(leaf("x", "a"));

    let err = build(vec![("net.yang", m)]).unwrap_err();
    assert_eq!(err.phase(), Some(ModelPhase::EffectiveModel));
    assert!(err.to_string().contains("derives from itself"));
}

#[test]
fn test_unknown_type_is_fatal() {
    let m = module("net", "urn:net", "n").child(leaf("x", "no-such-type"));
    let err = build(vec![("net.yang", m)]).unwrap_err();
    assert_eq!(err.phase(), Some(ModelPhase::EffectiveModel));
    assert!(err.to_string().contains("no-such-type"));
}

#[test]
fn test_union_members_resolve_independently() {
    let m = module("net", "urn:net", "n").child(
        kw("leaf").arg("x").child(
            kw("type")
                .arg("union")
                .child(kw("type").arg("uint8"))
                .child(kw("type").arg("string")),
        ),
    );

    let outcome = build(vec![("net.yang", m)]).unwrap();
    let net = outcome.context.find_module("net", None).unwrap();
    match &net.child_named("x").unwrap().kind {
        EffectiveKind::Leaf { ty, .. } => {
            assert_eq!(ty.builtin(), BuiltinType::Union);
            let members: Vec<BuiltinType> =
                ty.union_members().iter().map(|m| m.builtin()).collect();
            assert_eq!(members, vec![BuiltinType::Uint8, BuiltinType::String]);
        }
        other => panic!("expected leaf, got {other:?}"),
    }
}

#[test]
fn test_identityref_carries_resolved_base() {
    let m = module("net", "urn:net", "n")
        .child(kw("identity").arg("protocol"))
        .child(
            kw("leaf")
                .arg("proto")
                .child(kw("type").arg("identityref").child(kw("base").arg("protocol"))),
        );

    let outcome = build(vec![("net.yang", m)]).unwrap();
    let net = outcome.context.find_module("net", None).unwrap();
    match &net.child_named("proto").unwrap().kind {
        EffectiveKind::Leaf { ty, .. } => {
            let qm = QNameModule::new("urn:net", None);
            assert_eq!(ty.identity_bases(), &[qm.qname("protocol")]);
        }
        other => panic!("expected leaf, got {other:?}"),
    }
}

#[test]
fn test_cross_module_typedef_resolves_through_prefix() {
    let lib = module("lib", "urn:lib", "l").child(
        kw("typedef")
            .arg("port")
            .child(kw("type").arg("uint16").child(kw("range").arg("1..65535"))),
    );
    let app = module("app", "urn:app", "ap")
        .child(import("lib", "l"))
        .child(leaf("listen", "l:port"));

    let outcome = build(vec![("lib.yang", lib), ("app.yang", app)]).unwrap();
    let app = outcome.context.find_module("app", None).unwrap();
    match &app.child_named("listen").unwrap().kind {
        EffectiveKind::Leaf { ty, .. } => {
            assert_eq!(ty.builtin(), BuiltinType::Uint16);
            assert!(!ty.range().unwrap().contains(0.0));
        }
        other => panic!("expected leaf, got {other:?}"),
    }
    // The typedef also surfaces in the aggregated view.
    let qm = QNameModule::new("urn:lib", None);
    assert!(outcome.context.typedef(&qm.qname("port")).is_some());
}
