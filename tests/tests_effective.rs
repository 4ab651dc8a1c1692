//! The effective model: synthesis, config inheritance, lookups, determinism.

mod helpers;

use helpers::{build, leaf, module, path};
use yangr::stmt::build::kw;
use yangr::{EffectiveKind, EffectiveNode, ModelPhase, ParserMode, ReactorConfig, ReactorError};

#[test]
fn test_rpc_gets_implicit_input_and_output() {
    let m = module("sys", "urn:sys", "s").child(
        kw("rpc")
            .arg("restart")
            .child(kw("input").child(leaf("delay", "uint32"))),
    );

    let outcome = build(vec![("sys.yang", m)]).unwrap();
    let rpc = outcome.context.rpcs().next().unwrap();
    let input = rpc.child_named("input").unwrap();
    assert!(matches!(input.kind, EffectiveKind::Input));
    assert!(input.child_named("delay").is_some());
    // Output was not declared; the reactor synthesizes it.
    let output = rpc.child_named("output").unwrap();
    assert!(matches!(output.kind, EffectiveKind::Output));
    assert!(output.children.is_empty());
}

#[test]
fn test_choice_shorthand_gets_synthetic_case() {
    let m = module("sys", "urn:sys", "s").child(
        kw("container").arg("c").child(
            kw("choice")
                .arg("mode")
                .child(leaf("simple", "string"))
                .child(kw("case").arg("full").child(leaf("detail", "string"))),
        ),
    );

    let outcome = build(vec![("sys.yang", m)]).unwrap();
    let sys = outcome.context.find_module("sys", None).unwrap();
    let choice = sys.child_named("c").unwrap().child_named("mode").unwrap();
    let shorthand = choice.child_named("simple").unwrap();
    assert!(matches!(shorthand.kind, EffectiveKind::Case));
    assert!(shorthand.child_named("simple").is_some());
    let explicit = choice.child_named("full").unwrap();
    assert!(matches!(explicit.kind, EffectiveKind::Case));
}

#[test]
fn test_config_false_is_inherited() {
    let m = module("sys", "urn:sys", "s").child(
        kw("container")
            .arg("state")
            .child(kw("config").arg("false"))
            .child(kw("container").arg("counters").child(leaf("rx", "uint64"))),
    );

    let outcome = build(vec![("sys.yang", m)]).unwrap();
    let sys = outcome.context.find_module("sys", None).unwrap();
    let state = sys.child_named("state").unwrap();
    assert_eq!(state.kind.config(), Some(false));
    let rx = state.child_named("counters").unwrap().child_named("rx").unwrap();
    assert_eq!(rx.kind.config(), Some(false));
}

#[test]
fn test_config_defaults_to_true() {
    let m = module("sys", "urn:sys", "s")
        .child(kw("container").arg("conf").child(leaf("x", "string")));
    let outcome = build(vec![("sys.yang", m)]).unwrap();
    let sys = outcome.context.find_module("sys", None).unwrap();
    let x = sys.child_named("conf").unwrap().child_named("x").unwrap();
    assert_eq!(x.kind.config(), Some(true));
}

#[test]
fn test_list_key_must_match_a_leaf() {
    let good = module("sys", "urn:sys", "s").child(
        kw("list")
            .arg("iface")
            .child(kw("key").arg("name"))
            .child(leaf("name", "string")),
    );
    let outcome = build(vec![("sys.yang", good)]).unwrap();
    let sys = outcome.context.find_module("sys", None).unwrap();
    match &sys.child_named("iface").unwrap().kind {
        EffectiveKind::List { keys, .. } => assert_eq!(keys.len(), 1),
        other => panic!("expected list, got {other:?}"),
    }

    let bad = module("sys", "urn:sys", "s").child(
        kw("list")
            .arg("iface")
            .child(kw("key").arg("ghost"))
            .child(leaf("name", "string")),
    );
    let err = build(vec![("sys.yang", bad)]).unwrap_err();
    assert_eq!(err.phase(), Some(ModelPhase::EffectiveModel));
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn test_find_data_schema_node_descends_by_qname() {
    let m = module("sys", "urn:sys", "s").child(
        kw("container")
            .arg("a")
            .child(kw("container").arg("b").child(leaf("c", "string"))),
    );
    let outcome = build(vec![("sys.yang", m)]).unwrap();
    let found = outcome
        .context
        .find_data_schema_node(&path("urn:sys", None, &["a", "b", "c"]))
        .unwrap();
    assert_eq!(found.local_name(), "c");
    assert!(outcome
        .context
        .find_data_schema_node(&path("urn:sys", None, &["a", "ghost"]))
        .is_none());
}

#[test]
fn test_duplicate_sibling_names_are_rejected() {
    let m = module("sys", "urn:sys", "s")
        .child(kw("container").arg("dup"))
        .child(kw("container").arg("dup"));
    let err = build(vec![("sys.yang", m)]).unwrap_err();
    assert!(matches!(err, ReactorError::Source(_)));
    assert!(err.to_string().contains("duplicate"));
}

#[test]
fn test_extension_instances_survive_as_unknown_nodes() {
    let m = module("sys", "urn:sys", "s")
        .child(
            kw("extension")
                .arg("annotation")
                .child(kw("argument").arg("name")),
        )
        .child(
            kw("container")
                .arg("c")
                .child(kw("s:annotation").arg("verified")),
        );

    let outcome = build(vec![("sys.yang", m)]).unwrap();
    let (ext_qname, argument) = outcome.context.extensions().next().unwrap();
    assert_eq!(ext_qname.local_name(), "annotation");
    assert_eq!(argument, Some("name"));

    let sys = outcome.context.find_module("sys", None).unwrap();
    let c = sys.child_named("c").unwrap();
    let unknown = c
        .children
        .iter()
        .find(|n| matches!(n.kind, EffectiveKind::Unknown { .. }))
        .unwrap();
    match &unknown.kind {
        EffectiveKind::Unknown { keyword, argument } => {
            assert_eq!(keyword.as_str(), "s:annotation");
            assert_eq!(argument.as_deref(), Some("verified"));
        }
        other => panic!("expected unknown, got {other:?}"),
    }
}

#[test]
fn test_strict_mode_enforces_argument_grammar() {
    let m = || {
        module("sys", "urn:sys", "s")
            .child(kw("revision").arg("not-a-date"))
            .child(leaf("x", "string"))
    };
    // Lenient mode still rejects it at registration, where the revision
    // value is actually interpreted.
    let err = build(vec![("sys.yang", m())]).unwrap_err();
    assert!(err.to_string().contains("revision"));

    let config = ReactorConfig {
        mode: ParserMode::Strict,
        ..ReactorConfig::default()
    };
    let err = helpers::build_with(config, vec![("sys.yang", m())]).unwrap_err();
    assert!(matches!(
        err,
        ReactorError::Source(_) | ReactorError::Inference(_)
    ));
}

#[test]
fn test_repeated_builds_are_structurally_identical() {
    let make = || {
        vec![
            (
                "base.yang",
                module("base", "urn:base", "b")
                    .child(kw("grouping").arg("g").child(leaf("x", "string")))
                    .child(kw("container").arg("top").child(kw("uses").arg("g")))
                    .child(kw("container").arg("other").child(leaf("y", "int32"))),
            ),
            (
                "ext.yang",
                module("ext", "urn:ext", "e")
                    .child(helpers::import("base", "b"))
                    .child(kw("augment").arg("/b:top").child(leaf("z", "string"))),
            ),
        ]
    };

    fn shape(node: &EffectiveNode, out: &mut Vec<String>) {
        out.push(format!("{}:{}", node.path, node.qname));
        for child in &node.children {
            shape(child, out);
        }
    }

    let first = build(make()).unwrap();
    let second = build(make()).unwrap();
    let mut a = Vec::new();
    let mut b = Vec::new();
    for module in first.context.modules() {
        shape(module, &mut a);
    }
    for module in second.context.modules() {
        shape(module, &mut b);
    }
    assert_eq!(a, b);
    assert!(a.iter().any(|s| s.contains("top/z")));
}

#[test]
fn test_module_metadata_is_carried() {
    let m = module("sys", "urn:sys", "s")
        .child(kw("yang-version").arg("1.1"))
        .child(kw("organization").arg("Example Networks"))
        .child(kw("contact").arg("support@example.net"))
        .child(kw("description").arg("System management."))
        .child(
            kw("revision")
                .arg("2025-02-01")
                .child(kw("description").arg("Second release.")),
        )
        .child(kw("revision").arg("2024-06-15"));

    let outcome = build(vec![("sys.yang", m)]).unwrap();
    let sys = outcome.context.find_module("sys", None).unwrap();
    match &sys.kind {
        EffectiveKind::Module {
            namespace,
            prefix,
            yang_version,
            organization,
            revisions,
            ..
        } => {
            assert_eq!(namespace.as_str(), "urn:sys");
            assert_eq!(prefix.as_deref(), Some("s"));
            assert_eq!(yang_version.as_deref(), Some("1.1"));
            assert_eq!(organization.as_deref(), Some("Example Networks"));
            assert_eq!(revisions.len(), 2);
            assert_eq!(revisions[0].date.as_str(), "2025-02-01");
            assert_eq!(
                revisions[0].description.as_deref(),
                Some("Second release.")
            );
            assert!(revisions[1].description.is_none());
        }
        other => panic!("expected module, got {other:?}"),
    }
    // The module QName carries the newest revision.
    assert_eq!(
        sys.qname.revision().map(|r| r.as_str()),
        Some("2025-02-01")
    );
    assert_eq!(sys.meta.description.as_deref(), Some("System management."));
}
