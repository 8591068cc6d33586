//! `grouping`, `uses` and `refine` against real YANG text

mod common;

use common::{build, build_err, child_names, node, source};
use yang_model::BuiltinType;
use yang_reactor::ReactorError;

#[test]
fn test_uses_of_imported_grouping() {
    let a = source(
        "a",
        r#"module a {
            namespace "urn:a";
            prefix a;
            grouping g { leaf x { type string; } }
        }"#,
    );
    let b = source(
        "b",
        r#"module b {
            namespace "urn:b";
            prefix b;
            import a { prefix a; }
            container c { uses a:g; }
        }"#,
    );
    let model = build(vec![a, b]);

    let container = node(&model, "/b:c");
    assert!(container.find_first("uses").is_none());
    assert_eq!(child_names(container), ["x"]);

    let x = node(&model, "/b:c/x");
    let definition = x.properties.type_definition.as_ref().unwrap();
    assert_eq!(definition.base, BuiltinType::String);
    assert_eq!(x.properties.origin, yang_model::StatementOrigin::Uses);
    // copies take the namespace of the module that uses the grouping
    assert_eq!(x.qname().unwrap().module, model.find_module("b", None).unwrap().module);
}

#[test]
fn test_nested_uses_keeps_position() {
    let m = source(
        "m",
        r#"module m {
            namespace "urn:m";
            prefix m;
            grouping inner { leaf deep { type int32; } }
            grouping outer { leaf first { type string; } uses inner; }
            container top {
                leaf before { type string; }
                uses outer;
                leaf after { type string; }
            }
        }"#,
    );
    let model = build(vec![m]);
    let top = node(&model, "/m:top");
    assert_eq!(child_names(top), ["before", "first", "deep", "after"]);
    assert_eq!(
        node(&model, "/m:top/deep").properties.schema_path.as_ref().map(|p| p.steps.len()),
        Some(2)
    );
}

#[test]
fn test_grouping_cycle_is_reported() {
    let a = source(
        "a",
        r#"module a {
            namespace "urn:a";
            prefix a;
            grouping g1 { uses g2; }
            grouping g2 { uses g1; }
        }"#,
    );
    let errors = build_err(vec![a]);
    assert!(
        errors.iter().any(|e| matches!(
            e,
            ReactorError::DependencyCycle { members } if members == &["grouping g1", "grouping g2"]
        )),
        "{errors:?}"
    );
}

#[test]
fn test_unknown_grouping_is_unresolved() {
    let a = source(
        "a",
        r#"module a {
            namespace "urn:a";
            prefix a;
            container c { uses nowhere; }
        }"#,
    );
    let errors = build_err(vec![a]);
    assert!(errors.iter().any(|e| matches!(
        e,
        ReactorError::UnresolvedReference { referrer, target, .. }
            if referrer == "uses nowhere" && target == "grouping nowhere"
    )));
}

#[test]
fn test_refine_replaces_default_and_adds_mandatory() {
    let r = source(
        "r",
        r#"module r {
            namespace "urn:r";
            prefix r;
            grouping g {
                leaf port { type uint16; default 80; }
                container opts { leaf verbose { type boolean; } }
            }
            container srv {
                uses g {
                    refine port { default 8080; }
                    refine opts/verbose { mandatory true; }
                }
            }
        }"#,
    );
    let model = build(vec![r]);

    let port = node(&model, "/r:srv/port");
    assert_eq!(port.properties.default_value.as_deref(), Some("8080"));
    assert_eq!(port.find_all("default").count(), 1);
    assert!(node(&model, "/r:srv/opts/verbose").properties.mandatory);

    // the grouping itself is untouched
    let grouping = model.find_module("r", None).unwrap().find_top_level("grouping", "g").unwrap();
    let original = grouping.substatements.iter().find(|s| s.is("leaf")).unwrap();
    assert_eq!(original.first_text("default"), Some("80"));
}

#[test]
fn test_refine_through_implicit_case() {
    let r = source(
        "r",
        r#"module r {
            namespace "urn:r";
            prefix r;
            grouping g {
                choice mode { leaf fast { type boolean; } }
            }
            container srv {
                uses g { refine mode/fast/fast { default true; } }
            }
        }"#,
    );
    let model = build(vec![r]);

    assert!(node(&model, "/r:srv/mode/fast").is("case"));
    let fast = node(&model, "/r:srv/mode/fast/fast");
    assert!(fast.is("leaf"));
    assert_eq!(fast.properties.default_value.as_deref(), Some("true"));
}

#[test]
fn test_refine_of_missing_node() {
    let r = source(
        "r",
        r#"module r {
            namespace "urn:r";
            prefix r;
            grouping g { leaf port { type uint16; } }
            container srv { uses g { refine missing { mandatory true; } } }
        }"#,
    );
    let errors = build_err(vec![r]);
    assert!(errors.iter().any(|e| matches!(
        e,
        ReactorError::UnresolvedReference { target, .. } if target == "refine target missing"
    )));
}

#[test]
fn test_uses_augment_extends_copy() {
    let m = source(
        "m",
        r#"module m {
            namespace "urn:m";
            prefix m;
            grouping g { container box { leaf a { type string; } } }
            container top {
                uses g {
                    augment box { leaf b { type string; } }
                }
            }
        }"#,
    );
    let model = build(vec![m]);
    assert_eq!(child_names(node(&model, "/m:top/box")), ["a", "b"]);
}
