//! Source linkage: pulling required sources and ordering them

mod common;

use common::{document, import, module, reference, thing, toy_bundle};
use std::sync::Arc;
use yang_ir::MemorySourceProvider;
use yang_reactor::{ImportResolutionMode, ReactorConfig, ReactorError, StatementReactor};

fn reactor() -> StatementReactor {
    StatementReactor::new(toy_bundle(), ReactorConfig::default())
}

fn names(model: &yang_model::EffectiveModel) -> Vec<&str> {
    model.modules().iter().map(|m| m.name.as_str()).collect()
}

#[test]
fn test_imports_link_before_importers() {
    let model = reactor()
        .new_build()
        .add_source(document(module("app").with_substatement(import("types"))))
        .add_source(document(module("types")))
        .add_source(document(module("base")))
        .build()
        .unwrap();
    assert_eq!(names(&model), vec!["base", "types", "app"]);
}

#[test]
fn test_source_order_does_not_change_the_model() {
    let sources = vec![
        document(module("a").with_substatement(thing("x"))),
        document(module("b").with_substatement(import("a")).with_substatement(reference("x"))),
        document(module("c").with_substatement(import("b")).with_substatement(thing("y"))),
    ];
    let forward = reactor().new_build().add_sources(sources.clone()).build().unwrap();
    let backward = reactor()
        .new_build()
        .add_sources(sources.into_iter().rev())
        .build()
        .unwrap();
    assert_eq!(forward, backward);
}

#[test]
fn test_missing_import_names_requester() {
    let error = reactor()
        .new_build()
        .add_source(document(module("app").with_substatement(import("absent"))))
        .build()
        .unwrap_err();
    assert_eq!(
        error,
        ReactorError::MissingSource {
            requester: "app".to_string(),
            required: "absent".to_string(),
        }
    );
}

#[test]
fn test_library_source_pulled_on_demand() {
    let report = reactor()
        .new_build()
        .add_source(document(module("app").with_substatement(import("lib"))))
        .add_library_source(document(module("lib").with_substatement(import("deeper"))))
        .add_library_source(document(module("deeper")))
        .add_library_source(document(module("unused")))
        .build_with_report();

    assert!(report.is_success(), "{:?}", report.error);
    assert_eq!(report.stats.sources, 3);
    assert_eq!(report.stats.pulled_sources, 2);
    let model = report.model.unwrap();
    assert_eq!(names(&model), vec!["deeper", "lib", "app"]);
}

#[test]
fn test_provider_fills_missing_imports() -> anyhow::Result<()> {
    let provider: MemorySourceProvider = [document(module("remote"))].into_iter().collect();
    let report = reactor()
        .new_build()
        .add_source(document(module("app").with_substatement(import("remote"))))
        .with_source_provider(Arc::new(provider))
        .build_with_report();
    assert_eq!(report.stats.pulled_sources, 1);
    let model = report.into_result()?;
    assert!(model.find_module("remote", None).is_some());
    Ok(())
}

#[test]
fn test_import_cycle_strict() {
    let error = reactor()
        .new_build()
        .add_source(document(module("a").with_substatement(import("b"))))
        .add_source(document(module("b").with_substatement(import("a"))))
        .build()
        .unwrap_err();
    match error {
        ReactorError::ImportCycle { cycle } => {
            assert_eq!(cycle.first(), cycle.last());
            assert!(cycle.contains(&"a".to_string()) && cycle.contains(&"b".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_import_cycle_lenient() {
    let config = ReactorConfig::default().with_import_resolution(ImportResolutionMode::Lenient);
    let model = StatementReactor::new(toy_bundle(), config)
        .new_build()
        .add_source(document(module("b").with_substatement(import("a"))))
        .add_source(document(module("a").with_substatement(import("b"))))
        .build()
        .unwrap();
    assert_eq!(names(&model), vec!["a", "b"]);
}

#[test]
fn test_duplicate_module_name_conflicts() {
    let error = reactor()
        .new_build()
        .add_source(document(module("twin")))
        .add_source(document(module("twin")))
        .build()
        .unwrap_err();
    assert!(matches!(error, ReactorError::Conflict { ref namespace, .. } if namespace == "module"));
}
