//! Phase loop behaviour against a small statement bundle

mod common;

use common::{
    TraceLog, bundle_with_log, document, import, init_tracing, module, reference, thing, toy_bundle,
};
use std::sync::Arc;
use std::time::Duration;
use yang_ir::{Keyword, RawStatement};
use yang_model::StatementOrigin;
use yang_reactor::{
    CancellationToken, ModelProcessingPhase, ReactorConfig, ReactorError, StatementReactor,
    StatementSupportBundle, UnknownStatementPolicy,
};

fn reactor() -> StatementReactor {
    StatementReactor::new(toy_bundle(), ReactorConfig::default())
}

fn named<'a>(
    parent: &'a yang_model::EffectiveStatement,
    keyword: &str,
    name: &str,
) -> Option<&'a Arc<yang_model::EffectiveStatement>> {
    parent
        .substatements
        .iter()
        .find(|s| s.is(keyword) && s.argument.as_text() == Some(name))
}

#[test]
fn test_single_module_completes_every_phase() {
    let source = module("a").with_substatement(thing("x")).with_substatement(reference("x"));
    let report = reactor().new_build().add_source(document(source)).build_with_report();

    assert!(report.is_success(), "{:?}", report.error);
    assert_eq!(report.stats.completed_phases, ModelProcessingPhase::ALL.to_vec());
    assert_eq!(report.stats.sources, 1);
    assert_eq!(report.stats.pulled_sources, 0);
    assert_eq!(report.stats.actions_registered, 1);
    assert_eq!(report.stats.actions_applied, 1);

    let model = report.model.unwrap();
    let entry = model.find_module("a", None).unwrap();
    assert_eq!(entry.prefix, "a");
    assert_eq!(&*entry.module.namespace, "urn:test:a");
    let r = entry.effective.find_first("ref").unwrap();
    assert_eq!(r.properties.default_value.as_deref(), Some("thing x"));
}

#[test]
fn test_callbacks_run_in_global_lockstep() {
    let log = TraceLog::default();
    let reactor = StatementReactor::new(bundle_with_log(Arc::clone(&log)), ReactorConfig::default());
    let a = module("a")
        .with_substatement(RawStatement::with_argument("trace", "a1"))
        .with_substatement(RawStatement::with_argument("trace", "a2"));
    let b = module("b").with_substatement(RawStatement::with_argument("trace", "b1"));
    reactor
        .new_build()
        .add_source(document(a))
        .add_source(document(b))
        .build()
        .unwrap();

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 3 * ModelProcessingPhase::ALL.len());
    assert!(log.windows(2).all(|w| w[0].0 <= w[1].0));
    for name in ["a1", "a2", "b1"] {
        let phases: Vec<ModelProcessingPhase> =
            log.iter().filter(|(_, n)| n == name).map(|(p, _)| *p).collect();
        assert_eq!(phases, ModelProcessingPhase::ALL.to_vec());
    }
}

#[test]
fn test_copies_catch_up_on_missed_phases() {
    let log = TraceLog::default();
    let reactor = StatementReactor::new(bundle_with_log(Arc::clone(&log)), ReactorConfig::default());
    let source = module("a")
        .with_substatement(thing("proto").with_substatement(RawStatement::with_argument("trace", "inner")))
        .with_substatement(thing("holder").with_substatement(RawStatement::with_argument("clone", "proto")));
    let report = reactor.new_build().add_source(document(source)).build_with_report();
    assert!(report.is_success(), "{:?}", report.error);
    assert_eq!(report.stats.copies, 2);

    let log = log.lock().unwrap();
    let phases: Vec<ModelProcessingPhase> = log
        .iter()
        .filter(|(_, n)| n == "inner")
        .map(|(p, _)| *p)
        .collect();
    assert_eq!(phases.len(), 2 * ModelProcessingPhase::ALL.len());

    let model = report.model.unwrap();
    let entry = model.find_module("a", None).unwrap();
    let holder = named(&entry.effective, "thing", "holder").unwrap();
    let copy = named(holder, "thing", "proto").unwrap();
    assert_eq!(copy.properties.origin, StatementOrigin::Uses);
    assert!(copy.declared.is_some());
    assert!(holder.find_first("clone").is_none());
}

#[test]
fn test_unknown_statement_kept_as_opaque() {
    let source = module("a").with_substatement(RawStatement::with_argument("frobnicate", "x"));
    let report = reactor().new_build().add_source(document(source)).build_with_report();

    assert!(report.is_success());
    assert!(report.has_warnings());
    assert!(report.warnings[0].contains("frobnicate"));
    let model = report.model.unwrap();
    let opaque = model.modules()[0].effective.find_first("frobnicate").unwrap();
    assert_eq!(opaque.argument.as_text(), Some("x"));
}

#[test]
fn test_unknown_statement_rejected() {
    let config = ReactorConfig::default().with_unknown_statements(UnknownStatementPolicy::Reject);
    let reactor = StatementReactor::new(toy_bundle(), config);
    let source = module("a").with_substatement(RawStatement::with_argument("frobnicate", "x"));
    let error = reactor.new_build().add_source(document(source)).build().unwrap_err();

    match error {
        ReactorError::InvalidStatement { message, .. } => {
            assert!(message.contains("unknown statement 'frobnicate'"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_mandatory_substatement() {
    let source = RawStatement::with_argument("module", "a")
        .with_substatement(RawStatement::with_argument("prefix", "a"));
    let error = reactor().new_build().add_source(document(source)).build().unwrap_err();
    assert!(error.to_string().contains("missing mandatory 'namespace' in module a"));
}

#[test]
fn test_unresolved_reference() {
    let source = module("a").with_substatement(reference("nowhere"));
    let error = reactor().new_build().add_source(document(source)).build().unwrap_err();

    match error {
        ReactorError::UnresolvedReference {
            referrer,
            target,
            phase,
            ..
        } => {
            assert_eq!(referrer, "ref nowhere");
            assert_eq!(target, "thing nowhere");
            assert_eq!(phase, ModelProcessingPhase::FullDeclaration);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_fail_slow_collects_every_error() {
    init_tracing();
    let source = module("a")
        .with_substatement(reference("first"))
        .with_substatement(reference("second"));
    let report = reactor().new_build().add_source(document(source)).build_with_report();

    assert!(!report.is_success());
    assert!(matches!(
        report.error,
        Some(ReactorError::PhaseFailed {
            phase: ModelProcessingPhase::FullDeclaration,
            ..
        })
    ));
    assert_eq!(report.errors().len(), 2);
}

#[test]
fn test_fail_fast_stops_at_first_error() {
    let reactor = StatementReactor::new(toy_bundle(), ReactorConfig::fail_fast());
    let source = module("a")
        .with_substatement(reference("first"))
        .with_substatement(reference("second"));
    let error = reactor.new_build().add_source(document(source)).build().unwrap_err();
    assert!(matches!(error, ReactorError::UnresolvedReference { .. }));
}

#[test]
fn test_mutual_wait_is_a_dependency_cycle() {
    let source = module("a")
        .with_substatement(thing("left").with_substatement(reference("right")))
        .with_substatement(thing("right").with_substatement(reference("left")));
    let error = reactor().new_build().add_source(document(source)).build().unwrap_err();

    match error {
        ReactorError::DependencyCycle { members } => {
            assert_eq!(members, vec!["thing left".to_string(), "thing right".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_duplicate_definition_conflicts() {
    let source = module("a").with_substatement(thing("x")).with_substatement(thing("x"));
    let error = reactor().new_build().add_source(document(source)).build().unwrap_err();
    assert!(matches!(error, ReactorError::Conflict { ref key, .. } if key == "x"));
}

#[test]
fn test_cancelled_before_start() {
    let token = CancellationToken::new();
    token.cancel();
    let error = reactor()
        .new_build()
        .add_source(document(module("a")))
        .with_cancellation(token)
        .build()
        .unwrap_err();
    assert_eq!(
        error,
        ReactorError::Cancelled {
            phase: ModelProcessingPhase::Init
        }
    );
}

#[test]
fn test_zero_timeout_expires_immediately() {
    let config = ReactorConfig::default().with_timeout(Duration::ZERO);
    let reactor = StatementReactor::new(toy_bundle(), config);
    let error = reactor
        .new_build()
        .add_source(document(module("a")))
        .build()
        .unwrap_err();
    assert!(matches!(
        error,
        ReactorError::TimedOut {
            phase: ModelProcessingPhase::Init,
            ..
        }
    ));
}

#[test]
fn test_extension_support_bound_through_prefix() {
    let ext = module("ext");
    let user = module("user").with_substatement(import("ext")).with_substatement(RawStatement {
        keyword: Keyword::prefixed("ext", "marker"),
        argument: Some("hello".to_string()),
        substatements: Vec::new(),
        position: yang_ir::Position::default(),
    });

    let bundle = StatementSupportBundle::derive(toy_bundle(), "toy+ext")
        .add(common::MarkerSupport)
        .build()
        .unwrap();
    let reactor = StatementReactor::new(Arc::new(bundle), ReactorConfig::default());
    let model = reactor
        .new_build()
        .add_source(document(user))
        .add_source(document(ext))
        .build()
        .unwrap();

    let entry = model.find_module("user", None).unwrap();
    let marker = entry
        .effective
        .substatements
        .iter()
        .find(|s| s.keyword.is_prefixed())
        .unwrap();
    assert_eq!(marker.argument.as_text(), Some("HELLO"));
}

#[test]
fn test_extension_with_unknown_prefix() {
    let source = module("a").with_substatement(RawStatement {
        keyword: Keyword::prefixed("nope", "marker"),
        argument: None,
        substatements: Vec::new(),
        position: yang_ir::Position::default(),
    });
    let error = reactor().new_build().add_source(document(source)).build().unwrap_err();
    assert!(error.to_string().contains("unknown prefix 'nope'"));
}

#[test]
fn test_equal_statements_are_interned() {
    let source = module("a")
        .with_substatement(thing("h1").with_substatement(thing("same")))
        .with_substatement(thing("h2").with_substatement(thing("same")));
    let reactor = reactor();
    let model = reactor.new_build().add_source(document(source)).build().unwrap();

    let root = &model.modules()[0].effective;
    let first = named(named(root, "thing", "h1").unwrap(), "thing", "same").unwrap();
    let second = named(named(root, "thing", "h2").unwrap(), "thing", "same").unwrap();
    assert!(Arc::ptr_eq(first, second));
    assert!(reactor.interner().hits() >= 1);
}

#[test]
fn test_declared_model_keeps_sources() {
    let source = module("a").with_substatement(thing("x"));
    let declared = reactor()
        .new_build()
        .add_source(document(source))
        .build_declared()
        .unwrap();
    let root = declared.find_source("a").unwrap();
    assert_eq!(root.substatements.len(), 3);
    assert_eq!(root.find_first("thing").unwrap().raw_argument.as_deref(), Some("x"));
}
