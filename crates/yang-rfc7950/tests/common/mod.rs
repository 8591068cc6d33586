//! Helpers shared by the RFC 7950 integration tests

#![allow(dead_code)]

use std::sync::Arc;
use yang_ir::SourceDocument;
use yang_model::{EffectiveModel, EffectiveStatement, QName};
use yang_reactor::{BuildReport, ReactorConfig, ReactorError};

/// Routes `tracing` output through the test harness; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn source(name: &str, text: &str) -> SourceDocument {
    yang_parser::parse_str(&format!("{name}.yang"), text).unwrap()
}

pub fn build_report(config: ReactorConfig, sources: Vec<SourceDocument>) -> BuildReport {
    let reactor = yang_rfc7950::reactor(config).unwrap();
    reactor.new_build().add_sources(sources).build_with_report()
}

pub fn build(sources: Vec<SourceDocument>) -> EffectiveModel {
    let report = build_report(ReactorConfig::default(), sources);
    assert!(report.is_success(), "build failed: {:?}", report.error);
    report.model.unwrap()
}

pub fn build_err(sources: Vec<SourceDocument>) -> Vec<ReactorError> {
    let report = build_report(ReactorConfig::default(), sources);
    assert!(!report.is_success(), "build unexpectedly succeeded");
    report.errors().into_iter().cloned().collect()
}

pub fn node<'a>(model: &'a EffectiveModel, path: &str) -> &'a Arc<EffectiveStatement> {
    model
        .find_path(path)
        .unwrap_or_else(|e| panic!("{path}: {e}"))
}

pub fn qname(model: &EffectiveModel, module: &str, local: &str) -> QName {
    model.find_module(module, None).unwrap().module.qname(local)
}

/// Local names of the schema children of `stmt`, in order
pub fn child_names(stmt: &EffectiveStatement) -> Vec<String> {
    stmt.schema_children()
        .filter_map(|s| s.qname().map(|q| q.local_name().to_string()))
        .collect()
}
