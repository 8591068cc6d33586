#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # yang-rfc7950
//!
//! Statement supports for YANG 1.1 as defined in RFC 7950.
//!
//! [`rfc7950_bundle`] assembles a [`StatementSupportBundle`] covering the
//! linkage statements, definitions (`typedef`, `grouping`, `identity`,
//! `feature`, `extension`), the schema tree, `uses` with `refine`,
//! `augment`, type resolution and `if-feature` evaluation.
//!
//! ```no_run
//! use yang_reactor::ReactorConfig;
//!
//! # fn demo(text: &str) -> anyhow::Result<()> {
//! let reactor = yang_rfc7950::reactor(ReactorConfig::default())?;
//! let source = yang_parser::parse_str("example.yang", text)?;
//! let model = reactor.new_build().add_source(source).build()?;
//! for module in model.modules() {
//!     println!("{} ({} statements)", module.name, module.effective.statement_count());
//! }
//! # Ok(())
//! # }
//! ```

/// Argument parsing helpers.
pub mod args;
/// Top-level augments.
pub mod augment;
/// Extension definitions and instances.
pub mod extension;
/// Features and if-feature.
pub mod feature;
/// Groupings, uses and refine.
pub mod grouping;
/// Identities and bases.
pub mod identity;
/// Leafref target resolution.
pub mod leafref;
/// Module, submodule and linkage statements.
pub mod linkage;
/// Namespaces of YANG definitions.
pub mod namespaces;
/// Schema node statements.
pub mod schema;
/// Argument-only statements.
pub mod simple;
/// Typedefs and types.
pub mod types;

pub use namespaces::{CHILD_SCHEMA_NODE, EXTENSION, FEATURE, GROUPING, IDENTITY, SCHEMA_TREE, TYPEDEF};

use std::sync::Arc;
use yang_reactor::{ReactorConfig, Result, StatementReactor, StatementSupportBundle};

/// Name of the bundle built by [`rfc7950_bundle`]
pub const BUNDLE_NAME: &str = "rfc7950";

/// Bundle with a support for every YANG 1.1 statement.
///
/// # Errors
///
/// Returns [`yang_reactor::ReactorError::Config`] if two supports claim one
/// keyword.
pub fn rfc7950_bundle() -> Result<StatementSupportBundle> {
    let mut builder = StatementSupportBundle::builder(BUNDLE_NAME)
        .add(linkage::ModuleSupport::new())
        .add(linkage::SubmoduleSupport::new())
        .add(linkage::ImportSupport::new())
        .add(linkage::IncludeSupport::new())
        .add(linkage::BelongsToSupport::new())
        .add(types::TypedefSupport::new())
        .add(types::TypeSupport::new())
        .add(grouping::GroupingSupport::new())
        .add(grouping::UsesSupport::new())
        .add(grouping::RefineSupport::new())
        .add(augment::AugmentSupport::new())
        .add(identity::IdentitySupport::new())
        .add(identity::BaseSupport)
        .add(feature::FeatureSupport::new())
        .add(feature::IfFeatureSupport)
        .add(extension::ExtensionSupport::new())
        .extension_fallback(extension::ExtensionInstanceSupport);
    for support in simple::simple_supports() {
        builder = builder.add(support);
    }
    for support in schema::schema_node_supports() {
        builder = builder.add(support);
    }
    builder.build()
}

/// Reactor using the RFC 7950 bundle
///
/// # Errors
///
/// Propagates bundle construction errors.
pub fn reactor(config: ReactorConfig) -> Result<StatementReactor> {
    Ok(StatementReactor::new(Arc::new(rfc7950_bundle()?), config))
}
