#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # yang-reactor
//!
//! Multi-phase statement resolution.
//!
//! A build wraps every statement of every source in a context and drives
//! all contexts through the phases of [`ModelProcessingPhase`] in global
//! lockstep. Statement semantics live in [`StatementSupport`]
//! implementations grouped into a [`StatementSupportBundle`]; the reactor
//! itself knows nothing about individual keywords beyond `module` and
//! `submodule`. Supports publish definitions into namespaces and register
//! inference actions that run once what they need is available.
//!
//! ```no_run
//! use std::sync::Arc;
//! use yang_reactor::{ReactorConfig, StatementReactor, StatementSupportBundle};
//!
//! # fn demo(bundle: StatementSupportBundle, source: yang_ir::SourceDocument) -> yang_reactor::Result<()> {
//! let reactor = StatementReactor::new(Arc::new(bundle), ReactorConfig::default());
//! let model = reactor.new_build().add_source(source).build()?;
//! println!("{} modules", model.modules().len());
//! # Ok(())
//! # }
//! ```

/// Deferred inference work.
pub mod action;
/// Handle-indexed storage.
pub mod arena;
/// Declared and effective model assembly.
pub mod assembly;
/// Build cancellation.
pub mod cancel;
/// Build configuration.
pub mod config;
/// Statement contexts and the build tree.
pub mod context;
/// Error types.
pub mod error;
/// Source linkage: modules, imports and linkage order.
pub mod linkage;
/// Namespaces and their storage.
pub mod namespace;
/// Processing phases.
pub mod phase;
/// Phase loop and build entry points.
pub mod reactor;
/// Build statistics and reports.
pub mod report;
/// Statement supports and bundles.
pub mod support;
/// Substatement cardinality checks.
pub mod validator;

pub use action::{ActionBuilder, ApplyFn, Prerequisite};
pub use arena::{ActionId, CtxId, SourceId};
pub use cancel::CancellationToken;
pub use config::{FailureMode, ImportResolutionMode, ReactorConfig, UnknownStatementPolicy};
pub use context::BuildContext;
pub use error::{ReactorError, Result};
pub use linkage::{IMPORT_PREFIX, MODULE, NAMESPACE_TO_MODULE, RequirementKind, SUBMODULE, link_order};
pub use namespace::{Namespace, NamespaceBehaviour, NsKey, NsValue};
pub use phase::ModelProcessingPhase;
pub use reactor::{BuildAction, StatementReactor};
pub use report::{BuildReport, BuildStats};
pub use support::{BundleBuilder, CopyPolicy, StatementSupport, StatementSupportBundle};
pub use validator::{Cardinality, SubstatementValidator};
