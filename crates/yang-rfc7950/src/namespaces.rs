//! Namespaces of YANG definitions
//!
//! Groupings and typedefs are lexically scoped; identities, features and
//! extensions are global. Schema nodes are registered per schema parent
//! and found by absolute path through [`SCHEMA_TREE`].

use yang_model::QNameModule;
use yang_reactor::{BuildContext, CtxId, NAMESPACE_TO_MODULE, Namespace, NsKey, NsValue};

pub static GROUPING: Namespace = Namespace::tree_scoped("grouping");
pub static TYPEDEF: Namespace = Namespace::tree_scoped("typedef");
pub static IDENTITY: Namespace = Namespace::global("identity");
pub static FEATURE: Namespace = Namespace::global("feature");
pub static EXTENSION: Namespace = Namespace::global("extension");

/// Schema node name → schema node, one table per schema parent
pub static CHILD_SCHEMA_NODE: Namespace = Namespace::statement_local("child-schema-node");

/// Absolute schema path → schema node
pub static SCHEMA_TREE: Namespace =
    Namespace::derived("schema-tree", &CHILD_SCHEMA_NODE, find_schema_node);

/// Statements that hold schema children
const SCHEMA_PARENTS: &[&str] = &[
    "module",
    "submodule",
    "container",
    "list",
    "choice",
    "case",
    "rpc",
    "action",
    "input",
    "output",
    "notification",
];

/// Key of a module in [`NAMESPACE_TO_MODULE`]
#[must_use]
pub fn module_key(module: &QNameModule) -> NsKey {
    NsKey::name(module.to_string())
}

fn find_schema_node(build: &BuildContext, anchor: CtxId, key: &NsKey) -> Option<NsValue> {
    let NsKey::Path(path) = key else {
        return None;
    };
    if !path.absolute {
        return None;
    }
    let first = path.steps.first()?;
    let mut current = build
        .get(anchor, &NAMESPACE_TO_MODULE, &module_key(&first.module))?
        .as_ctx()?;
    for step in &path.steps {
        current = build
            .get(current, &CHILD_SCHEMA_NODE, &NsKey::QName(step.clone()))?
            .as_ctx()?;
    }
    Some(NsValue::Ctx(current))
}

/// Context that holds the schema children table `ctx` belongs in.
///
/// `None` for statements outside the schema tree: anything inside a
/// `grouping`, and the original children of an `augment`. Top-level nodes
/// of a submodule go to the owning module.
#[must_use]
pub fn schema_anchor(build: &BuildContext, ctx: CtxId) -> Option<CtxId> {
    let parent = build.parent(ctx)?;
    let outside = build
        .ancestors(ctx)
        .into_iter()
        .any(|a| build.keyword(a).is("grouping") || build.keyword(a).is("augment"));
    if outside || !SCHEMA_PARENTS.iter().any(|k| build.keyword(parent).is(k)) {
        return None;
    }
    if build.keyword(parent).is("submodule") {
        return build.source_owner(parent);
    }
    Some(parent)
}

/// Module name of a module known to the build by its [`QNameModule`]
#[must_use]
pub fn module_name(build: &BuildContext, anchor: CtxId, module: &QNameModule) -> Option<String> {
    let root = build.get(anchor, &NAMESPACE_TO_MODULE, &module_key(module))?.as_ctx()?;
    build.raw_argument(root).map(str::to_string)
}
