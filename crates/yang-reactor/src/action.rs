//! Inference actions
//!
//! An action is deferred work owned by one context: "once these
//! prerequisites hold, run this closure". Prerequisites name either a phase
//! another context must reach, or a namespace entry that must exist
//! (optionally with its context having reached a phase). A blocked action
//! sits on a wake list for the namespace or context it waits on and is
//! retried only when that namespace gains an entry or that context
//! completes a phase.
//!
//! The owner cannot complete the action's phase while the action is
//! pending. An action still pending when its phase stalls becomes an
//! unresolved-reference or dependency-cycle error.

use crate::arena::{ActionId, CtxId};
use crate::context::BuildContext;
use crate::error::{ReactorError, Result};
use crate::namespace::{Namespace, NsKey, NsValue};
use crate::phase::ModelProcessingPhase;
use std::collections::{BTreeSet, HashMap};
use tracing::trace;

/// Closure run when all prerequisites of an action hold.
///
/// Receives one value per prerequisite, in registration order: the found
/// namespace value, or the context itself for phase prerequisites.
pub type ApplyFn = Box<dyn FnOnce(&mut BuildContext, Vec<NsValue>) -> Result<()>>;

/// One condition an action waits for
#[derive(Debug, Clone)]
pub enum Prerequisite {
    /// `ctx` has completed `phase`
    Phase {
        ctx: CtxId,
        phase: ModelProcessingPhase,
    },
    /// `namespace` holds `key` as seen from `anchor`; with `phase`, the
    /// found context has also completed that phase
    Namespace {
        anchor: CtxId,
        namespace: &'static Namespace,
        key: NsKey,
        phase: Option<ModelProcessingPhase>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ActionState {
    Pending,
    Applied,
    Dropped,
}

pub(crate) struct InferenceAction {
    pub(crate) owner: CtxId,
    pub(crate) phase: ModelProcessingPhase,
    pub(crate) description: String,
    /// Prerequisites with a description of their target for diagnostics
    pub(crate) prerequisites: Vec<(Prerequisite, String)>,
    pub(crate) mutates_schema: bool,
    pub(crate) apply: Option<ApplyFn>,
    pub(crate) state: ActionState,
}

/// Why an action cannot run yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Blocker {
    /// Namespace entry absent; index of the prerequisite
    Missing(usize, &'static str),
    /// Waiting for `ctx` to complete a phase
    Phase(CtxId),
}

enum Resolution {
    Ready(Vec<NsValue>),
    Blocked(Blocker),
}

/// Collects the prerequisites of a new action
#[must_use]
pub struct ActionBuilder<'a> {
    build: &'a mut BuildContext,
    owner: CtxId,
    description: String,
    prerequisites: Vec<(Prerequisite, String)>,
    mutates_schema: bool,
}

impl ActionBuilder<'_> {
    /// Wait for `key` in `namespace` whose context has completed `phase`
    pub fn requires_ctx(
        mut self,
        anchor: CtxId,
        namespace: &'static Namespace,
        key: NsKey,
        phase: ModelProcessingPhase,
    ) -> Self {
        let target = format!("{} {}", namespace.name, key);
        self.prerequisites.push((
            Prerequisite::Namespace {
                anchor,
                namespace,
                key,
                phase: Some(phase),
            },
            target,
        ));
        self
    }

    /// Wait for `key` in `namespace` to hold any value
    pub fn requires_value(mut self, anchor: CtxId, namespace: &'static Namespace, key: NsKey) -> Self {
        let target = format!("{} {}", namespace.name, key);
        self.prerequisites.push((
            Prerequisite::Namespace {
                anchor,
                namespace,
                key,
                phase: None,
            },
            target,
        ));
        self
    }

    /// Wait for `ctx` to complete `phase`
    pub fn requires_phase(mut self, ctx: CtxId, phase: ModelProcessingPhase) -> Self {
        let target = format!("{} in phase {}", self.build.describe(ctx), phase);
        self.prerequisites.push((Prerequisite::Phase { ctx, phase }, target));
        self
    }

    /// Replace the diagnostic description of the last prerequisite
    pub fn target(mut self, target: impl Into<String>) -> Self {
        if let Some(last) = self.prerequisites.last_mut() {
            last.1 = target.into();
        }
        self
    }

    /// The action adds nodes to the schema tree. Augment targets do not
    /// complete the effective-model phase while such actions are pending.
    pub fn mutates_schema_tree(mut self) -> Self {
        self.mutates_schema = true;
        self
    }

    /// Register the action with its closure
    pub fn apply<F>(self, apply: F) -> ActionId
    where
        F: FnOnce(&mut BuildContext, Vec<NsValue>) -> Result<()> + 'static,
    {
        let phase = self.build.hook_phase;
        let action = InferenceAction {
            owner: self.owner,
            phase,
            description: self.description,
            prerequisites: self.prerequisites,
            mutates_schema: self.mutates_schema,
            apply: Some(Box::new(apply)),
            state: ActionState::Pending,
        };
        self.build.register_action(action)
    }
}

impl BuildContext {
    /// Start a new action owned by `owner`
    pub fn new_action(&mut self, owner: CtxId, description: impl Into<String>) -> ActionBuilder<'_> {
        ActionBuilder {
            build: self,
            owner,
            description: description.into(),
            prerequisites: Vec::new(),
            mutates_schema: false,
        }
    }

    fn register_action(&mut self, action: InferenceAction) -> ActionId {
        let owner = action.owner;
        let mutates = action.mutates_schema;
        trace!(owner = %self.describe(owner), action = %action.description, phase = %action.phase, "action registered");
        let id = self.actions.push(action);
        self.contexts[owner].pending.push(id);
        if mutates {
            self.pending_schema_mutations += 1;
        }
        self.stats.actions_registered += 1;
        self.ready.insert(id);
        id
    }

    pub(crate) fn wake_namespace(&mut self, namespace: &'static str) {
        if let Some(waiting) = self.namespace_watchers.remove(namespace) {
            self.ready.extend(waiting);
        }
    }

    pub(crate) fn wake_phase(&mut self, ctx: CtxId) {
        if let Some(waiting) = self.phase_watchers.remove(&ctx) {
            self.ready.extend(waiting);
        }
    }

    /// Retire the pending actions owned by `ctx`
    pub(crate) fn drop_actions(&mut self, ctx: CtxId) {
        for id in std::mem::take(&mut self.contexts[ctx].pending) {
            let action = &mut self.actions[id];
            if action.state == ActionState::Pending {
                action.state = ActionState::Dropped;
                action.apply = None;
                if action.mutates_schema {
                    self.pending_schema_mutations -= 1;
                }
            }
        }
    }

    fn resolve(&self, id: ActionId) -> Resolution {
        let action = &self.actions[id];
        let mut values = Vec::with_capacity(action.prerequisites.len());
        for (index, (prerequisite, _)) in action.prerequisites.iter().enumerate() {
            match prerequisite {
                Prerequisite::Phase { ctx, phase } => {
                    if !self.contexts[*ctx].reached(*phase) {
                        return Resolution::Blocked(Blocker::Phase(*ctx));
                    }
                    values.push(NsValue::Ctx(*ctx));
                }
                Prerequisite::Namespace {
                    anchor,
                    namespace,
                    key,
                    phase,
                } => {
                    let Some(value) = self.get(*anchor, namespace, key) else {
                        return Resolution::Blocked(Blocker::Missing(index, namespace.watch_name()));
                    };
                    if let (Some(phase), Some(found)) = (phase, value.as_ctx()) {
                        if !self.contexts[found].reached(*phase) {
                            return Resolution::Blocked(Blocker::Phase(found));
                        }
                    }
                    values.push(value);
                }
            }
        }
        Resolution::Ready(values)
    }

    /// Run every ready action whose prerequisites hold.
    ///
    /// Returns whether any action was applied.
    pub(crate) fn apply_ready_actions(&mut self) -> Result<bool> {
        let mut progress = false;
        while let Some(id) = self.ready.pop_first() {
            if self.actions[id].state != ActionState::Pending {
                continue;
            }
            match self.resolve(id) {
                Resolution::Ready(values) => {
                    let action = &mut self.actions[id];
                    action.state = ActionState::Applied;
                    let owner = action.owner;
                    let mutates = action.mutates_schema;
                    let apply = action.apply.take();
                    trace!(owner = %self.describe(owner), action = %self.actions[id].description, "action applied");

                    self.contexts[owner].pending.retain(|a| *a != id);
                    if mutates {
                        self.pending_schema_mutations -= 1;
                    }
                    self.stats.actions_applied += 1;
                    progress = true;

                    let Some(apply) = apply else {
                        return Err(ReactorError::invariant(format!("{id} applied twice")));
                    };
                    if let Err(error) = apply(self, values) {
                        self.report(owner, error)?;
                    }
                }
                Resolution::Blocked(Blocker::Missing(_, namespace)) => {
                    self.namespace_watchers.entry(namespace).or_default().push(id);
                }
                Resolution::Blocked(Blocker::Phase(ctx)) => {
                    self.phase_watchers.entry(ctx).or_default().push(id);
                }
            }
        }
        Ok(progress)
    }

    /// Explain a phase that stopped making progress.
    ///
    /// Blocked actions that wait, through the contexts they need, on each
    /// other are reported as dependency cycles. Otherwise every action
    /// waiting on an absent namespace entry is an unresolved reference.
    pub(crate) fn diagnose_stall(&self, phase: ModelProcessingPhase) -> Vec<ReactorError> {
        let blocked: Vec<(ActionId, Blocker)> = self
            .actions
            .iter_enumerated()
            .filter(|(_, a)| a.state == ActionState::Pending && !self.contexts[a.owner].inactive())
            .filter_map(|(id, _)| match self.resolve(id) {
                Resolution::Blocked(blocker) => Some((id, blocker)),
                Resolution::Ready(_) => None,
            })
            .collect();

        let cycles = self.find_wait_cycles(&blocked);
        if !cycles.is_empty() {
            return cycles
                .into_iter()
                .map(|members| ReactorError::DependencyCycle { members })
                .collect();
        }

        let unresolved: Vec<ReactorError> = blocked
            .iter()
            .filter_map(|(id, blocker)| match blocker {
                Blocker::Missing(index, _) => {
                    let action = &self.actions[*id];
                    Some(ReactorError::UnresolvedReference {
                        referrer: self.describe(action.owner),
                        target: action.prerequisites[*index].1.clone(),
                        source_info: self.source_info(action.owner),
                        phase: action.phase,
                    })
                }
                Blocker::Phase(_) => None,
            })
            .collect();
        if !unresolved.is_empty() {
            return unresolved;
        }

        let incomplete = self
            .contexts
            .iter()
            .filter(|c| !c.reached(phase))
            .count();
        vec![ReactorError::invariant(format!(
            "phase {phase} stalled with {incomplete} incomplete contexts and {} blocked actions",
            blocked.len()
        ))]
    }

    /// Cycles in the wait graph, each as the sorted descriptions of the
    /// contexts waited on
    fn find_wait_cycles(&self, blocked: &[(ActionId, Blocker)]) -> Vec<Vec<String>> {
        let waits: HashMap<ActionId, CtxId> = blocked
            .iter()
            .filter_map(|(id, b)| match b {
                Blocker::Phase(ctx) => Some((*id, *ctx)),
                Blocker::Missing(..) => None,
            })
            .collect();

        let pending: Vec<ActionId> = blocked.iter().map(|(id, _)| *id).collect();
        let edges = |id: ActionId| -> Vec<ActionId> {
            let Some(ctx) = waits.get(&id) else {
                return Vec::new();
            };
            pending
                .iter()
                .copied()
                .filter(|other| self.is_within(self.actions[*other].owner, *ctx))
                .collect()
        };

        let mut cycles: Vec<Vec<String>> = Vec::new();
        let mut done: BTreeSet<ActionId> = BTreeSet::new();
        for &(start, _) in blocked {
            if done.contains(&start) {
                continue;
            }
            // Iterative DFS keeping the current path
            let mut path: Vec<ActionId> = Vec::new();
            let mut stack: Vec<(ActionId, Vec<ActionId>)> = vec![(start, edges(start))];
            path.push(start);
            while let Some((_, next)) = stack.last_mut() {
                let Some(target) = next.pop() else {
                    let (finished, _) = stack.pop().unwrap_or((start, Vec::new()));
                    done.insert(finished);
                    path.pop();
                    continue;
                };
                if let Some(pos) = path.iter().position(|a| *a == target) {
                    let mut members: Vec<String> = path[pos..]
                        .iter()
                        .filter_map(|a| waits.get(a))
                        .map(|ctx| self.describe(*ctx))
                        .collect();
                    members.sort();
                    members.dedup();
                    if !cycles.contains(&members) {
                        cycles.push(members);
                    }
                } else if !done.contains(&target) {
                    path.push(target);
                    stack.push((target, edges(target)));
                }
            }
        }
        cycles
    }
}
