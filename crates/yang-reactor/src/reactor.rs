//! The statement reactor
//!
//! [`StatementReactor`] holds what builds share: the support bundle, the
//! configuration and the effective-statement interner. Each
//! [`BuildAction`] owns one build tree and drives it through the phases
//! in global lockstep.
//!
//! Within a phase the reactor repeats scan passes until every context has
//! completed the phase or a pass makes no progress. A pass
//!
//! 1. starts the phase on every context that has not started it, running
//!    the callbacks of any earlier phases a newly created context missed,
//! 2. applies ready inference actions in registration order,
//! 3. completes contexts bottom-up: a context completes once it started
//!    the phase, all its children completed it and it owns no pending
//!    action due in this phase or earlier.

use crate::arena::{CtxId, Idx};
use crate::cancel::CancellationToken;
use crate::config::{FailureMode, ReactorConfig, UnknownStatementPolicy};
use crate::context::BuildContext;
use crate::error::{ReactorError, Result};
use crate::phase::ModelProcessingPhase;
use crate::report::{BuildReport, BuildStats};
use crate::support::StatementSupportBundle;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};
use yang_ir::{SourceDocument, SourceProvider};
use yang_model::{DeclaredModel, EffectiveModel, StatementInterner};

/// Entry point for builds sharing one bundle and configuration
#[derive(Debug, Clone)]
pub struct StatementReactor {
    bundle: Arc<StatementSupportBundle>,
    config: Arc<ReactorConfig>,
    interner: Arc<StatementInterner>,
}

impl StatementReactor {
    #[must_use]
    pub fn new(bundle: Arc<StatementSupportBundle>, config: ReactorConfig) -> Self {
        Self {
            bundle,
            config: Arc::new(config),
            interner: Arc::new(StatementInterner::new()),
        }
    }

    /// Share an interner with other reactors
    #[must_use]
    pub fn with_interner(mut self, interner: Arc<StatementInterner>) -> Self {
        self.interner = interner;
        self
    }

    #[must_use]
    pub fn bundle(&self) -> &Arc<StatementSupportBundle> {
        &self.bundle
    }

    #[must_use]
    pub fn config(&self) -> &ReactorConfig {
        &self.config
    }

    #[must_use]
    pub fn interner(&self) -> &Arc<StatementInterner> {
        &self.interner
    }

    /// Start collecting sources for a new build
    #[must_use]
    pub fn new_build(&self) -> BuildAction {
        BuildAction {
            bundle: Arc::clone(&self.bundle),
            config: Arc::clone(&self.config),
            interner: Arc::clone(&self.interner),
            sources: Vec::new(),
            library: Vec::new(),
            provider: None,
            cancellation: None,
        }
    }
}

/// Sources and options of one build
#[must_use]
pub struct BuildAction {
    bundle: Arc<StatementSupportBundle>,
    config: Arc<ReactorConfig>,
    interner: Arc<StatementInterner>,
    sources: Vec<SourceDocument>,
    library: Vec<SourceDocument>,
    provider: Option<Arc<dyn SourceProvider>>,
    cancellation: Option<CancellationToken>,
}

impl BuildAction {
    /// Add a source that is always compiled
    pub fn add_source(mut self, source: SourceDocument) -> Self {
        self.sources.push(source);
        self
    }

    pub fn add_sources(mut self, sources: impl IntoIterator<Item = SourceDocument>) -> Self {
        self.sources.extend(sources);
        self
    }

    /// Add a source compiled only when another source requires it
    pub fn add_library_source(mut self, source: SourceDocument) -> Self {
        self.library.push(source);
        self
    }

    /// Fetch required sources missing from the build and the library
    pub fn with_source_provider(mut self, provider: Arc<dyn SourceProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Build the effective model.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error, or a [`ReactorError::PhaseFailed`]
    /// with every statement error of the failing phase in fail-slow mode.
    pub fn build(self) -> Result<EffectiveModel> {
        self.build_with_report().into_result()
    }

    /// Build and report statistics and warnings alongside the outcome
    pub fn build_with_report(self) -> BuildReport {
        let interner = Arc::clone(&self.interner);
        let (mut build, cancellation) = self.prepare();
        let outcome = build
            .execute(ModelProcessingPhase::EffectiveModel, cancellation.as_ref())
            .and_then(|()| build.assemble_effective_model(&interner));
        let stats = build.finish_stats();

        match outcome {
            Ok(model) => {
                info!(
                    modules = model.modules().len(),
                    sources = stats.sources,
                    pulled = stats.pulled_sources,
                    contexts = stats.contexts,
                    effective_statements = stats.effective_statements,
                    "build finished"
                );
                BuildReport {
                    model: Some(model),
                    error: None,
                    warnings: build.warnings,
                    stats,
                }
            }
            Err(error) => {
                info!(%error, "build failed");
                BuildReport {
                    model: None,
                    error: Some(error),
                    warnings: build.warnings,
                    stats,
                }
            }
        }
    }

    /// Run through full declaration and return the declared statements
    ///
    /// # Errors
    ///
    /// As [`BuildAction::build`], for the phases up to full declaration.
    pub fn build_declared(self) -> Result<DeclaredModel> {
        let (mut build, cancellation) = self.prepare();
        build.execute(ModelProcessingPhase::FullDeclaration, cancellation.as_ref())?;
        build.assemble_declared_model()
    }

    fn prepare(self) -> (BuildContext, Option<CancellationToken>) {
        let mut build = BuildContext::new(self.bundle, self.config);
        build.library = self.library;
        build.provider = self.provider;
        build.pending_sources = self.sources;
        (build, self.cancellation)
    }
}

impl BuildContext {
    /// Drive every phase up to and including `last`
    pub(crate) fn execute(
        &mut self,
        last: ModelProcessingPhase,
        cancellation: Option<&CancellationToken>,
    ) -> Result<()> {
        let started = Instant::now();
        for document in std::mem::take(&mut self.pending_sources) {
            self.add_source_tree(&document, false)?;
        }

        for phase in ModelProcessingPhase::ALL.into_iter().filter(|p| *p <= last) {
            self.check_interrupt(phase, cancellation, started)?;
            if phase == ModelProcessingPhase::SourceLinkage {
                self.compute_linkage_order()?;
            }
            self.run_phase(phase)?;
        }
        Ok(())
    }

    fn check_interrupt(
        &self,
        phase: ModelProcessingPhase,
        cancellation: Option<&CancellationToken>,
        started: Instant,
    ) -> Result<()> {
        if cancellation.is_some_and(CancellationToken::is_cancelled) {
            return Err(ReactorError::Cancelled { phase });
        }
        if let Some(timeout) = self.config.build_timeout() {
            let elapsed = started.elapsed();
            if elapsed >= timeout {
                return Err(ReactorError::TimedOut {
                    phase,
                    elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                });
            }
        }
        Ok(())
    }

    fn run_phase(&mut self, phase: ModelProcessingPhase) -> Result<()> {
        debug!(%phase, contexts = self.contexts.len(), "phase started");
        self.phase = Some(phase);

        loop {
            self.stats.scan_passes += 1;
            let mut progress = self.start_phase_hooks(phase)?;
            progress |= self.apply_ready_actions()?;
            progress |= self.complete_contexts(phase);

            if self.contexts.iter().all(|c| c.reached(phase)) {
                if phase == ModelProcessingPhase::SourcePreLinkage && self.pull_required_sources()? {
                    continue;
                }
                break;
            }
            if !progress {
                for stall in self.diagnose_stall(phase) {
                    if self.config.failure_mode == FailureMode::FailFast {
                        return Err(stall);
                    }
                    error!(%stall, "phase stalled");
                    self.errors.push(stall);
                }
                break;
            }
        }

        match self.errors.len() {
            0 => {
                debug!(%phase, passes = self.stats.scan_passes, "phase finished");
                self.stats.completed_phases.push(phase);
                Ok(())
            }
            1 => Err(self.errors.remove(0)),
            _ => Err(ReactorError::PhaseFailed {
                phase,
                errors: std::mem::take(&mut self.errors),
            }),
        }
    }

    /// Run callbacks for every context that has not started `phase`.
    ///
    /// Contexts created during the loop (copies, pulled sources) are picked
    /// up in the same call.
    #[allow(clippy::cast_possible_truncation)]
    fn start_phase_hooks(&mut self, phase: ModelProcessingPhase) -> Result<bool> {
        let mut progress = false;
        let mut index = 0;
        while index < self.contexts.len() {
            let ctx = CtxId::new(index as u32);
            index += 1;

            let entry = &self.contexts[ctx];
            if entry.inactive() || entry.started.is_some_and(|s| s >= phase) {
                continue;
            }
            let missed: Vec<ModelProcessingPhase> = match entry.started {
                Some(started) => started.range_to(phase).collect(),
                None => ModelProcessingPhase::ALL
                    .into_iter()
                    .filter(|p| *p <= phase)
                    .collect(),
            };
            progress = true;
            for hook_phase in missed {
                self.contexts[ctx].started = Some(hook_phase);
                if let Err(error) = self.run_hook(ctx, hook_phase) {
                    self.report(ctx, error)?;
                }
                if self.contexts[ctx].inactive() {
                    break;
                }
            }
        }
        Ok(progress)
    }

    fn run_hook(&mut self, ctx: CtxId, phase: ModelProcessingPhase) -> Result<()> {
        if self.phase.is_none_or(|current| phase > current) {
            return Err(ReactorError::invariant(format!(
                "{} started {phase} ahead of the build",
                self.describe(ctx)
            )));
        }
        self.hook_phase = phase;

        if phase == ModelProcessingPhase::StatementDefinition && !self.contexts[ctx].support_resolved {
            self.resolve_extension_support(ctx)?;
        }
        let support = Arc::clone(&self.contexts[ctx].support);
        if !self.contexts[ctx].argument_parsed && phase >= support.argument_phase() {
            let argument = support.parse_argument(self, ctx)?;
            let entry = &mut self.contexts[ctx];
            entry.argument = argument;
            entry.argument_parsed = true;
        }

        let result = match phase {
            ModelProcessingPhase::Init => {
                if self.contexts[ctx].unknown_keyword
                    && self.config.unknown_statements == UnknownStatementPolicy::Reject
                {
                    return Err(self.statement_error(
                        ctx,
                        format!("unknown statement '{}'", self.contexts[ctx].keyword),
                    ));
                }
                support.on_statement_added(self, ctx)
            }
            ModelProcessingPhase::SourcePreLinkage => support.on_pre_linkage_declared(self, ctx),
            ModelProcessingPhase::SourceLinkage => support.on_linkage_declared(self, ctx),
            ModelProcessingPhase::StatementDefinition => {
                // copies were validated at their prototype
                if let Some(validator) = support.validator() {
                    if self.is_declared(ctx) {
                        validator.validate(self, ctx)?;
                    }
                }
                support.on_statement_definition_declared(self, ctx)
            }
            ModelProcessingPhase::FullDeclaration => support.on_full_definition_declared(self, ctx),
            ModelProcessingPhase::EffectiveModel => support.on_effective_model(self, ctx),
        };
        self.hook_phase = self.phase.unwrap_or(phase);
        result
    }

    /// Complete contexts bottom-up. Children mostly have larger handles
    /// than their parents; a context re-parented under an implicit wrapper
    /// lets the wrapper complete on the next pass.
    fn complete_contexts(&mut self, phase: ModelProcessingPhase) -> bool {
        let mut progress = false;
        for ctx in self.contexts.indices().rev() {
            let entry = &self.contexts[ctx];
            if entry.reached(phase) || entry.started != Some(phase) {
                continue;
            }
            if !entry.children.iter().all(|c| self.contexts[*c].reached(phase)) {
                continue;
            }
            if entry.pending.iter().any(|a| self.actions[*a].phase <= phase) {
                continue;
            }
            if phase == ModelProcessingPhase::EffectiveModel
                && self.pending_schema_mutations > 0
                && entry.support.is_augment_target()
            {
                continue;
            }
            self.contexts[ctx].completed = Some(phase);
            self.wake_phase(ctx);
            progress = true;
        }
        progress
    }

    /// Handle a statement error raised at `ctx`.
    ///
    /// Fail-fast mode and non-statement errors abort; fail-slow mode
    /// records the error and retires the subtree.
    pub(crate) fn report(&mut self, ctx: CtxId, error: ReactorError) -> Result<()> {
        if !error.is_statement_error() || self.config.failure_mode == FailureMode::FailFast {
            return Err(error);
        }
        error!(%error, statement = %self.describe(ctx), "statement failed");
        self.errors.push(error);
        self.fail_subtree(ctx);
        Ok(())
    }

    fn finish_stats(&mut self) -> BuildStats {
        let mut stats = std::mem::take(&mut self.stats);
        stats.contexts = self.contexts.len();
        stats.pulled_sources = self.sources.iter().filter(|s| s.library).count();
        stats
    }
}
