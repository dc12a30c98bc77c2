//! Multi-slot generation driver: ordered slots, per-kind retry policy,
//! the substantive-change gate, soft fallback for hard slots, and the
//! reference-stripping boundary.
//!
//! Slots run in order so progress events stay predictable and failures
//! reproducible. A slot that exhausts its retries fails the whole run and
//! prior drafts are discarded; a partial activity would mislead the user.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::GenerationConfig;
use crate::error::{AttemptError, FailureKind, KatagenError, Result, SlotFailure};
use crate::executor::ReferenceExecutor;
use crate::external::{JudgeAdapter, LlmClient};
use crate::obligations::ids as obligation_ids;
use crate::planner::plan_slots;
use crate::progress::{ProgressEvent, ProgressStream};
use crate::slotgen::{AttemptFailure, PerSlotGenerator, RepairInput, SlotDraftBundle};
use crate::strength::TestStrengthGate;
use crate::types::{
    ActivitySpec, Difficulty, ExternalProblemDraft, GeneratedProblemDraft, ProblemSlot,
    RewriteRecord, RunContext, SoftFallback,
};

/// Cooperative cancellation signal. Checked at every suspension point;
/// in-flight collaborator calls complete and their results are discarded.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// The caller-facing result of a run.
#[derive(Debug)]
pub struct GenerationOutput {
    pub problems: Vec<ExternalProblemDraft>,
    pub rewrites: Vec<RewriteRecord>,
    pub soft_fallbacks: Vec<SoftFallback>,
}

enum SlotRunError {
    Cancelled,
    Failed(SlotFailure),
}

/// Drives generation for a whole activity spec.
pub struct GenerationPipeline {
    llm: Arc<dyn LlmClient>,
    judge: Arc<dyn JudgeAdapter>,
    config: GenerationConfig,
    progress: Arc<ProgressStream>,
    cancel: CancelToken,
}

impl GenerationPipeline {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        judge: Arc<dyn JudgeAdapter>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            llm,
            judge,
            config,
            progress: Arc::new(ProgressStream::new()),
            cancel: CancelToken::new(),
        }
    }

    /// The run's progress stream; subscribe before or during the run.
    pub fn progress(&self) -> Arc<ProgressStream> {
        Arc::clone(&self.progress)
    }

    /// Handle for cancelling the run.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Generate every slot of the spec, in order. On success the returned
    /// drafts have all reference material stripped.
    pub async fn generate_from_spec(
        &self,
        spec: &ActivitySpec,
        ctx: &RunContext,
    ) -> Result<GenerationOutput> {
        let slots = plan_slots(spec)?;
        self.progress.emit(ProgressEvent::GenerationStarted {
            run_id: ctx.run_id.clone(),
            language: spec.language,
            problem_count: spec.problem_count,
        });

        let mut drafts: Vec<GeneratedProblemDraft> = Vec::with_capacity(slots.len());
        let mut rewrites: Vec<RewriteRecord> = Vec::new();
        let mut soft_fallbacks: Vec<SoftFallback> = Vec::new();

        for slot in &slots {
            if self.cancel.is_cancelled() {
                return Err(self.fail_cancelled());
            }
            match self
                .run_slot(spec, slot, ctx, &mut soft_fallbacks)
                .await
            {
                Ok((draft, slot_rewrites)) => {
                    drafts.push(draft);
                    rewrites.extend(slot_rewrites);
                }
                Err(SlotRunError::Cancelled) => {
                    return Err(self.fail_cancelled());
                }
                Err(SlotRunError::Failed(failure)) => {
                    self.progress.emit(ProgressEvent::GenerationFailed {
                        kind: failure.kind.to_string(),
                        slot_index: Some(failure.slot_index),
                        message: failure.short_error.clone(),
                    });
                    // Prior successful slots are discarded with the run.
                    return Err(KatagenError::SlotFailed(failure));
                }
            }
            self.progress.emit(ProgressEvent::Heartbeat);
        }

        self.progress.emit(ProgressEvent::GenerationCompleted {
            activity_id: ctx.activity_id.clone(),
            problem_count: drafts.len(),
        });
        info!(run = %ctx.run_id, problems = drafts.len(), "generation completed");

        Ok(GenerationOutput {
            problems: drafts.into_iter().map(ExternalProblemDraft::from).collect(),
            rewrites,
            soft_fallbacks,
        })
    }

    fn fail_cancelled(&self) -> KatagenError {
        self.progress.emit(ProgressEvent::GenerationFailed {
            kind: "cancelled".to_string(),
            slot_index: None,
            message: "generation cancelled by caller".to_string(),
        });
        KatagenError::Cancelled
    }

    async fn run_slot(
        &self,
        spec: &ActivitySpec,
        planned: &ProblemSlot,
        ctx: &RunContext,
        soft_fallbacks: &mut Vec<SoftFallback>,
    ) -> std::result::Result<(GeneratedProblemDraft, Vec<RewriteRecord>), SlotRunError> {
        let mut slot = planned.clone();
        let mut fallback_used = false;

        loop {
            match self.run_slot_attempts(&slot, ctx).await {
                Ok(success) => return Ok(success),
                Err(SlotRunError::Failed(failure))
                    if failure.kind == FailureKind::Quality
                        && slot.difficulty == Difficulty::Hard
                        && self.config.soft_fallback_enabled
                        && !spec.explicit_hard_requested
                        && !fallback_used =>
                {
                    // The user's intent did not literally demand hard, so
                    // this slot alone is re-planned at medium.
                    warn!(slot = slot.index, "hard slot failed on quality, falling back to medium");
                    fallback_used = true;
                    let fallback = SoftFallback {
                        slot_index: slot.index,
                        from: Difficulty::Hard,
                        to: Difficulty::Medium,
                    };
                    self.progress
                        .emit(ProgressEvent::GenerationSoftFallbackApplied(fallback.clone()));
                    soft_fallbacks.push(fallback);
                    slot.difficulty = Difficulty::Medium;
                    // The planner attaches a secondary topic to hard slots
                    // only; re-planning at medium keeps just the primary.
                    slot.topics.truncate(1);
                }
                Err(other) => return Err(other),
            }
        }
    }

    /// All attempts for one (possibly re-planned) slot.
    async fn run_slot_attempts(
        &self,
        slot: &ProblemSlot,
        ctx: &RunContext,
    ) -> std::result::Result<(GeneratedProblemDraft, Vec<RewriteRecord>), SlotRunError> {
        self.progress.emit(ProgressEvent::SlotStarted {
            slot_index: slot.index,
            difficulty: slot.difficulty,
            topics: slot.topics.clone(),
        });

        let generator = PerSlotGenerator::new(
            self.llm.as_ref(),
            self.judge.as_ref(),
            &self.config,
            ctx,
        );
        let executor = ReferenceExecutor::new(self.judge.as_ref(), &self.config);
        let gate = TestStrengthGate::new(self.judge.as_ref(), &self.config);

        let mut hashes: HashSet<String> = HashSet::new();
        let mut repair: Option<RepairInput> = None;
        let mut consecutive_parse_failures = 0u32;
        let mut last_error: Option<AttemptError> = None;

        let max_attempts = self.config.max_attempts_per_slot;
        let mut attempt = 0u32;
        while attempt < max_attempts {
            attempt += 1;
            if self.cancel.is_cancelled() {
                return Err(SlotRunError::Cancelled);
            }
            self.progress.emit(ProgressEvent::SlotLlmAttemptStarted {
                slot_index: slot.index,
                attempt,
            });

            let bundle = match generator.generate(slot, repair.as_ref(), &hashes).await {
                Ok(bundle) => bundle,
                Err(AttemptFailure { error, raw_sha256 }) => {
                    if let Some(hash) = raw_sha256 {
                        hashes.insert(hash);
                    }
                    let escalated = self.escalate_parse_failures(
                        error,
                        &mut consecutive_parse_failures,
                    );
                    self.emit_attempt_failure(slot, attempt, &escalated);
                    if escalated.kind() == FailureKind::Fatal {
                        return Err(SlotRunError::Failed(slot_failure(
                            slot, attempt, &escalated,
                        )));
                    }
                    repair = Some(repair_input_for(&escalated, None));
                    last_error = Some(escalated);
                    continue;
                }
            };
            consecutive_parse_failures = 0;
            hashes.insert(bundle.raw_sha256.clone());

            self.progress.emit(ProgressEvent::SlotContractValidated {
                slot_index: slot.index,
                attempt,
            });
            self.progress.emit(ProgressEvent::SlotEvidence {
                slot_index: slot.index,
                obligations: bundle.obligations.clone(),
                rewrites: bundle.rewrites.clone(),
                test_suite: self
                    .config
                    .trace_test_suites
                    .then(|| bundle.draft.test_suite.clone()),
            });

            self.progress.emit(ProgressEvent::SlotDockerValidationStarted {
                slot_index: slot.index,
                attempt,
            });
            let SlotDraftBundle {
                draft, rewrites, ..
            } = bundle;

            if let Err(error) = executor.execute(&draft).await {
                self.emit_attempt_failure(slot, attempt, &error);
                if error.kind() == FailureKind::Fatal {
                    return Err(SlotRunError::Failed(slot_failure(slot, attempt, &error)));
                }
                repair = Some(repair_input_for(&error, Some(draft)));
                last_error = Some(error);
                continue;
            }

            if let Err(error) = gate.enforce(&draft, slot).await {
                self.emit_attempt_failure(slot, attempt, &error);
                if error.kind() == FailureKind::Fatal {
                    return Err(SlotRunError::Failed(slot_failure(slot, attempt, &error)));
                }
                repair = Some(repair_input_for(&error, Some(draft)));
                last_error = Some(error);
                continue;
            }

            if self.cancel.is_cancelled() {
                return Err(SlotRunError::Cancelled);
            }
            self.progress.emit(ProgressEvent::SlotCompleted {
                slot_index: slot.index,
                problem_id: draft.id.clone(),
                title: draft.title.clone(),
            });
            return Ok((draft, rewrites));
        }

        let error = last_error.unwrap_or(AttemptError::Fatal {
            message: "slot exhausted attempts without recording an error".to_string(),
        });
        Err(SlotRunError::Failed(slot_failure(slot, max_attempts, &error)))
    }

    /// Two consecutive unparsable responses stop being a contract matter
    /// and become a transport-grade fatal failure.
    fn escalate_parse_failures(
        &self,
        error: AttemptError,
        consecutive: &mut u32,
    ) -> AttemptError {
        let is_parse_failure = error
            .obligation_id()
            .map(|id| id == obligation_ids::SLOT_PARSE_JSON)
            .unwrap_or(false);
        if is_parse_failure {
            *consecutive += 1;
            if *consecutive >= 2 {
                return AttemptError::Fatal {
                    message: "LLM output was unparsable twice in a row".to_string(),
                };
            }
        } else {
            *consecutive = 0;
        }
        error
    }

    fn emit_attempt_failure(&self, slot: &ProblemSlot, attempt: u32, error: &AttemptError) {
        match error {
            AttemptError::Contract {
                obligation_id,
                message,
            } => {
                self.progress.emit(ProgressEvent::SlotContractFailed {
                    slot_index: slot.index,
                    attempt,
                    obligation_id: obligation_id.clone(),
                    message: message.clone(),
                });
            }
            AttemptError::Execution { message, .. } | AttemptError::Quality { message, .. } => {
                self.progress.emit(ProgressEvent::SlotDockerValidationFailed {
                    slot_index: slot.index,
                    attempt,
                    kind: error.kind(),
                    message: message.clone(),
                });
            }
            AttemptError::Fatal { message } => {
                self.progress.emit(ProgressEvent::SlotContractFailed {
                    slot_index: slot.index,
                    attempt,
                    obligation_id: None,
                    message: message.clone(),
                });
            }
        }
    }
}

fn slot_failure(slot: &ProblemSlot, attempts: u32, error: &AttemptError) -> SlotFailure {
    SlotFailure {
        slot_index: slot.index,
        attempts,
        kind: error.kind(),
        obligation_id: error.obligation_id().map(String::from),
        short_error: error.short_message().to_string(),
    }
}

fn repair_input_for(
    error: &AttemptError,
    previous_draft: Option<GeneratedProblemDraft>,
) -> RepairInput {
    let (judge_stdout, judge_stderr) = match error {
        AttemptError::Execution {
            judge_stdout,
            judge_stderr,
            ..
        } => (Some(judge_stdout.clone()), Some(judge_stderr.clone())),
        _ => (None, None),
    };
    RepairInput {
        kind: error.kind(),
        previous_draft,
        error_message: Some(error.short_message().to_string()),
        judge_stdout,
        judge_stderr,
    }
}
