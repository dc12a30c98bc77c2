//! katagen-core - validated practice-problem generation.
//!
//! Given an [`ActivitySpec`] ("5 medium Java problems on polymorphism,
//! stdout-style"), the core plans problem slots, acquires LLM drafts,
//! enforces deterministic contracts over the generated source, executes
//! the hidden reference solution in a sandboxed judge, and rejects test
//! suites a trivial baseline can pass.
//!
//! # Architecture
//!
//! 1. **Planner** (`planner`): deterministic spec → slot expansion
//! 2. **PerSlotGenerator** (`slotgen`): prompt → parse → normalize →
//!    mechanical rewrites → shape validation → obligations
//! 3. **ReferenceExecutor** (`executor`): reference vs its own suite
//! 4. **TestStrengthGate** (`strength`): baselines must fail
//! 5. **GenerationPipeline** (`pipeline`): retries, soft fallback,
//!    cancellation, progress events
//!
//! Collaborators (LLM, judge, progress sink) are consumed through the
//! traits in `external`; tests substitute scripted implementations.

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod executor;
pub mod external;
pub mod obligations;
pub mod pipeline;
pub mod planner;
pub mod progress;
pub mod rewrite;
pub mod scan;
pub mod slotgen;
pub mod strength;
pub mod testsuite;
pub mod types;

pub use config::GenerationConfig;
pub use error::{
    AttemptError, CollaboratorError, FailureKind, KatagenError, Result, SlotFailure, SpecError,
};
pub use external::{
    CompletionRequest, CompletionResponse, JudgeAdapter, JudgeRequest, JudgeResult, LlmClient,
    ProgressSink,
};
pub use pipeline::{CancelToken, GenerationOutput, GenerationPipeline};
pub use planner::plan_slots;
pub use progress::{ProgressEvent, ProgressStream, SequencedEvent};
pub use types::{
    ActivitySpec, Difficulty, DifficultyBand, ExternalProblemDraft, GeneratedProblemDraft,
    Language, ObligationResult, ProblemSlot, ProblemStyle, RewriteRecord, RunContext, SoftFallback,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
