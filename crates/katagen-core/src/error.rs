//! Error taxonomy for the generation core.
//!
//! Failures are tagged sums, not an exception hierarchy: the pipeline's
//! retry policy matches exhaustively on [`FailureKind`], and the `Fatal`
//! arm stays explicit so a forgotten category can never silently become
//! retriable.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Difficulty;

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, KatagenError>;

/// Top-level error for core operations.
#[derive(Error, Debug)]
pub enum KatagenError {
    /// The activity spec violated a field constraint.
    #[error("invalid activity spec: {0}")]
    Spec(#[from] SpecError),

    /// A slot exhausted its retries; the whole run fails and prior drafts
    /// are discarded.
    #[error("{0}")]
    SlotFailed(SlotFailure),

    /// The run was cancelled by the caller.
    #[error("generation cancelled")]
    Cancelled,

    /// Internal invariant violated; a programmer error, never retried.
    #[error("internal invariant violated: {0}")]
    Internal(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Spec field-constraint violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("problem_count must be in [1, 7], got {0}")]
    ProblemCountOutOfRange(u32),

    #[error("difficulty_plan must be non-empty")]
    EmptyDifficultyPlan,

    #[error("difficulty_plan entry for {0} has count 0")]
    ZeroBandCount(Difficulty),

    #[error("difficulty_plan counts sum to {actual}, expected problem_count {expected}")]
    PlanCountMismatch { expected: u32, actual: u32 },

    #[error("topic_tags must be non-empty")]
    EmptyTopicTags,

    #[error("focus_concepts, when present, must be non-empty")]
    EmptyFocusConcepts,

    #[error("test_case_count is fixed at 8 in v1, got {0}")]
    UnsupportedTestCaseCount(u32),
}

/// Failure category used by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// LLM output failed a deterministic check (shape, constraints,
    /// obligations). Retriable.
    Contract,
    /// The reference solution failed its own tests in the judge. Retriable
    /// with the reference-repair path.
    Execution,
    /// A baseline passed the tests; the suite is too weak. Retriable.
    Quality,
    /// Transport failure, schema bug, or cancellation. Not retriable.
    Fatal,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::Contract => "contract",
            FailureKind::Execution => "execution",
            FailureKind::Quality => "quality",
            FailureKind::Fatal => "fatal",
        };
        f.write_str(s)
    }
}

/// The single user-visible failure surface: the first failing slot's kind,
/// obligation id, and a one-line redacted message. Diagnostics beyond this
/// live only in the progress stream.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("slot {slot_index} failed ({kind}) after {attempts} attempt(s): {short_error}")]
pub struct SlotFailure {
    pub slot_index: usize,
    pub attempts: u32,
    pub kind: FailureKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obligation_id: Option<String>,
    pub short_error: String,
}

/// Failure of a single slot attempt, matched on by the pipeline.
#[derive(Debug, Clone)]
pub enum AttemptError {
    Contract {
        obligation_id: Option<String>,
        message: String,
    },
    Execution {
        message: String,
        /// Truncated judge stdout, forwarded into the repair prompt.
        judge_stdout: String,
        /// Truncated judge stderr.
        judge_stderr: String,
    },
    Quality {
        obligation_id: String,
        message: String,
    },
    Fatal {
        message: String,
    },
}

impl AttemptError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AttemptError::Contract { .. } => FailureKind::Contract,
            AttemptError::Execution { .. } => FailureKind::Execution,
            AttemptError::Quality { .. } => FailureKind::Quality,
            AttemptError::Fatal { .. } => FailureKind::Fatal,
        }
    }

    pub fn obligation_id(&self) -> Option<&str> {
        match self {
            AttemptError::Contract { obligation_id, .. } => obligation_id.as_deref(),
            AttemptError::Quality { obligation_id, .. } => Some(obligation_id),
            _ => None,
        }
    }

    /// One-line message with no code snippets, safe for progress events.
    pub fn short_message(&self) -> &str {
        match self {
            AttemptError::Contract { message, .. } => message,
            AttemptError::Execution { message, .. } => message,
            AttemptError::Quality { message, .. } => message,
            AttemptError::Fatal { message } => message,
        }
    }
}

/// Failures of the consumed collaborator interfaces (LLM, judge).
#[derive(Error, Debug, Clone)]
pub enum CollaboratorError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("call timed out after {0:?}")]
    Timeout(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_kind_display_is_lowercase() {
        assert_eq!(FailureKind::Contract.to_string(), "contract");
        assert_eq!(FailureKind::Fatal.to_string(), "fatal");
    }

    #[test]
    fn slot_failure_message_names_slot_and_kind() {
        let failure = SlotFailure {
            slot_index: 2,
            attempts: 3,
            kind: FailureKind::Quality,
            obligation_id: Some("tests.reject_baselines".to_string()),
            short_error: "starter baseline passed the suite".to_string(),
        };
        let msg = failure.to_string();
        assert!(msg.contains("slot 2"));
        assert!(msg.contains("quality"));
    }

    #[test]
    fn attempt_error_exposes_obligation_id() {
        let err = AttemptError::Quality {
            obligation_id: "tests.reject_baselines".to_string(),
            message: "baseline passed".to_string(),
        };
        assert_eq!(err.obligation_id(), Some("tests.reject_baselines"));
        assert_eq!(err.kind(), FailureKind::Quality);
    }
}
