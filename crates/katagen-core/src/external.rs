//! Collaborator interfaces consumed by the core.
//!
//! The core never talks to a network or a container directly: it is handed
//! an [`LlmClient`], a [`JudgeAdapter`], and a [`ProgressSink`]. Tests
//! substitute scripted implementations; production wiring lives in the
//! provider and judge crates.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;
use crate::progress::ProgressEvent;
use crate::types::Language;

/// A single LLM completion request. The transport must not retry
/// internally; the core owns all retry policy.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

/// The raw completion text. Treated as bytes; the core does all parsing.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub text: String,
}

/// The LLM collaborator.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CollaboratorError>;
}

/// A request to the sandboxed judge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JudgeRequest {
    /// Single compilation unit plus its test suite.
    Code {
        language: Language,
        code: String,
        test_suite: String,
    },
    /// Multi-file workspace plus its test suite.
    Files {
        language: Language,
        files: BTreeMap<String, String>,
        test_suite: String,
    },
    /// Bare program run with the given stdin; no test suite. Used to
    /// capture reference stdout when rebuilding stdin-driven test suites.
    Run {
        language: Language,
        code: String,
        stdin: String,
    },
}

/// The judge's verdict. Pass/fail must be deterministic over identical
/// inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeResult {
    pub success: bool,
    pub passed_tests: Vec<String>,
    pub failed_tests: Vec<String>,
    pub stdout: String,
    pub stderr: String,
    pub execution_time_ms: u64,
    pub exit_code: i32,
    pub timed_out: bool,
}

impl JudgeResult {
    /// A passing result with no test detail, convenient for run-mode.
    pub fn passed(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            passed_tests: Vec::new(),
            failed_tests: Vec::new(),
            stdout: stdout.into(),
            stderr: String::new(),
            execution_time_ms: 0,
            exit_code: 0,
            timed_out: false,
        }
    }
}

/// The sandboxed judge collaborator. Implementations must be safe to call
/// concurrently; within one slot the core serializes its calls.
#[async_trait]
pub trait JudgeAdapter: Send + Sync {
    async fn judge(&self, request: JudgeRequest) -> Result<JudgeResult, CollaboratorError>;
}

/// Append-only consumer of progress events. The replay buffer belongs to
/// the pipeline's own [`crate::progress::ProgressStream`].
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}
