//! Reference-solution execution: run the hidden reference against the
//! slot's own test suite via the judge. Pass/fail is binary here; retry
//! policy belongs to the pipeline.

use tracing::debug;

use crate::config::GenerationConfig;
use crate::error::{AttemptError, CollaboratorError, KatagenError};
use crate::external::{JudgeAdapter, JudgeRequest, JudgeResult};
use crate::slotgen::truncate;
use crate::types::GeneratedProblemDraft;

/// Run one judge request under the configured timeout, mapping timeouts to
/// execution failures and transport breakage to fatal.
pub(crate) async fn run_judge(
    judge: &dyn JudgeAdapter,
    config: &GenerationConfig,
    request: JudgeRequest,
) -> Result<JudgeResult, AttemptError> {
    let call = judge.judge(request);
    match tokio::time::timeout(config.judge_timeout(), call).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(CollaboratorError::Transport(message))) => Err(AttemptError::Fatal {
            message: format!("judge transport failure: {message}"),
        }),
        Ok(Err(CollaboratorError::Timeout(elapsed))) => Err(AttemptError::Execution {
            message: format!("judge call timed out after {elapsed:?}"),
            judge_stdout: String::new(),
            judge_stderr: String::new(),
        }),
        Err(_) => Err(AttemptError::Execution {
            message: format!("judge call timed out after {:?}", config.judge_timeout()),
            judge_stdout: String::new(),
            judge_stderr: String::new(),
        }),
    }
}

/// The judge request for a draft's reference side (single file or
/// workspace).
pub(crate) fn reference_request(
    draft: &GeneratedProblemDraft,
) -> Result<JudgeRequest, KatagenError> {
    if let Some(files) = &draft.reference_workspace {
        Ok(JudgeRequest::Files {
            language: draft.language,
            files: files.clone(),
            test_suite: draft.test_suite.clone(),
        })
    } else if let Some(code) = &draft.reference_solution {
        Ok(JudgeRequest::Code {
            language: draft.language,
            code: code.clone(),
            test_suite: draft.test_suite.clone(),
        })
    } else {
        Err(KatagenError::Internal(
            "draft reached execution with no reference material".to_string(),
        ))
    }
}

/// Executes the reference solution against the draft's test suite.
pub struct ReferenceExecutor<'a> {
    judge: &'a dyn JudgeAdapter,
    config: &'a GenerationConfig,
}

impl<'a> ReferenceExecutor<'a> {
    pub fn new(judge: &'a dyn JudgeAdapter, config: &'a GenerationConfig) -> Self {
        Self { judge, config }
    }

    /// Ok when the reference passes every test. On failure, the truncated
    /// judge output rides along so the repair prompt can quote real
    /// assertion failures.
    pub async fn execute(&self, draft: &GeneratedProblemDraft) -> Result<JudgeResult, AttemptError> {
        let request = reference_request(draft).map_err(|e| AttemptError::Fatal {
            message: e.to_string(),
        })?;
        let result = run_judge(self.judge, self.config, request).await?;
        debug!(
            problem = %draft.id,
            success = result.success,
            failed = result.failed_tests.len(),
            "reference executed"
        );
        if result.success {
            Ok(result)
        } else {
            let budget = self.config.judge_output_budget;
            Err(AttemptError::Execution {
                message: format!(
                    "reference solution failed {} test(s)",
                    result.failed_tests.len().max(1)
                ),
                judge_stdout: truncate(&result.stdout, budget),
                judge_stderr: truncate(&result.stderr, budget),
            })
        }
    }
}
