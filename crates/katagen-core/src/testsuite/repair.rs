//! One-shot LLM repair of an invalid test suite.
//!
//! Authorized only when the draft's sole validation failure is in the
//! test suite. The repairer sends a strictly templated prompt with the
//! prior suite and the structured error, expects `{"test_suite": "..."}`
//! back, and the caller re-validates. One attempt per slot attempt.

use serde::Deserialize;
use tracing::info;

use super::validator::TestSuiteIssue;
use crate::config::GenerationConfig;
use crate::error::{AttemptError, CollaboratorError};
use crate::external::{CompletionRequest, LlmClient};
use crate::slotgen::parse::extract_and_parse;
use crate::types::{GeneratedProblemDraft, ProblemSlot};

const REPAIR_SYSTEM_PROMPT: &str = "You repair invalid test suites for generated practice problems. \
You receive one problem and the structured reason its test suite was rejected. \
Rewrite ONLY the test suite so it satisfies the stated contract. \
Do not change the problem, the starter code, or the reference solution. \
Respond with a single JSON object: {\"test_suite\": \"...\"} and nothing else.";

#[derive(Debug, Deserialize)]
struct RepairPayload {
    test_suite: String,
}

/// The one-shot test-suite repairer.
pub struct TestSuiteRepairer<'a> {
    llm: &'a dyn LlmClient,
    config: &'a GenerationConfig,
}

impl<'a> TestSuiteRepairer<'a> {
    pub fn new(llm: &'a dyn LlmClient, config: &'a GenerationConfig) -> Self {
        Self { llm, config }
    }

    /// Rewrite the draft's test suite against the fixed contract. The
    /// returned suite has not been re-validated; the caller does that.
    pub async fn repair(
        &self,
        draft: &GeneratedProblemDraft,
        slot: &ProblemSlot,
        issue: &TestSuiteIssue,
    ) -> Result<String, AttemptError> {
        let user = serde_json::json!({
            "language": slot.language,
            "problem_style": slot.problem_style,
            "test_case_count": slot.test_case_count,
            "title": draft.title,
            "description": draft.description,
            "starter_code": draft.starter_code,
            "invalid_test_suite": draft.test_suite,
            "rejection": { "code": issue.code, "message": issue.message },
        })
        .to_string();

        info!(slot = slot.index, code = %issue.code, "repairing test suite");

        let request = CompletionRequest::new(REPAIR_SYSTEM_PROMPT, user);
        let call = self.llm.complete(request);
        let response = match tokio::time::timeout(self.config.llm_timeout(), call).await {
            Ok(Ok(response)) => response,
            Ok(Err(CollaboratorError::Transport(message))) => {
                return Err(AttemptError::Fatal {
                    message: format!("test suite repair transport failure: {message}"),
                });
            }
            Ok(Err(CollaboratorError::Timeout(elapsed))) => {
                return Err(AttemptError::Fatal {
                    message: format!("test suite repair timed out after {elapsed:?}"),
                });
            }
            Err(_) => {
                return Err(AttemptError::Fatal {
                    message: format!(
                        "test suite repair timed out after {:?}",
                        self.config.llm_timeout()
                    ),
                });
            }
        };

        let payload: RepairPayload =
            extract_and_parse(&response.text).ok_or_else(|| AttemptError::Contract {
                obligation_id: Some(crate::obligations::ids::SLOT_TEST_SUITE_SHAPE.to_string()),
                message: "test suite repair did not return {\"test_suite\": ...}".to_string(),
            })?;

        if payload.test_suite.trim().is_empty() || payload.test_suite == draft.test_suite {
            return Err(AttemptError::Contract {
                obligation_id: Some(crate::obligations::ids::SLOT_TEST_SUITE_SHAPE.to_string()),
                message: "test suite repair returned an empty or unchanged suite".to_string(),
            });
        }

        Ok(payload.test_suite)
    }
}
