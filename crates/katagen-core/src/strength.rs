//! Test-strength gate: the generated suite must separate a correct
//! solution from degenerate code. The starter scaffold and a trivial
//! constant baseline are both submitted; every baseline must fail, or the
//! slot fails with a quality error.

use tracing::debug;

use crate::config::GenerationConfig;
use crate::error::AttemptError;
use crate::executor::run_judge;
use crate::external::{JudgeAdapter, JudgeRequest};
use crate::obligations::ids as obligation_ids;
use crate::scan::cpp::CppScan;
use crate::types::{GeneratedProblemDraft, Language, ProblemSlot};

/// Runs degenerate candidates against the draft's own test suite.
pub struct TestStrengthGate<'a> {
    judge: &'a dyn JudgeAdapter,
    config: &'a GenerationConfig,
}

impl<'a> TestStrengthGate<'a> {
    pub fn new(judge: &'a dyn JudgeAdapter, config: &'a GenerationConfig) -> Self {
        Self { judge, config }
    }

    /// Ok when every baseline fails the suite. A baseline that passes
    /// fails the slot with `tests.reject_baselines`.
    pub async fn enforce(
        &self,
        draft: &GeneratedProblemDraft,
        slot: &ProblemSlot,
    ) -> Result<(), AttemptError> {
        for (name, request) in baselines(draft, slot) {
            let result = run_judge(self.judge, self.config, request).await?;
            debug!(problem = %draft.id, baseline = name, success = result.success, "baseline judged");
            if result.success {
                return Err(AttemptError::Quality {
                    obligation_id: obligation_ids::TESTS_REJECT_BASELINES.to_string(),
                    message: format!("{name} baseline passed the test suite"),
                });
            }
        }
        Ok(())
    }
}

/// The baselines for a draft, starter scaffold first. Java gets only the
/// scaffold; its starter is already a minimal stub.
fn baselines(
    draft: &GeneratedProblemDraft,
    slot: &ProblemSlot,
) -> Vec<(&'static str, JudgeRequest)> {
    let mut candidates = Vec::with_capacity(2);

    let starter = if let Some(files) = &draft.workspace {
        JudgeRequest::Files {
            language: draft.language,
            files: files.clone(),
            test_suite: draft.test_suite.clone(),
        }
    } else {
        JudgeRequest::Code {
            language: draft.language,
            code: draft.starter_code.clone(),
            test_suite: draft.test_suite.clone(),
        }
    };
    candidates.push(("starter-scaffold", starter));

    if let Some(code) = trivial_baseline(draft, slot) {
        candidates.push((
            "trivial-constant",
            JudgeRequest::Code {
                language: draft.language,
                code,
                test_suite: draft.test_suite.clone(),
            },
        ));
    }

    candidates
}

fn trivial_baseline(draft: &GeneratedProblemDraft, slot: &ProblemSlot) -> Option<String> {
    match slot.language {
        Language::Java => None,
        Language::Python => {
            if slot.problem_style.expects_stdout() {
                Some("def solve(*args, **kwargs):\n    print(0)\n    return 0\n".to_string())
            } else {
                Some("def solve(*args, **kwargs):\n    return 0\n".to_string())
            }
        }
        Language::Cpp => {
            let reference_text = draft.reference_text();
            let signature = CppScan::new(&reference_text).solve_signature()?;
            let mut body = String::new();
            if slot.problem_style.expects_stdout() {
                body.push_str("    std::cout << 0 << \"\\n\";\n");
            }
            if signature.return_type != "void" {
                body.push_str("    return {};\n");
            }
            Some(format!(
                "#include <iostream>\n\n{} {{\n{body}}}\n",
                signature.declaration()
            ))
        }
        Language::Sql => Some("SELECT 1;".to_string()),
    }
}
