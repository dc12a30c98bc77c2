//! Per-slot generation: prompt → LLM → tolerant parse → normalize →
//! mechanical rewrites → test-suite shape validation (with one-shot
//! repair) → obligation check.
//!
//! Every failure is a typed [`AttemptError`]; the pipeline owns the retry
//! policy and passes prior attempt hashes in so an identical raw output is
//! rejected before any validation re-runs.

pub mod parse;
pub mod prompts;

use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::config::GenerationConfig;
use crate::error::{AttemptError, CollaboratorError, FailureKind};
use crate::external::{CompletionRequest, JudgeAdapter, JudgeRequest, LlmClient};
use crate::obligations::{self, ids as obligation_ids};
use crate::rewrite::{ids as rewrite_ids, java as java_rewrite};
use crate::scan::cpp::CppScan;
use crate::scan::java::JavaScan;
use crate::testsuite::{validate_test_suite, TestSuiteRepairer};
use crate::types::{
    GeneratedProblemDraft, Language, ObligationResult, ProblemSlot, RewriteRecord, RunContext,
};

/// Context carried into a retry attempt.
#[derive(Debug, Clone)]
pub struct RepairInput {
    pub kind: FailureKind,
    pub previous_draft: Option<GeneratedProblemDraft>,
    pub error_message: Option<String>,
    pub judge_stdout: Option<String>,
    pub judge_stderr: Option<String>,
}

/// A draft that passed every deterministic check, with its evidence.
#[derive(Debug)]
pub struct SlotDraftBundle {
    pub draft: GeneratedProblemDraft,
    pub rewrites: Vec<RewriteRecord>,
    pub obligations: Vec<ObligationResult>,
    /// sha-256 of the raw LLM text, for the substantive-change gate.
    pub raw_sha256: String,
}

/// A failed attempt. The hash is present whenever an LLM response was
/// obtained, so the pipeline can still record it for dedup.
#[derive(Debug)]
pub struct AttemptFailure {
    pub error: AttemptError,
    pub raw_sha256: Option<String>,
}

impl AttemptFailure {
    fn bare(error: AttemptError) -> Self {
        Self {
            error,
            raw_sha256: None,
        }
    }

    fn hashed(error: AttemptError, raw_sha256: String) -> Self {
        Self {
            error,
            raw_sha256: Some(raw_sha256),
        }
    }
}

/// Raw LLM draft payload, before normalization.
#[derive(Debug, Deserialize)]
struct RawDraft {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    starter_code: Option<String>,
    #[serde(default)]
    test_suite: Option<String>,
    #[serde(default)]
    reference_solution: Option<String>,
    #[serde(default)]
    reference_workspace: Option<BTreeMap<String, String>>,
    #[serde(default)]
    workspace: Option<BTreeMap<String, String>>,
    #[serde(default)]
    constraints: Option<String>,
    #[serde(default)]
    sample_inputs: Option<Vec<String>>,
    #[serde(default)]
    sample_outputs: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ReferenceRepairPayload {
    reference_solution: String,
}

const MAX_SAMPLES: usize = 10;
const SAMPLE_PLACEHOLDER: &str = "(see description)";

pub(crate) fn sha256_hex(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Orchestrates one slot attempt.
pub struct PerSlotGenerator<'a> {
    llm: &'a dyn LlmClient,
    judge: &'a dyn JudgeAdapter,
    config: &'a GenerationConfig,
    ctx: &'a RunContext,
}

impl<'a> PerSlotGenerator<'a> {
    pub fn new(
        llm: &'a dyn LlmClient,
        judge: &'a dyn JudgeAdapter,
        config: &'a GenerationConfig,
        ctx: &'a RunContext,
    ) -> Self {
        Self {
            llm,
            judge,
            config,
            ctx,
        }
    }

    /// Produce a validated draft for the slot, or a typed failure.
    pub async fn generate(
        &self,
        slot: &ProblemSlot,
        repair: Option<&RepairInput>,
        prior_hashes: &HashSet<String>,
    ) -> Result<SlotDraftBundle, AttemptFailure> {
        // Targeted reference repair: a failing Java reference is rewritten
        // against the existing test suite instead of rebuilding the draft.
        if let Some(rep) = repair {
            if rep.kind == FailureKind::Execution {
                if let Some(prev) = &rep.previous_draft {
                    if prev.language == Language::Java && prev.reference_solution.is_some() {
                        return self.repair_reference(slot, rep, prev, prior_hashes).await;
                    }
                }
            }
        }

        let system = prompts::generation_system(slot);
        let user = prompts::generation_user(slot, repair);
        let raw = self
            .complete(system, user)
            .await
            .map_err(AttemptFailure::bare)?;
        let raw_sha256 = sha256_hex(&raw);
        if prior_hashes.contains(&raw_sha256) {
            return Err(AttemptFailure::hashed(
                AttemptError::Contract {
                    obligation_id: Some(obligation_ids::RETRY_SUBSTANTIVE_CHANGE.to_string()),
                    message: "retry produced byte-identical raw output".to_string(),
                },
                raw_sha256,
            ));
        }

        let Some(raw_draft) = parse::extract_and_parse::<RawDraft>(&raw) else {
            return Err(AttemptFailure::hashed(
                AttemptError::Contract {
                    obligation_id: Some(obligation_ids::SLOT_PARSE_JSON.to_string()),
                    message: "no parseable JSON object in LLM output".to_string(),
                },
                raw_sha256,
            ));
        };

        let mut rewrites = Vec::new();
        let mut draft = self
            .normalize(slot, raw_draft, &mut rewrites)
            .map_err(|e| AttemptFailure::hashed(e, raw_sha256.clone()))?;

        let mut suite_rebuilt = false;
        match slot.language {
            Language::Java => {
                self.apply_java_rewrites(&mut draft, &mut rewrites);
                suite_rebuilt = self
                    .rebuild_stdin_suite(slot, &mut draft, &mut rewrites)
                    .await
                    .map_err(|e| AttemptFailure::hashed(e, raw_sha256.clone()))?;
            }
            Language::Cpp => {
                synthesize_cpp_starter(&mut draft, &mut rewrites);
            }
            _ => {}
        }

        // A mechanically rebuilt suite is deterministic output of ours, not
        // of the LLM; shape validation targets LLM-shaped suites.
        if !suite_rebuilt {
            if let Err(issue) = validate_test_suite(&draft.test_suite, slot) {
                debug!(slot = slot.index, code = %issue.code, "test suite shape invalid");
                let repairer = TestSuiteRepairer::new(self.llm, self.config);
                let repaired = repairer
                    .repair(&draft, slot, &issue)
                    .await
                    .map_err(|e| AttemptFailure::hashed(e, raw_sha256.clone()))?;
                draft.test_suite = repaired;
                if slot.language == Language::Java {
                    self.rename_test_class(&mut draft, &mut rewrites);
                }
                if let Err(issue) = validate_test_suite(&draft.test_suite, slot) {
                    return Err(AttemptFailure::hashed(
                        AttemptError::Contract {
                            obligation_id: Some(obligation_ids::SLOT_TEST_SUITE_SHAPE.to_string()),
                            message: format!("test suite invalid after repair: {issue}"),
                        },
                        raw_sha256,
                    ));
                }
            }
        }

        let obligations = obligations::check_draft(&draft, slot).map_err(|violation| {
            AttemptFailure::hashed(
                AttemptError::Contract {
                    obligation_id: Some(violation.id.clone()),
                    message: violation.message,
                },
                raw_sha256.clone(),
            )
        })?;

        info!(
            slot = slot.index,
            rewrites = rewrites.len(),
            obligations = obligations.len(),
            "draft ready"
        );
        Ok(SlotDraftBundle {
            draft,
            rewrites,
            obligations,
            raw_sha256,
        })
    }

    /// One LLM call whose sole task is to rewrite a failing Java reference
    /// so the existing test suite passes. Any other field change in the
    /// response is ignored.
    async fn repair_reference(
        &self,
        slot: &ProblemSlot,
        rep: &RepairInput,
        prev: &GeneratedProblemDraft,
        prior_hashes: &HashSet<String>,
    ) -> Result<SlotDraftBundle, AttemptFailure> {
        let previous_reference = prev.reference_solution.as_deref().unwrap_or_default();
        let user = prompts::reference_repair_user(
            &prev.title,
            &prev.description,
            previous_reference,
            &prev.test_suite,
            rep.judge_stdout.as_deref().unwrap_or_default(),
            rep.judge_stderr.as_deref().unwrap_or_default(),
        );
        let raw = self
            .complete(prompts::REFERENCE_REPAIR_SYSTEM.to_string(), user)
            .await
            .map_err(AttemptFailure::bare)?;
        let raw_sha256 = sha256_hex(&raw);
        if prior_hashes.contains(&raw_sha256) {
            return Err(AttemptFailure::hashed(
                AttemptError::Contract {
                    obligation_id: Some(obligation_ids::RETRY_SUBSTANTIVE_CHANGE.to_string()),
                    message: "reference repair produced byte-identical raw output".to_string(),
                },
                raw_sha256,
            ));
        }

        let Some(payload) = parse::extract_and_parse::<ReferenceRepairPayload>(&raw) else {
            return Err(AttemptFailure::hashed(
                AttemptError::Contract {
                    obligation_id: Some(obligation_ids::SLOT_PARSE_JSON.to_string()),
                    message: "reference repair did not return {\"reference_solution\": ...}"
                        .to_string(),
                },
                raw_sha256,
            ));
        };
        if payload.reference_solution.trim() == previous_reference.trim() {
            return Err(AttemptFailure::hashed(
                AttemptError::Execution {
                    message: "reference repair returned an unchanged solution".to_string(),
                    judge_stdout: String::new(),
                    judge_stderr: String::new(),
                },
                raw_sha256,
            ));
        }

        let mut draft = prev.clone();
        draft.reference_solution = Some(payload.reference_solution);
        let mut rewrites = Vec::new();
        self.apply_java_rewrites(&mut draft, &mut rewrites);
        let obligations = obligations::check_draft(&draft, slot).map_err(|violation| {
            AttemptFailure::hashed(
                AttemptError::Contract {
                    obligation_id: Some(violation.id.clone()),
                    message: violation.message,
                },
                raw_sha256.clone(),
            )
        })?;

        Ok(SlotDraftBundle {
            draft,
            rewrites,
            obligations,
            raw_sha256,
        })
    }

    async fn complete(&self, system: String, user: String) -> Result<String, AttemptError> {
        let request = CompletionRequest::new(system, user);
        let call = self.llm.complete(request);
        match tokio::time::timeout(self.config.llm_timeout(), call).await {
            Ok(Ok(response)) => Ok(response.text),
            Ok(Err(CollaboratorError::Transport(message))) => Err(AttemptError::Fatal {
                message: format!("LLM transport failure: {message}"),
            }),
            Ok(Err(CollaboratorError::Timeout(elapsed))) => Err(AttemptError::Fatal {
                message: format!("LLM call timed out after {elapsed:?}"),
            }),
            Err(_) => Err(AttemptError::Fatal {
                message: format!("LLM call timed out after {:?}", self.config.llm_timeout()),
            }),
        }
    }

    fn normalize(
        &self,
        slot: &ProblemSlot,
        raw: RawDraft,
        rewrites: &mut Vec<RewriteRecord>,
    ) -> Result<GeneratedProblemDraft, AttemptError> {
        let description = raw.description.unwrap_or_default();
        if description.trim().is_empty() {
            return Err(AttemptError::Contract {
                obligation_id: None,
                message: "draft has no description".to_string(),
            });
        }

        let reference_solution = raw.reference_solution.filter(|r| !r.trim().is_empty());
        let reference_workspace = raw.reference_workspace.filter(|ws| !ws.is_empty());
        if reference_solution.is_none() && reference_workspace.is_none() {
            return Err(AttemptError::Contract {
                obligation_id: Some(obligation_ids::SLOT_REFERENCE_PRESENT.to_string()),
                message: "draft has no reference solution".to_string(),
            });
        }

        // Constraints drift is a contract failure; only an absent field is
        // filled in mechanically.
        let constraints = match raw.constraints {
            Some(text) if text.trim() == slot.constraints.trim() => slot.constraints.clone(),
            Some(text) => {
                return Err(AttemptError::Contract {
                    obligation_id: Some(obligation_ids::SLOT_CONSTRAINTS_MATCH.to_string()),
                    message: format!(
                        "Invalid constraints: expected the slot constraints verbatim, got {:?}",
                        truncate(&text, 120)
                    ),
                });
            }
            None => {
                rewrites.push(RewriteRecord::applied(
                    rewrite_ids::SLOT_REPLACE_CONSTRAINTS,
                    "constraints field absent, filled from slot",
                ));
                slot.constraints.clone()
            }
        };

        let (sample_inputs, sample_outputs) =
            normalize_samples(raw.sample_inputs, raw.sample_outputs, rewrites);

        let title = raw
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("Practice: {}", slot.primary_topic()));

        let starter_code = raw.starter_code.unwrap_or_default();
        if starter_code.trim().is_empty()
            && !matches!(slot.language, Language::Java | Language::Cpp)
        {
            return Err(AttemptError::Contract {
                obligation_id: None,
                message: "draft has no starter code".to_string(),
            });
        }

        Ok(GeneratedProblemDraft {
            id: self.ctx.next_id(),
            title,
            description,
            language: slot.language,
            difficulty: slot.difficulty,
            topic_tag: slot.primary_topic().to_string(),
            constraints,
            starter_code,
            test_suite: raw.test_suite.unwrap_or_default(),
            reference_solution,
            reference_workspace,
            workspace: raw.workspace.filter(|ws| !ws.is_empty()),
            sample_inputs,
            sample_outputs,
        })
    }

    /// Java mechanical rewrites, in fixed order: reference visibility,
    /// starter synthesis/visibility, test-class rename, literal whitespace.
    fn apply_java_rewrites(
        &self,
        draft: &mut GeneratedProblemDraft,
        rewrites: &mut Vec<RewriteRecord>,
    ) {
        if let Some(reference) = draft.reference_solution.take() {
            let starter_primary = JavaScan::new(&draft.starter_code)
                .primary_public_type()
                .map(|t| t.name);
            let promoted =
                java_rewrite::promote_type_to_public(&reference, starter_primary.as_deref());
            if promoted.changed {
                rewrites.push(RewriteRecord::applied(
                    rewrite_ids::JAVA_PROMOTE_PUBLIC_TYPE,
                    promoted.detail.clone(),
                ));
            }
            let demoted = java_rewrite::demote_extra_public_types(
                &promoted.source,
                starter_primary.as_deref(),
            );
            if demoted.changed {
                rewrites.push(RewriteRecord::applied(
                    rewrite_ids::JAVA_DEMOTE_EXTRA_PUBLIC_TYPES,
                    demoted.detail.clone(),
                ));
            }
            draft.reference_solution = Some(demoted.source);
        } else if let Some(ws) = draft.reference_workspace.take() {
            let mut demoted_files = Vec::new();
            let ws = ws
                .into_iter()
                .map(|(path, content)| {
                    let outcome = java_rewrite::demote_extra_public_types(&content, None);
                    if outcome.changed {
                        demoted_files.push(path.clone());
                    }
                    (path, outcome.source)
                })
                .collect();
            if !demoted_files.is_empty() {
                rewrites.push(RewriteRecord::applied(
                    rewrite_ids::JAVA_DEMOTE_EXTRA_PUBLIC_TYPES,
                    format!("demoted extra public types in {}", demoted_files.join(", ")),
                ));
            }
            draft.reference_workspace = Some(ws);
        }

        let reference_text = draft.reference_text();
        let target = JavaScan::new(&reference_text)
            .primary_public_type()
            .map(|t| t.name);

        if let Some(target) = &target {
            let starter_scan = JavaScan::new(&draft.starter_code);
            if starter_scan.top_level_types().is_empty() {
                draft.starter_code = format!("public class {target} {{\n\n}}\n");
                rewrites.push(RewriteRecord::applied(
                    rewrite_ids::SLOT_SYNTHESIZE_STARTER,
                    format!("synthesized empty {target} skeleton"),
                ));
            } else {
                let promoted =
                    java_rewrite::promote_type_to_public(&draft.starter_code, Some(target));
                if promoted.changed {
                    rewrites.push(RewriteRecord::applied(
                        rewrite_ids::JAVA_PROMOTE_PUBLIC_TYPE,
                        format!("starter: {}", promoted.detail),
                    ));
                }
                let demoted =
                    java_rewrite::demote_extra_public_types(&promoted.source, Some(target));
                if demoted.changed {
                    rewrites.push(RewriteRecord::applied(
                        rewrite_ids::JAVA_DEMOTE_EXTRA_PUBLIC_TYPES,
                        format!("starter: {}", demoted.detail),
                    ));
                }
                draft.starter_code = demoted.source;
            }
        }

        self.rename_test_class(draft, rewrites);

        let sanitized = java_rewrite::sanitize_string_literal_whitespace(&draft.test_suite);
        if sanitized.changed {
            rewrites.push(RewriteRecord::applied(
                rewrite_ids::JAVA_SANITIZE_STRING_WHITESPACE,
                sanitized.detail.clone(),
            ));
        }
        draft.test_suite = sanitized.source;
    }

    fn rename_test_class(
        &self,
        draft: &mut GeneratedProblemDraft,
        rewrites: &mut Vec<RewriteRecord>,
    ) {
        let reference_text = draft.reference_text();
        let Some(target) = JavaScan::new(&reference_text)
            .primary_public_type()
            .map(|t| t.name)
        else {
            return;
        };
        let renamed =
            java_rewrite::rename_public_class(&draft.test_suite, &format!("{target}Test"));
        if renamed.changed {
            rewrites.push(RewriteRecord::applied(
                rewrite_ids::JAVA_RENAME_TEST_CLASS,
                renamed.detail.clone(),
            ));
        }
        draft.test_suite = renamed.source;
    }

    /// When a Java reference reads stdin, replace the LLM's suite with a
    /// deterministic one built by running the reference against each
    /// sample input. A sample producing non-empty stderr fails the slot.
    async fn rebuild_stdin_suite(
        &self,
        slot: &ProblemSlot,
        draft: &mut GeneratedProblemDraft,
        rewrites: &mut Vec<RewriteRecord>,
    ) -> Result<bool, AttemptError> {
        let Some(reference) = draft.reference_solution.clone() else {
            return Ok(false);
        };
        if !JavaScan::new(&reference).reads_stdin() {
            return Ok(false);
        }
        let Some(target) = JavaScan::new(&reference).primary_public_type().map(|t| t.name) else {
            return Ok(false);
        };

        let mut cases = Vec::with_capacity(draft.sample_inputs.len());
        for input in &draft.sample_inputs {
            let result = crate::executor::run_judge(
                self.judge,
                self.config,
                JudgeRequest::Run {
                    language: slot.language,
                    code: reference.clone(),
                    stdin: input.clone(),
                },
            )
            .await?;
            if !result.stderr.trim().is_empty() {
                return Err(AttemptError::Execution {
                    message: "reference wrote stderr while capturing sample output".to_string(),
                    judge_stdout: truncate(&result.stdout, self.config.judge_output_budget),
                    judge_stderr: truncate(&result.stderr, self.config.judge_output_budget),
                });
            }
            cases.push(java_rewrite::StdinCase {
                input: input.clone(),
                expected_stdout: result.stdout,
            });
        }

        draft.test_suite = java_rewrite::build_stdin_test_suite(&target, &cases);
        rewrites.push(RewriteRecord::applied(
            rewrite_ids::JAVA_REBUILD_STDIN_TESTS,
            format!("rebuilt suite from {} sample(s)", cases.len()),
        ));
        Ok(true)
    }
}

fn normalize_samples(
    inputs: Option<Vec<String>>,
    outputs: Option<Vec<String>>,
    rewrites: &mut Vec<RewriteRecord>,
) -> (Vec<String>, Vec<String>) {
    let trim_all = |values: Option<Vec<String>>| -> Vec<String> {
        values
            .unwrap_or_default()
            .into_iter()
            .map(|v| v.trim().to_string())
            .take(MAX_SAMPLES)
            .collect()
    };
    let inputs = trim_all(inputs);
    let outputs = trim_all(outputs);
    if inputs.is_empty() || outputs.is_empty() || inputs.len() != outputs.len() {
        rewrites.push(RewriteRecord::applied(
            rewrite_ids::SLOT_NORMALIZE_SAMPLES,
            "samples missing or mismatched, replaced with placeholder pair",
        ));
        (
            vec![SAMPLE_PLACEHOLDER.to_string()],
            vec![SAMPLE_PLACEHOLDER.to_string()],
        )
    } else {
        (inputs, outputs)
    }
}

/// C++ starter scaffolds come from the reference's `solve` signature so
/// the scaffold never leaks the body.
fn synthesize_cpp_starter(draft: &mut GeneratedProblemDraft, rewrites: &mut Vec<RewriteRecord>) {
    if CppScan::new(&draft.starter_code).mentions_solve() {
        return;
    }
    let reference_text = draft.reference_text();
    let Some(signature) = CppScan::new(&reference_text).solve_signature() else {
        return;
    };
    draft.starter_code = format!(
        "#include <stdexcept>\n\n{} {{\n    throw std::logic_error(\"not implemented\");\n}}\n",
        signature.declaration()
    );
    rewrites.push(RewriteRecord::applied(
        rewrite_ids::SLOT_SYNTHESIZE_STARTER,
        format!("synthesized starter from `{}`", signature.declaration()),
    ));
}

pub(crate) fn truncate(text: &str, budget: usize) -> String {
    if text.len() <= budget {
        return text.to_string();
    }
    let mut end = budget;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…[truncated]", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_is_stable() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn samples_placeholder_on_mismatch() {
        let mut rewrites = Vec::new();
        let (inputs, outputs) = normalize_samples(
            Some(vec!["1".into(), "2".into()]),
            Some(vec!["1".into()]),
            &mut rewrites,
        );
        assert_eq!(inputs, vec![SAMPLE_PLACEHOLDER]);
        assert_eq!(outputs, vec![SAMPLE_PLACEHOLDER]);
        assert_eq!(rewrites.len(), 1);
        assert_eq!(rewrites[0].id, rewrite_ids::SLOT_NORMALIZE_SAMPLES);
    }

    #[test]
    fn samples_trimmed_and_capped() {
        let mut rewrites = Vec::new();
        let many: Vec<String> = (0..15).map(|n| format!(" {n} ")).collect();
        let (inputs, outputs) = normalize_samples(Some(many.clone()), Some(many), &mut rewrites);
        assert_eq!(inputs.len(), MAX_SAMPLES);
        assert_eq!(inputs[0], "0");
        assert_eq!(outputs.len(), MAX_SAMPLES);
        assert!(rewrites.is_empty());
    }

    #[test]
    fn cpp_starter_synthesis_does_not_leak_body() {
        let mut draft = GeneratedProblemDraft {
            id: "p".into(),
            title: "t".into(),
            description: "d".into(),
            language: Language::Cpp,
            difficulty: crate::types::Difficulty::Easy,
            topic_tag: "arrays".into(),
            constraints: "c".into(),
            starter_code: "#include <vector>\n// your solution here\n".into(),
            test_suite: String::new(),
            reference_solution: Some(
                "int solve(int a, int b) {\n    return a * 31 + b;\n}\n".into(),
            ),
            reference_workspace: None,
            workspace: None,
            sample_inputs: vec!["1 2".into()],
            sample_outputs: vec!["33".into()],
        };
        let mut rewrites = Vec::new();
        synthesize_cpp_starter(&mut draft, &mut rewrites);
        assert!(draft.starter_code.contains("int solve(int a, int b)"));
        assert!(draft.starter_code.contains("throw std::logic_error"));
        assert!(!draft.starter_code.contains("31"));
        assert_eq!(rewrites.len(), 1);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "héllo wörld";
        let out = truncate(text, 2);
        assert!(out.starts_with('h'));
        assert!(out.ends_with("[truncated]"));
    }
}
