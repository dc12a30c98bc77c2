//! Core data model: activity specs, slots, drafts, run context.
//!
//! An `ActivitySpec` is immutable input from the dialogue layer. The
//! `Planner` expands it into `ProblemSlot`s; each successful slot yields a
//! `GeneratedProblemDraft`, which is stripped down to an
//! `ExternalProblemDraft` before it leaves the core.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::SpecError;

/// Languages a generated activity can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Java,
    Python,
    Cpp,
    Sql,
}

impl Language {
    /// Canonical lowercase name, matching the wire format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Java => "java",
            Language::Python => "python",
            Language::Cpp => "cpp",
            Language::Sql => "sql",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Problem difficulty. Ordering is the planning order: easy < medium < hard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(s)
    }
}

/// How a problem's solutions communicate their result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemStyle {
    /// Solutions return a value; tests assert on the return value.
    Return,
    /// Solutions print to stdout; tests capture and compare stdout.
    Stdout,
    /// Both shapes appear in the activity.
    Mixed,
}

impl ProblemStyle {
    /// True for styles where the solution is expected to write stdout.
    pub fn expects_stdout(&self) -> bool {
        matches!(self, ProblemStyle::Stdout | ProblemStyle::Mixed)
    }
}

/// One entry of the difficulty plan: `count` problems at `difficulty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyBand {
    pub difficulty: Difficulty,
    pub count: u32,
}

/// Input to the core, produced once by the dialogue layer and immutable
/// while the pipeline runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySpec {
    pub language: Language,
    pub problem_count: u32,
    pub difficulty_plan: Vec<DifficultyBand>,
    pub topic_tags: Vec<String>,
    pub problem_style: ProblemStyle,
    /// Language-specific canonical constraints string, copied verbatim into
    /// every slot and every draft.
    pub constraints: String,
    /// Fixed at 8 for v1.
    #[serde(default = "default_test_case_count")]
    pub test_case_count: u32,
    /// Set by the dialogue layer when the user's intent literally demanded
    /// hard difficulty. Gates the soft-fallback policy; the core never
    /// re-derives intent from prose.
    #[serde(default)]
    pub explicit_hard_requested: bool,
    /// Optional guided subset of `topic_tags` the planner round-robins over
    /// instead of the full tag list.
    #[serde(default)]
    pub focus_concepts: Option<Vec<String>>,
}

fn default_test_case_count() -> u32 {
    8
}

impl ActivitySpec {
    /// Validate the spec's field constraints.
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.problem_count < 1 || self.problem_count > 7 {
            return Err(SpecError::ProblemCountOutOfRange(self.problem_count));
        }
        if self.difficulty_plan.is_empty() {
            return Err(SpecError::EmptyDifficultyPlan);
        }
        if let Some(band) = self.difficulty_plan.iter().find(|b| b.count == 0) {
            return Err(SpecError::ZeroBandCount(band.difficulty));
        }
        let total: u32 = self.difficulty_plan.iter().map(|b| b.count).sum();
        if total != self.problem_count {
            return Err(SpecError::PlanCountMismatch {
                expected: self.problem_count,
                actual: total,
            });
        }
        if self.topic_tags.is_empty() {
            return Err(SpecError::EmptyTopicTags);
        }
        if self.test_case_count != 8 {
            return Err(SpecError::UnsupportedTestCaseCount(self.test_case_count));
        }
        if let Some(focus) = &self.focus_concepts {
            if focus.is_empty() {
                return Err(SpecError::EmptyFocusConcepts);
            }
        }
        Ok(())
    }
}

/// One unit of generation work, carved out of an `ActivitySpec` by the
/// planner. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemSlot {
    pub index: usize,
    pub language: Language,
    pub difficulty: Difficulty,
    /// One primary topic, plus an optional secondary for hard slots.
    pub topics: Vec<String>,
    pub problem_style: ProblemStyle,
    pub constraints: String,
    pub test_case_count: u32,
}

impl ProblemSlot {
    /// The primary topic tag assigned to this slot.
    pub fn primary_topic(&self) -> &str {
        self.topics.first().map(String::as_str).unwrap_or_default()
    }
}

/// A generated problem, including the hidden reference material.
///
/// `reference_solution` (or `reference_workspace` for multi-file Java) never
/// leaves the core; callers receive an [`ExternalProblemDraft`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedProblemDraft {
    pub id: String,
    pub title: String,
    pub description: String,
    pub language: Language,
    pub difficulty: Difficulty,
    pub topic_tag: String,
    pub constraints: String,
    pub starter_code: String,
    pub test_suite: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_solution: Option<String>,
    /// Multi-file Java reference, path → content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_workspace: Option<BTreeMap<String, String>>,
    /// Multi-file starter workspace, path → content. Must share its path set
    /// with `reference_workspace` when both are present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<BTreeMap<String, String>>,
    pub sample_inputs: Vec<String>,
    pub sample_outputs: Vec<String>,
}

impl GeneratedProblemDraft {
    /// All Java compilation units of this draft that belong to the
    /// *solution* side: the single reference source or every workspace file.
    pub fn reference_units(&self) -> Vec<(&str, &str)> {
        if let Some(ws) = &self.reference_workspace {
            ws.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect()
        } else if let Some(reference) = &self.reference_solution {
            vec![("reference", reference.as_str())]
        } else {
            Vec::new()
        }
    }

    /// The single reference source, joining workspace files when the draft
    /// is workspace-shaped. Used by text-level obligation queries.
    pub fn reference_text(&self) -> String {
        if let Some(reference) = &self.reference_solution {
            reference.clone()
        } else if let Some(ws) = &self.reference_workspace {
            ws.values().cloned().collect::<Vec<_>>().join("\n")
        } else {
            String::new()
        }
    }
}

/// The caller-visible draft: reference material stripped at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalProblemDraft {
    pub id: String,
    pub title: String,
    pub description: String,
    pub language: Language,
    pub difficulty: Difficulty,
    pub topic_tag: String,
    pub constraints: String,
    pub starter_code: String,
    pub test_suite: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<BTreeMap<String, String>>,
    pub sample_inputs: Vec<String>,
    pub sample_outputs: Vec<String>,
}

impl From<GeneratedProblemDraft> for ExternalProblemDraft {
    fn from(draft: GeneratedProblemDraft) -> Self {
        Self {
            id: draft.id,
            title: draft.title,
            description: draft.description,
            language: draft.language,
            difficulty: draft.difficulty,
            topic_tag: draft.topic_tag,
            constraints: draft.constraints,
            starter_code: draft.starter_code,
            test_suite: draft.test_suite,
            workspace: draft.workspace,
            sample_inputs: draft.sample_inputs,
            sample_outputs: draft.sample_outputs,
        }
    }
}

/// Record of a mechanical rewrite applied to a draft before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteRecord {
    pub id: String,
    pub applied: bool,
    pub detail: String,
}

impl RewriteRecord {
    pub fn applied(id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            applied: true,
            detail: detail.into(),
        }
    }
}

/// Outcome of one obligation evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObligationResult {
    pub id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ObligationResult {
    pub fn ok(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ok: true,
            message: None,
        }
    }
}

/// A soft-fallback decision recorded by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftFallback {
    pub slot_index: usize,
    pub from: Difficulty,
    pub to: Difficulty,
}

/// Per-run context: correlation ids plus the injected randomness source.
///
/// When seeded, every id is derived from `blake3(seed, counter)`, so a run
/// with identical collaborator outputs is byte-identical.
#[derive(Debug)]
pub struct RunContext {
    pub run_id: String,
    /// Opaque activity id handed in by the caller; echoed in
    /// `generation_completed`.
    pub activity_id: String,
    seed: Option<u64>,
    counter: AtomicU64,
}

impl RunContext {
    /// Context with OS randomness for ids.
    pub fn new(activity_id: impl Into<String>) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            activity_id: activity_id.into(),
            seed: None,
            counter: AtomicU64::new(0),
        }
    }

    /// Fully deterministic context for tests and reproduction.
    pub fn seeded(activity_id: impl Into<String>, seed: u64) -> Self {
        let ctx = Self {
            run_id: String::new(),
            activity_id: activity_id.into(),
            seed: Some(seed),
            counter: AtomicU64::new(0),
        };
        let run_id = ctx.next_id();
        Self { run_id, ..ctx }
    }

    /// Next unique id. Uuid-shaped in both modes.
    pub fn next_id(&self) -> String {
        match self.seed {
            None => uuid::Uuid::new_v4().to_string(),
            Some(seed) => {
                let n = self.counter.fetch_add(1, Ordering::Relaxed);
                let mut hasher = blake3::Hasher::new();
                hasher.update(&seed.to_le_bytes());
                hasher.update(&n.to_le_bytes());
                let digest = hasher.finalize();
                let mut bytes = [0u8; 16];
                bytes.copy_from_slice(&digest.as_bytes()[..16]);
                uuid::Builder::from_random_bytes(bytes)
                    .into_uuid()
                    .to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_spec() -> ActivitySpec {
        ActivitySpec {
            language: Language::Python,
            problem_count: 2,
            difficulty_plan: vec![DifficultyBand {
                difficulty: Difficulty::Easy,
                count: 2,
            }],
            topic_tags: vec!["strings".to_string()],
            problem_style: ProblemStyle::Stdout,
            constraints: "No external libraries.".to_string(),
            test_case_count: 8,
            explicit_hard_requested: false,
            focus_concepts: None,
        }
    }

    #[test]
    fn spec_validation_accepts_valid() {
        assert!(valid_spec().validate().is_ok());
    }

    #[test]
    fn spec_validation_rejects_count_mismatch() {
        let mut spec = valid_spec();
        spec.problem_count = 3;
        assert!(matches!(
            spec.validate(),
            Err(SpecError::PlanCountMismatch { .. })
        ));
    }

    #[test]
    fn spec_validation_rejects_out_of_range_count() {
        let mut spec = valid_spec();
        spec.problem_count = 8;
        spec.difficulty_plan[0].count = 8;
        assert!(matches!(
            spec.validate(),
            Err(SpecError::ProblemCountOutOfRange(8))
        ));
    }

    #[test]
    fn spec_roundtrips_through_json() {
        let spec = valid_spec();
        let json = serde_json::to_string(&spec).unwrap();
        let back: ActivitySpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back.problem_count, spec.problem_count);
        assert_eq!(back.language, Language::Python);
    }

    #[test]
    fn seeded_context_is_reproducible() {
        let a = RunContext::seeded("act", 42);
        let b = RunContext::seeded("act", 42);
        assert_eq!(a.run_id, b.run_id);
        assert_eq!(a.next_id(), b.next_id());
        assert_eq!(a.next_id(), b.next_id());
    }

    #[test]
    fn seeded_context_ids_differ_between_calls() {
        let ctx = RunContext::seeded("act", 7);
        assert_ne!(ctx.next_id(), ctx.next_id());
    }

    #[test]
    fn external_draft_strips_reference_material() {
        let draft = GeneratedProblemDraft {
            id: "p1".into(),
            title: "t".into(),
            description: "d".into(),
            language: Language::Java,
            difficulty: Difficulty::Easy,
            topic_tag: "strings".into(),
            constraints: "c".into(),
            starter_code: "class A {}".into(),
            test_suite: "class ATest {}".into(),
            reference_solution: Some("secret".into()),
            reference_workspace: None,
            workspace: None,
            sample_inputs: vec!["1".into()],
            sample_outputs: vec!["1".into()],
        };
        let external = ExternalProblemDraft::from(draft);
        let json = serde_json::to_string(&external).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("reference_solution"));
    }
}
