//! Deterministic expansion of an `ActivitySpec` into ordered problem
//! slots: difficulties in easy < medium < hard order, topics assigned
//! round-robin, hard slots granted a secondary topic when a distinct one
//! exists.

use crate::error::{KatagenError, Result};
use crate::types::{ActivitySpec, Difficulty, ProblemSlot};

/// Expand a validated spec into its slot list.
pub fn plan_slots(spec: &ActivitySpec) -> Result<Vec<ProblemSlot>> {
    spec.validate()?;

    // Stable sort keeps insertion order within a difficulty.
    let mut bands = spec.difficulty_plan.clone();
    bands.sort_by_key(|b| b.difficulty);

    let mut difficulties = Vec::with_capacity(spec.problem_count as usize);
    for band in &bands {
        for _ in 0..band.count {
            difficulties.push(band.difficulty);
        }
    }

    let tags: &[String] = spec
        .focus_concepts
        .as_deref()
        .unwrap_or(&spec.topic_tags);

    let mut slots = Vec::with_capacity(difficulties.len());
    for (index, difficulty) in difficulties.into_iter().enumerate() {
        let primary = tags[index % tags.len()].clone();
        let mut topics = vec![primary.clone()];
        if difficulty == Difficulty::Hard && tags.len() >= 2 {
            if let Some(secondary) = next_distinct_tag(tags, index, &primary) {
                topics.push(secondary);
            }
        }
        slots.push(ProblemSlot {
            index,
            language: spec.language,
            difficulty,
            topics,
            problem_style: spec.problem_style,
            constraints: spec.constraints.clone(),
            test_case_count: spec.test_case_count,
        });
    }

    // Slot-list shape is an internal invariant; a mismatch is a bug.
    if slots.len() != spec.problem_count as usize {
        return Err(KatagenError::Internal(format!(
            "planner produced {} slots for problem_count {}",
            slots.len(),
            spec.problem_count
        )));
    }
    if slots.iter().any(|s| s.topics.is_empty() || s.topics.len() > 2) {
        return Err(KatagenError::Internal(
            "planner produced a slot with an invalid topic count".to_string(),
        ));
    }

    Ok(slots)
}

/// The next tag in round-robin order that differs from `primary`, or None
/// when only the primary remains.
fn next_distinct_tag(tags: &[String], index: usize, primary: &str) -> Option<String> {
    (1..tags.len())
        .map(|offset| &tags[(index + offset) % tags.len()])
        .find(|tag| tag.as_str() != primary)
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DifficultyBand, Language, ProblemStyle};

    fn spec(plan: Vec<DifficultyBand>, tags: Vec<&str>) -> ActivitySpec {
        let count = plan.iter().map(|b| b.count).sum();
        ActivitySpec {
            language: Language::Java,
            problem_count: count,
            difficulty_plan: plan,
            topic_tags: tags.into_iter().map(String::from).collect(),
            problem_style: ProblemStyle::Return,
            constraints: "Use Java 17.".to_string(),
            test_case_count: 8,
            explicit_hard_requested: false,
            focus_concepts: None,
        }
    }

    #[test]
    fn difficulties_follow_sorted_expansion() {
        let s = spec(
            vec![
                DifficultyBand { difficulty: Difficulty::Hard, count: 1 },
                DifficultyBand { difficulty: Difficulty::Easy, count: 2 },
                DifficultyBand { difficulty: Difficulty::Medium, count: 1 },
            ],
            vec!["a", "b"],
        );
        let slots = plan_slots(&s).unwrap();
        let difficulties: Vec<Difficulty> = slots.iter().map(|s| s.difficulty).collect();
        assert_eq!(
            difficulties,
            vec![
                Difficulty::Easy,
                Difficulty::Easy,
                Difficulty::Medium,
                Difficulty::Hard
            ]
        );
        assert_eq!(slots.len(), 4);
    }

    #[test]
    fn slot_count_and_constraints_match_spec() {
        let s = spec(
            vec![DifficultyBand { difficulty: Difficulty::Easy, count: 3 }],
            vec!["strings", "loops"],
        );
        let slots = plan_slots(&s).unwrap();
        assert_eq!(slots.len(), 3);
        for (i, slot) in slots.iter().enumerate() {
            assert_eq!(slot.index, i);
            assert_eq!(slot.constraints, s.constraints);
            assert_eq!(slot.test_case_count, 8);
        }
    }

    #[test]
    fn topics_round_robin() {
        let s = spec(
            vec![DifficultyBand { difficulty: Difficulty::Easy, count: 3 }],
            vec!["a", "b"],
        );
        let slots = plan_slots(&s).unwrap();
        assert_eq!(slots[0].topics, vec!["a"]);
        assert_eq!(slots[1].topics, vec!["b"]);
        assert_eq!(slots[2].topics, vec!["a"]);
    }

    #[test]
    fn hard_slots_get_secondary_topic() {
        let s = spec(
            vec![
                DifficultyBand { difficulty: Difficulty::Easy, count: 1 },
                DifficultyBand { difficulty: Difficulty::Hard, count: 1 },
            ],
            vec!["a", "b"],
        );
        let slots = plan_slots(&s).unwrap();
        assert_eq!(slots[0].topics, vec!["a"]);
        assert_eq!(slots[1].topics, vec!["b", "a"]);
    }

    #[test]
    fn hard_slot_with_single_tag_stays_single_topic() {
        let s = spec(
            vec![DifficultyBand { difficulty: Difficulty::Hard, count: 1 }],
            vec!["only"],
        );
        let slots = plan_slots(&s).unwrap();
        assert_eq!(slots[0].topics, vec!["only"]);
    }

    #[test]
    fn duplicate_tags_are_skipped_for_secondary() {
        let s = spec(
            vec![DifficultyBand { difficulty: Difficulty::Hard, count: 1 }],
            vec!["x", "x", "y"],
        );
        let slots = plan_slots(&s).unwrap();
        assert_eq!(slots[0].topics, vec!["x", "y"]);
    }

    #[test]
    fn focus_concepts_override_topic_tags() {
        let mut s = spec(
            vec![DifficultyBand { difficulty: Difficulty::Easy, count: 2 }],
            vec!["a", "b", "c"],
        );
        s.focus_concepts = Some(vec!["recursion".to_string()]);
        let slots = plan_slots(&s).unwrap();
        assert_eq!(slots[0].topics, vec!["recursion"]);
        assert_eq!(slots[1].topics, vec!["recursion"]);
    }

    #[test]
    fn invalid_spec_is_rejected() {
        let mut s = spec(
            vec![DifficultyBand { difficulty: Difficulty::Easy, count: 1 }],
            vec!["a"],
        );
        s.problem_count = 2;
        assert!(plan_slots(&s).is_err());
    }
}
