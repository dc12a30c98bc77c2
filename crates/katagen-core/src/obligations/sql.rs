//! SQL obligations: the test suite is a JSON document with `schema_sql`
//! and an ordered list of expected-row cases; shape is validated
//! structurally.

use serde::Deserialize;

use super::{ids, ObligationLog, ObligationViolation};
use crate::types::{GeneratedProblemDraft, ObligationResult, ProblemSlot};

/// The SQL test document shape.
#[derive(Debug, Deserialize)]
pub struct SqlTestDocument {
    pub schema_sql: String,
    pub cases: Vec<SqlTestCase>,
}

/// One ordered expected-row case.
#[derive(Debug, Deserialize)]
pub struct SqlTestCase {
    pub name: String,
    /// Optional per-case query; when absent the judged query is the
    /// submission itself.
    #[serde(default)]
    pub query: Option<String>,
    pub expected_rows: Vec<Vec<serde_json::Value>>,
}

pub fn check(
    draft: &GeneratedProblemDraft,
    slot: &ProblemSlot,
) -> Result<Vec<ObligationResult>, ObligationViolation> {
    let mut log = ObligationLog::new();

    let reference = draft.reference_text();
    log.require(
        ids::SQL_REFERENCE_NON_EMPTY,
        !reference.trim().is_empty(),
        || "reference SQL must be non-empty".to_string(),
    )?;

    let parsed: Result<SqlTestDocument, _> = serde_json::from_str(&draft.test_suite);
    let document = match parsed {
        Ok(document) => document,
        Err(e) => {
            return Err(ObligationViolation::new(
                ids::SQL_TEST_DOCUMENT_SHAPE,
                format!("test suite is not a valid SQL test document: {e}"),
            ));
        }
    };

    let expected_names: Vec<String> = (1..=slot.test_case_count)
        .map(|n| format!("test_case_{n}"))
        .collect();
    let names: Vec<&str> = document.cases.iter().map(|c| c.name.as_str()).collect();
    let shape_ok = !document.schema_sql.trim().is_empty()
        && names == expected_names.iter().map(String::as_str).collect::<Vec<_>>();
    log.require(ids::SQL_TEST_DOCUMENT_SHAPE, shape_ok, || {
        format!(
            "SQL test document needs a non-empty schema_sql and {} ordered cases test_case_1..test_case_{}",
            slot.test_case_count, slot.test_case_count
        )
    })?;

    Ok(log.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Difficulty, Language, ProblemStyle};

    fn slot() -> ProblemSlot {
        ProblemSlot {
            index: 0,
            language: Language::Sql,
            difficulty: Difficulty::Easy,
            topics: vec!["joins".to_string()],
            problem_style: ProblemStyle::Return,
            constraints: "c".to_string(),
            test_case_count: 8,
        }
    }

    fn draft(reference: &str, tests: &str) -> GeneratedProblemDraft {
        GeneratedProblemDraft {
            id: "p".into(),
            title: "t".into(),
            description: "d".into(),
            language: Language::Sql,
            difficulty: Difficulty::Easy,
            topic_tag: "joins".into(),
            constraints: "c".into(),
            starter_code: "-- write your query here".to_string(),
            test_suite: tests.to_string(),
            reference_solution: Some(reference.to_string()),
            reference_workspace: None,
            workspace: None,
            sample_inputs: vec!["".into()],
            sample_outputs: vec!["1".into()],
        }
    }

    fn valid_document() -> String {
        let cases: Vec<serde_json::Value> = (1..=8)
            .map(|n| {
                serde_json::json!({
                    "name": format!("test_case_{n}"),
                    "expected_rows": [[n]]
                })
            })
            .collect();
        serde_json::json!({
            "schema_sql": "CREATE TABLE t (id INTEGER);",
            "cases": cases
        })
        .to_string()
    }

    #[test]
    fn accepts_valid_document() {
        let d = draft("SELECT id FROM t ORDER BY id;", &valid_document());
        assert!(check(&d, &slot()).is_ok());
    }

    #[test]
    fn rejects_non_json_suite() {
        let d = draft("SELECT 1;", "not json");
        let err = check(&d, &slot()).unwrap_err();
        assert_eq!(err.id, ids::SQL_TEST_DOCUMENT_SHAPE);
    }

    #[test]
    fn rejects_wrong_case_count() {
        let document = serde_json::json!({
            "schema_sql": "CREATE TABLE t (id INTEGER);",
            "cases": [{"name": "test_case_1", "expected_rows": [[1]]}]
        })
        .to_string();
        let d = draft("SELECT 1;", &document);
        let err = check(&d, &slot()).unwrap_err();
        assert_eq!(err.id, ids::SQL_TEST_DOCUMENT_SHAPE);
    }

    #[test]
    fn rejects_empty_reference() {
        let d = draft("   ", &valid_document());
        let err = check(&d, &slot()).unwrap_err();
        assert_eq!(err.id, ids::SQL_REFERENCE_NON_EMPTY);
    }
}
