//! Test-suite shape validation and the one-shot LLM repairer.

pub mod repair;
pub mod validator;

pub use repair::TestSuiteRepairer;
pub use validator::{validate_test_suite, TestSuiteIssue};
