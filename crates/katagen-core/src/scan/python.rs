//! Python queries over masked source: stdin/stdout usage, disallowed
//! imports, `solve` definition, test function enumeration.

use lazy_static::lazy_static;
use regex::Regex;

use super::mask_python;

/// Modules a generated Python problem may never import.
pub const DISALLOWED_MODULES: &[&str] = &[
    "os",
    "pathlib",
    "shutil",
    "subprocess",
    "socket",
    "requests",
    "urllib",
    "http",
    "ftplib",
    "asyncio",
    "multiprocessing",
];

lazy_static! {
    static ref IMPORT_RE: Regex =
        Regex::new(r"(?m)^\s*(?:import|from)\s+([A-Za-z_][\w.]*)").expect("static regex");
    static ref EVAL_EXEC_RE: Regex = Regex::new(r"\b(?:eval|exec)\s*\(").expect("static regex");
    static ref SOLVE_RE: Regex = Regex::new(r"(?m)^\s*def\s+solve\s*\(").expect("static regex");
    static ref STDIN_RE: Regex =
        Regex::new(r"\binput\s*\(|sys\s*\.\s*stdin|open\s*\(\s*0\s*,").expect("static regex");
    static ref STDOUT_RE: Regex =
        Regex::new(r"\bprint\s*\(|sys\s*\.\s*stdout").expect("static regex");
    static ref TEST_FN_RE: Regex =
        Regex::new(r"(?m)^def\s+(test_case_\d+)\s*\(([^)]*)\)").expect("static regex");
}

/// One scanned Python source. Masking happens once at construction.
#[derive(Debug)]
pub struct PythonScan {
    masked: String,
}

impl PythonScan {
    pub fn new(source: &str) -> Self {
        Self {
            masked: mask_python(source),
        }
    }

    pub fn masked(&self) -> &str {
        &self.masked
    }

    /// Whether the source reads stdin (`input(`, `sys.stdin`, `open(0,`).
    pub fn reads_stdin(&self) -> bool {
        STDIN_RE.is_match(&self.masked)
    }

    /// Whether the source writes stdout (`print(`, `sys.stdout`).
    pub fn writes_stdout(&self) -> bool {
        STDOUT_RE.is_match(&self.masked)
    }

    /// `eval(` or `exec(` anywhere in code.
    pub fn uses_eval_exec(&self) -> bool {
        EVAL_EXEC_RE.is_match(&self.masked)
    }

    /// Root modules imported that are on the disallowed list.
    pub fn disallowed_imports(&self) -> Vec<String> {
        let mut found = Vec::new();
        for caps in IMPORT_RE.captures_iter(&self.masked) {
            let module = caps.get(1).expect("group 1").as_str();
            let root = module.split('.').next().unwrap_or(module);
            if DISALLOWED_MODULES.contains(&root) && !found.iter().any(|f| f == root) {
                found.push(root.to_string());
            }
        }
        found
    }

    /// A top-level (or indented) `def solve(` definition.
    pub fn defines_solve(&self) -> bool {
        SOLVE_RE.is_match(&self.masked)
    }

    /// Module-level test functions named `test_case_N`, with their
    /// parameter lists, in source order.
    pub fn test_functions(&self) -> Vec<(String, String)> {
        TEST_FN_RE
            .captures_iter(&self.masked)
            .map(|caps| {
                (
                    caps.get(1).expect("group 1").as_str().to_string(),
                    caps.get(2).expect("group 2").as_str().trim().to_string(),
                )
            })
            .collect()
    }
}
