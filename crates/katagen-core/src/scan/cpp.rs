//! C++ queries over masked source: `solve` detection, stdin/stdout usage,
//! and extraction of the first top-level `solve(...)` signature.

use lazy_static::lazy_static;
use regex::Regex;

use super::{brace_depths, mask_c_family};

lazy_static! {
    static ref SOLVE_RE: Regex = Regex::new(r"\bsolve\s*\(").expect("static regex");
    static ref STDOUT_RE: Regex =
        Regex::new(r"\bcout\b|\bcerr\b|\bprintf\s*\(").expect("static regex");
    static ref STDIN_RE: Regex =
        Regex::new(r"\bcin\b|\bscanf\s*\(|\bgetline\s*\(").expect("static regex");
    static ref SOLVE_DEF_RE: Regex = Regex::new(
        r"(?m)^[ \t]*((?:[A-Za-z_][\w:<>]*[ \t&*]+)+)solve[ \t]*\(([^)]*)\)[ \t\r\n]*\{"
    )
    .expect("static regex");
}

/// A `solve` definition's signature: enough to synthesize a starter
/// scaffold without leaking the reference body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveSignature {
    pub return_type: String,
    /// Parameter list text, parentheses excluded.
    pub params: String,
}

impl SolveSignature {
    /// Render the declaration line, `ret solve(params)`.
    pub fn declaration(&self) -> String {
        format!("{} solve({})", self.return_type, self.params)
    }
}

/// One scanned C++ source. Masking happens once at construction.
#[derive(Debug)]
pub struct CppScan {
    masked: String,
    depths: Vec<i32>,
}

impl CppScan {
    pub fn new(source: &str) -> Self {
        let masked = mask_c_family(source);
        let depths = brace_depths(&masked);
        Self { masked, depths }
    }

    pub fn masked(&self) -> &str {
        &self.masked
    }

    /// Any mention of `solve(` in code.
    pub fn mentions_solve(&self) -> bool {
        SOLVE_RE.is_match(&self.masked)
    }

    pub fn writes_stdout(&self) -> bool {
        STDOUT_RE.is_match(&self.masked)
    }

    pub fn reads_stdin(&self) -> bool {
        STDIN_RE.is_match(&self.masked)
    }

    /// The first top-level `solve(...)` definition's signature, if any.
    pub fn solve_signature(&self) -> Option<SolveSignature> {
        for caps in SOLVE_DEF_RE.captures_iter(&self.masked) {
            let whole = caps.get(0).expect("group 0");
            if self.depths.get(whole.start()).copied().unwrap_or(0) != 0 {
                continue;
            }
            let return_type = caps
                .get(1)
                .expect("group 1")
                .as_str()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            let params = caps.get(2).expect("group 2").as_str().trim().to_string();
            return Some(SolveSignature {
                return_type,
                params,
            });
        }
        None
    }
}
