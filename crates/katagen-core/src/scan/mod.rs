//! Language-aware lexical scanning without a real parser.
//!
//! One forward pass classifies every byte as code, comment, string, or
//! char-literal content. Queries then run over a *masked* copy of the
//! source (same length, same line structure, with comment and literal
//! contents blanked), so position-based checks can never be fooled by a
//! keyword inside a string or a commented-out declaration.
//!
//! Scanners never fail: malformed input yields empty results and the
//! upstream validators decide whether the absence is itself a violation.

pub mod cpp;
pub mod java;
pub mod python;

/// Classification of one byte of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CharClass {
    /// Structural source text, including string/char delimiter quotes.
    Code,
    LineComment,
    BlockComment,
    /// Contents of a string literal, delimiters excluded.
    Str,
    /// Contents of a char literal, delimiters excluded.
    Char,
}

/// Classify a C-family source (Java, C++): `//`, `/* */`, `"…"`, `'…'`
/// with backslash escapes. Strings are terminated at an unescaped closing
/// quote or, tolerantly, at end of line.
pub(crate) fn c_family_classes(source: &str) -> Vec<CharClass> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mode {
        Code,
        Line,
        Block,
        Str,
        Char,
    }

    let bytes = source.as_bytes();
    let mut classes = vec![CharClass::Code; bytes.len()];
    let mut mode = Mode::Code;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match mode {
            Mode::Code => match b {
                b'/' if bytes.get(i + 1) == Some(&b'/') => {
                    classes[i] = CharClass::LineComment;
                    classes[i + 1] = CharClass::LineComment;
                    i += 2;
                    mode = Mode::Line;
                    continue;
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    classes[i] = CharClass::BlockComment;
                    classes[i + 1] = CharClass::BlockComment;
                    i += 2;
                    mode = Mode::Block;
                    continue;
                }
                b'"' => mode = Mode::Str,
                b'\'' => mode = Mode::Char,
                _ => {}
            },
            Mode::Line => {
                if b == b'\n' {
                    mode = Mode::Code;
                } else {
                    classes[i] = CharClass::LineComment;
                }
            }
            Mode::Block => {
                if b == b'*' && bytes.get(i + 1) == Some(&b'/') {
                    classes[i] = CharClass::BlockComment;
                    classes[i + 1] = CharClass::BlockComment;
                    i += 2;
                    mode = Mode::Code;
                    continue;
                }
                if b != b'\n' {
                    classes[i] = CharClass::BlockComment;
                }
            }
            Mode::Str => match b {
                b'\\' if i + 1 < bytes.len() => {
                    classes[i] = CharClass::Str;
                    classes[i + 1] = CharClass::Str;
                    i += 2;
                    continue;
                }
                b'"' => mode = Mode::Code,
                b'\n' => mode = Mode::Code,
                _ => classes[i] = CharClass::Str,
            },
            Mode::Char => match b {
                b'\\' if i + 1 < bytes.len() => {
                    classes[i] = CharClass::Char;
                    classes[i + 1] = CharClass::Char;
                    i += 2;
                    continue;
                }
                b'\'' => mode = Mode::Code,
                b'\n' => mode = Mode::Code,
                _ => classes[i] = CharClass::Char,
            },
        }
        i += 1;
    }
    classes
}

/// Classify Python source: `#` comments, `'…'`/`"…"` strings and their
/// triple-quoted forms, backslash escapes.
pub(crate) fn python_classes(source: &str) -> Vec<CharClass> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mode {
        Code,
        Comment,
        /// (quote byte, triple)
        Str(u8, bool),
    }

    let bytes = source.as_bytes();
    let mut classes = vec![CharClass::Code; bytes.len()];
    let mut mode = Mode::Code;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match mode {
            Mode::Code => match b {
                b'#' => {
                    classes[i] = CharClass::LineComment;
                    mode = Mode::Comment;
                }
                b'"' | b'\'' => {
                    let triple =
                        bytes.get(i + 1) == Some(&b) && bytes.get(i + 2) == Some(&b);
                    if triple {
                        i += 3;
                        mode = Mode::Str(b, true);
                        continue;
                    }
                    mode = Mode::Str(b, false);
                }
                _ => {}
            },
            Mode::Comment => {
                if b == b'\n' {
                    mode = Mode::Code;
                } else {
                    classes[i] = CharClass::LineComment;
                }
            }
            Mode::Str(quote, triple) => {
                if b == b'\\' && i + 1 < bytes.len() {
                    classes[i] = CharClass::Str;
                    classes[i + 1] = CharClass::Str;
                    i += 2;
                    continue;
                }
                if triple {
                    if b == quote
                        && bytes.get(i + 1) == Some(&quote)
                        && bytes.get(i + 2) == Some(&quote)
                    {
                        i += 3;
                        mode = Mode::Code;
                        continue;
                    }
                    if b != b'\n' {
                        classes[i] = CharClass::Str;
                    }
                } else if b == quote || b == b'\n' {
                    mode = Mode::Code;
                } else {
                    classes[i] = CharClass::Str;
                }
            }
        }
        i += 1;
    }
    classes
}

/// Produce the masked copy: non-code bytes become spaces, newlines are
/// preserved so line anchors keep working. Same byte length as the input.
pub(crate) fn mask_with(source: &str, classes: &[CharClass]) -> String {
    let mut out = Vec::with_capacity(source.len());
    for (i, &b) in source.as_bytes().iter().enumerate() {
        if classes[i] == CharClass::Code || b == b'\n' {
            out.push(b);
        } else {
            out.push(b' ');
        }
    }
    // Only whole multi-byte sequences are ever replaced, so this stays
    // valid UTF-8.
    String::from_utf8(out).unwrap_or_else(|e| {
        String::from_utf8_lossy(e.as_bytes()).into_owned()
    })
}

/// Masked copy of a C-family source.
pub fn mask_c_family(source: &str) -> String {
    mask_with(source, &c_family_classes(source))
}

/// Masked copy of a Python source.
pub fn mask_python(source: &str) -> String {
    mask_with(source, &python_classes(source))
}

/// Byte spans (start inclusive, end exclusive) of string literal contents,
/// delimiters excluded. Empty literals produce no span.
pub(crate) fn string_spans(classes: &[CharClass]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    for (i, &class) in classes.iter().enumerate() {
        match (class, start) {
            (CharClass::Str, None) => start = Some(i),
            (CharClass::Str, Some(_)) => {}
            (_, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, classes.len()));
    }
    spans
}

/// Brace depth tracking over a masked source: returns the depth at each
/// byte index (depth *before* consuming the byte).
pub(crate) fn brace_depths(masked: &str) -> Vec<i32> {
    let mut depths = Vec::with_capacity(masked.len());
    let mut depth = 0i32;
    for &b in masked.as_bytes() {
        depths.push(depth);
        match b {
            b'{' => depth += 1,
            b'}' => depth = (depth - 1).max(0),
            _ => {}
        }
    }
    depths
}
