//! Colon-style type-annotation stripping.
//!
//! Rewrites `func f(a: int, b: string)` to `func f(a int, b string)` and
//! `var x: Config = load()` to `var x Config = load()`. Only these two
//! declaration contexts are touched; colons in composite literals, slice
//! expressions and `:=` never qualify.

use crate::scanlines::{LineScanner, Segment, SegmentKind, char_col};
use roux_srcmap::{Delta, StageMap};
use roux_shared::{Diagnostic, Span};

pub struct PassOutput {
    pub text: String,
    pub stage: StageMap,
    pub warnings: Vec<Diagnostic>,
}

pub fn annotations(input: &str) -> PassOutput {
    let mut scanner = LineScanner::new();
    let mut stage = StageMap::new();
    let mut warnings = Vec::new();
    let mut out = String::with_capacity(input.len());

    for (i, line) in input.lines().enumerate() {
        let line_no = i + 1;
        let segments = scanner.segments(line);
        let rebuilt = match first_code_word(line, &segments) {
            Some("func") => strip_param_colons(line, &segments, line_no, &mut stage, &mut warnings),
            Some("var") => strip_var_colon(line, &segments, line_no, &mut stage),
            _ => line.to_string(),
        };
        out.push_str(&rebuilt);
        out.push('\n');
    }

    PassOutput {
        text: out,
        stage,
        warnings,
    }
}

fn first_code_word<'a>(line: &'a str, segments: &[Segment]) -> Option<&'a str> {
    let seg = segments.iter().find(|s| s.kind == SegmentKind::Code)?;
    let code = line[seg.start..seg.end].trim_start();
    let end = code
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(code.len());
    Some(&code[..end])
}

/// Remove annotation colons inside the parameter list of a single-line
/// `func` header. A colon qualifies when it directly follows an
/// identifier character and is not part of `:=`.
fn strip_param_colons(
    line: &str,
    segments: &[Segment],
    line_no: usize,
    stage: &mut StageMap,
    warnings: &mut Vec<Diagnostic>,
) -> String {
    let Some(open) = find_in_code(line, segments, |c| c == '(') else {
        return line.to_string();
    };
    let Some(mut close) = matching_paren(line, segments, open) else {
        warnings.push(
            Diagnostic::warning(
                "multi-line function header: type annotations inside it are not stripped",
            )
            .with_span(Span::point(line_no, char_col(line, open))),
        );
        return line.to_string();
    };
    // `func (recv) Name(params)` — the first group was the receiver, so
    // extend the range over the parameter group as well
    let after = line[close + 1..].trim_start();
    if after.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_') {
        if let Some(rel) = after.find('(') {
            let open2 = close + 1 + (line[close + 1..].len() - after.len()) + rel;
            if let Some(close2) = matching_paren(line, segments, open2) {
                close = close2;
            }
        }
    }
    rewrite_colons(line, segments, open + 1, close, line_no, stage)
}

/// Remove the annotation colon of `var NAME: TYPE …`, if present.
fn strip_var_colon(
    line: &str,
    segments: &[Segment],
    line_no: usize,
    stage: &mut StageMap,
) -> String {
    // the colon must be the first punctuation after the bound name
    let Some(var_at) = find_in_code_str(line, segments, "var ") else {
        return line.to_string();
    };
    let after = &line[var_at + 4..];
    let name_len: usize = after
        .trim_start()
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .map(char::len_utf8)
        .sum();
    let name_start = var_at + 4 + (after.len() - after.trim_start().len());
    let colon_at = name_start + name_len;
    if line[colon_at..].starts_with(':') && !line[colon_at..].starts_with(":=") {
        rewrite_colons(line, segments, colon_at, colon_at + 1, line_no, stage)
    } else {
        line.to_string()
    }
}

/// Rewrite qualifying colons in `line[from..to]`: drop the colon when
/// whitespace follows, widen it to a space otherwise.
fn rewrite_colons(
    line: &str,
    segments: &[Segment],
    from: usize,
    to: usize,
    line_no: usize,
    stage: &mut StageMap,
) -> String {
    let mut rebuilt = String::with_capacity(line.len());
    rebuilt.push_str(&line[..from]);
    let mut cursor = from;
    for (idx, ch) in line[from..to].char_indices() {
        let at = from + idx;
        if ch != ':' || !in_code(segments, at) {
            continue;
        }
        let prev_is_ident = line[..at]
            .chars()
            .last()
            .is_some_and(|c| c.is_alphanumeric() || c == '_');
        let next = line[at + 1..].chars().next();
        if !prev_is_ident || next == Some('=') {
            continue;
        }
        rebuilt.push_str(&line[cursor..at]);
        if next.is_some_and(|c| c.is_whitespace()) {
            // drop the colon entirely
            stage.push_delta(Delta::new(line_no, char_col(line, at) + 1, 0, -1));
        } else {
            rebuilt.push(' ');
        }
        cursor = at + 1;
    }
    rebuilt.push_str(&line[cursor..]);
    rebuilt
}

fn in_code(segments: &[Segment], at: usize) -> bool {
    crate::scanlines::in_code(segments, at)
}

fn find_in_code(line: &str, segments: &[Segment], pred: impl Fn(char) -> bool) -> Option<usize> {
    for seg in segments.iter().filter(|s| s.kind == SegmentKind::Code) {
        if let Some(rel) = line[seg.start..seg.end].find(&pred) {
            return Some(seg.start + rel);
        }
    }
    None
}

fn find_in_code_str(line: &str, segments: &[Segment], needle: &str) -> Option<usize> {
    for seg in segments.iter().filter(|s| s.kind == SegmentKind::Code) {
        if let Some(rel) = line[seg.start..seg.end].find(needle) {
            return Some(seg.start + rel);
        }
    }
    None
}

/// Match the closing paren for `open` within this line's code segments.
fn matching_paren(line: &str, segments: &[Segment], open: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (idx, ch) in line.char_indices().skip_while(|&(i, _)| i < open) {
        if !in_code(segments, idx) {
            continue;
        }
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_param_colons_stripped() {
        let out = annotations("func Load(path: string, depth: int) (Config, error) {\n}\n");
        assert!(
            out.text
                .starts_with("func Load(path string, depth int) (Config, error) {")
        );
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_tight_colon_becomes_space() {
        let out = annotations("func F(a:int) {\n}\n");
        assert!(out.text.starts_with("func F(a int) {"));
    }

    #[test]
    fn test_var_annotation_stripped() {
        let out = annotations("\tvar cfg: Config = load()\n");
        assert_eq!(out.text, "\tvar cfg Config = load()\n");
    }

    #[test]
    fn test_short_assign_untouched() {
        let out = annotations("\tx := compute()\n");
        assert_eq!(out.text, "\tx := compute()\n");
    }

    #[test]
    fn test_composite_literal_colon_untouched() {
        let out = annotations("\tvar m = map[string]int{\"a\": 1}\n");
        assert_eq!(out.text, "\tvar m = map[string]int{\"a\": 1}\n");
    }

    #[test]
    fn test_colon_in_string_untouched() {
        let out = annotations("func F(a: int) { log(\"x: y\") }\n");
        assert!(out.text.contains("a int"));
        assert!(out.text.contains("\"x: y\""));
    }

    #[test]
    fn test_multiline_header_warns() {
        let out = annotations("func F(\n\ta: int,\n) {\n}\n");
        assert_eq!(out.warnings.len(), 1);
        // text untouched for the unparsed header line
        assert!(out.text.starts_with("func F(\n"));
    }

    #[test]
    fn test_nested_func_type_params() {
        let out = annotations("func Apply(f: func(int) int, x: int) int {\n}\n");
        assert!(out.text.starts_with("func Apply(f func(int) int, x int) int {"));
    }
}
