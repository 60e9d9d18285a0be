//! Surface keyword substitution: `fn` → `func`, `let` → `var`.
//!
//! Word-level, code-only replacement. `let` → `var` keeps line widths
//! unchanged; `fn` → `func` records a +2 column delta for everything to
//! its right.

use crate::scanlines::{LineScanner, char_col, find_words};
use roux_srcmap::{Delta, StageMap};

pub struct PassOutput {
    pub text: String,
    pub stage: StageMap,
}

pub fn keywords(input: &str) -> PassOutput {
    let mut scanner = LineScanner::new();
    let mut stage = StageMap::new();
    let mut out = String::with_capacity(input.len());

    for (i, line) in input.lines().enumerate() {
        let line_no = i + 1;
        let segments = scanner.segments(line);

        let mut edits: Vec<(usize, usize, &str)> = Vec::new();
        for at in find_words(line, &segments, "fn") {
            edits.push((at, 2, "func"));
        }
        for at in find_words(line, &segments, "let") {
            edits.push((at, 3, "var"));
        }
        edits.sort_by_key(|&(at, _, _)| at);

        let mut rebuilt = String::with_capacity(line.len() + edits.len() * 2);
        let mut cursor = 0;
        for &(at, old_len, replacement) in &edits {
            rebuilt.push_str(&line[cursor..at]);
            rebuilt.push_str(replacement);
            cursor = at + old_len;

            let grow = replacement.len() as isize - old_len as isize;
            if grow != 0 {
                stage.push_delta(Delta::new(
                    line_no,
                    char_col(line, at + old_len),
                    0,
                    grow,
                ));
            }
        }
        rebuilt.push_str(&line[cursor..]);
        out.push_str(&rebuilt);
        out.push('\n');
    }

    PassOutput { text: out, stage }
}
