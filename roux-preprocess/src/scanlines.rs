//! Line segmentation with cross-line comment state.
//!
//! The preprocessor passes are line-oriented but must never match inside
//! string/character literals or comments, including block comments that
//! started on an earlier line. `LineScanner` carries that state across
//! lines and splits each line into typed segments.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Code,
    Str,
    Char,
    Comment,
}

/// A byte range of one line. `Str`/`Char` segments include their quotes.
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub kind: SegmentKind,
}

/// Splits lines into code/literal/comment segments, carrying block-comment
/// state from line to line. Feed every line in order, even lines a pass
/// does not rewrite.
#[derive(Default)]
pub struct LineScanner {
    in_block_comment: bool,
}

impl LineScanner {
    pub fn new() -> Self {
        LineScanner::default()
    }

    pub fn segments(&mut self, line: &str) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut kind = if self.in_block_comment {
            SegmentKind::Comment
        } else {
            SegmentKind::Code
        };
        let mut start = 0;
        let mut escape = false;
        let mut prev: Option<char> = None;
        let mut flush = |segments: &mut Vec<Segment>, start: &mut usize, end: usize, kind| {
            if end > *start {
                segments.push(Segment {
                    start: *start,
                    end,
                    kind,
                });
            }
            *start = end;
        };

        for (idx, ch) in line.char_indices() {
            let ch_end = idx + ch.len_utf8();
            match kind {
                SegmentKind::Code => match ch {
                    '"' => {
                        flush(&mut segments, &mut start, idx, SegmentKind::Code);
                        kind = SegmentKind::Str;
                        prev = None;
                    }
                    '\'' => {
                        flush(&mut segments, &mut start, idx, SegmentKind::Code);
                        kind = SegmentKind::Char;
                        prev = None;
                    }
                    '/' if prev == Some('/') => {
                        // line comment runs to end of line
                        flush(&mut segments, &mut start, idx - 1, SegmentKind::Code);
                        segments.push(Segment {
                            start: idx - 1,
                            end: line.len(),
                            kind: SegmentKind::Comment,
                        });
                        return segments;
                    }
                    '*' if prev == Some('/') => {
                        flush(&mut segments, &mut start, idx - 1, SegmentKind::Code);
                        kind = SegmentKind::Comment;
                        self.in_block_comment = true;
                        prev = None;
                        continue;
                    }
                    _ => prev = Some(ch),
                },
                SegmentKind::Str => {
                    if escape {
                        escape = false;
                    } else if ch == '\\' {
                        escape = true;
                    } else if ch == '"' {
                        flush(&mut segments, &mut start, ch_end, SegmentKind::Str);
                        kind = SegmentKind::Code;
                        prev = None;
                    }
                }
                SegmentKind::Char => {
                    if escape {
                        escape = false;
                    } else if ch == '\\' {
                        escape = true;
                    } else if ch == '\'' {
                        flush(&mut segments, &mut start, ch_end, SegmentKind::Char);
                        kind = SegmentKind::Code;
                        prev = None;
                    }
                }
                SegmentKind::Comment => {
                    if ch == '/' && prev == Some('*') {
                        flush(&mut segments, &mut start, ch_end, SegmentKind::Comment);
                        kind = SegmentKind::Code;
                        self.in_block_comment = false;
                        prev = None;
                        continue;
                    }
                    prev = Some(ch);
                }
            }
        }
        flush(&mut segments, &mut start, line.len(), kind);
        // an unterminated string/char literal falls out of scope at EOL
        segments
    }
}

/// Byte offsets of standalone occurrences of `word` inside code segments.
pub fn find_words(line: &str, segments: &[Segment], word: &str) -> Vec<usize> {
    let mut hits = Vec::new();
    for seg in segments {
        if seg.kind != SegmentKind::Code {
            continue;
        }
        let code = &line[seg.start..seg.end];
        let mut from = 0;
        while let Some(rel) = code[from..].find(word) {
            let at = from + rel;
            let before_ok = at == 0
                || !code[..at]
                    .chars()
                    .last()
                    .is_some_and(|c| c.is_alphanumeric() || c == '_');
            let after_ok = !code[at + word.len()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric() || c == '_');
            if before_ok && after_ok {
                hits.push(seg.start + at);
            }
            from = at + word.len();
        }
    }
    hits
}

/// True when `byte_idx` lies inside a code segment.
pub fn in_code(segments: &[Segment], byte_idx: usize) -> bool {
    segments
        .iter()
        .any(|s| s.kind == SegmentKind::Code && byte_idx >= s.start && byte_idx < s.end)
}

/// 1-based character column of a byte offset within `line`.
pub fn char_col(line: &str, byte_idx: usize) -> usize {
    line[..byte_idx.min(line.len())].chars().count() + 1
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn kinds(scanner: &mut LineScanner, line: &str) -> Vec<(SegmentKind, String)> {
        scanner
            .segments(line)
            .into_iter()
            .map(|s| (s.kind, line[s.start..s.end].to_string()))
            .collect()
    }

    #[test]
    fn test_plain_code_is_one_segment() {
        let mut sc = LineScanner::new();
        let segs = kinds(&mut sc, "x := f(1)");
        assert_eq!(segs, vec![(SegmentKind::Code, "x := f(1)".to_string())]);
    }

    #[test]
    fn test_string_segment() {
        let mut sc = LineScanner::new();
        let segs = kinds(&mut sc, r#"x := "fn inside""#);
        assert_eq!(segs[0].0, SegmentKind::Code);
        assert_eq!(segs[1], (SegmentKind::Str, r#""fn inside""#.to_string()));
    }

    #[test]
    fn test_line_comment_runs_to_eol() {
        let mut sc = LineScanner::new();
        let segs = kinds(&mut sc, "x := 1 // let y = 2");
        assert_eq!(segs[0], (SegmentKind::Code, "x := 1 ".to_string()));
        assert_eq!(segs[1].0, SegmentKind::Comment);
    }

    #[test]
    fn test_block_comment_spans_lines() {
        let mut sc = LineScanner::new();
        let _ = sc.segments("x := 1 /* start");
        let segs = kinds(&mut sc, "still comment fn here");
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].0, SegmentKind::Comment);
        let segs = kinds(&mut sc, "end */ let x = 2");
        assert_eq!(segs.last().unwrap().0, SegmentKind::Code);
        assert!(segs.last().unwrap().1.contains("let x = 2"));
    }

    #[test]
    fn test_find_words_boundaries() {
        let mut sc = LineScanner::new();
        let line = "fn lets fn2 let";
        let segs = sc.segments(line);
        assert_eq!(find_words(line, &segs, "fn"), vec![0]);
        assert_eq!(find_words(line, &segs, "let"), vec![12]);
    }

    #[test]
    fn test_find_words_skips_string() {
        let mut sc = LineScanner::new();
        let line = r#"fn f() { s := "fn" }"#;
        let segs = sc.segments(line);
        assert_eq!(find_words(line, &segs, "fn"), vec![0]);
    }

    #[test]
    fn test_escaped_quote_stays_in_string() {
        let mut sc = LineScanner::new();
        let line = r#"s := "a\"b" + x"#;
        let segs = sc.segments(line);
        let code: Vec<_> = segs
            .iter()
            .filter(|s| s.kind == SegmentKind::Code)
            .map(|s| &line[s.start..s.end])
            .collect();
        assert_eq!(code, vec!["s := ", " + x"]);
    }
}
