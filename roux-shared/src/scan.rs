//! Literal- and bracket-aware text scanning.
//!
//! Match arms are split out of raw source text, and arm bodies legally
//! contain commas inside string concatenation, nested calls and literal
//! collections. Every splitter here tracks paren/bracket/brace nesting
//! depth and in/out-of-literal state (both quote styles, escape
//! sequences, line and block comments) and only acts at depth zero in
//! code.

/// Character-level scan state over a text fragment.
#[derive(Default)]
struct ScanState {
    depth: i32,
    in_string: bool,
    in_char: bool,
    in_line_comment: bool,
    in_block_comment: bool,
    escape: bool,
    prev: Option<char>,
}

impl ScanState {
    /// Advance over `ch`; returns true when `ch` is code (outside any
    /// literal or comment). Depth is updated for code brackets.
    fn step(&mut self, ch: char) -> bool {
        if self.escape {
            self.escape = false;
            self.prev = Some(ch);
            return false;
        }
        if self.in_line_comment {
            if ch == '\n' {
                self.in_line_comment = false;
            }
            self.prev = Some(ch);
            return false;
        }
        if self.in_block_comment {
            if ch == '/' && self.prev == Some('*') {
                self.in_block_comment = false;
            }
            self.prev = Some(ch);
            return false;
        }
        if self.in_string {
            match ch {
                '\\' => self.escape = true,
                '"' => self.in_string = false,
                _ => {}
            }
            self.prev = Some(ch);
            return false;
        }
        if self.in_char {
            match ch {
                '\\' => self.escape = true,
                '\'' => self.in_char = false,
                _ => {}
            }
            self.prev = Some(ch);
            return false;
        }

        match ch {
            '"' => {
                self.in_string = true;
                self.prev = Some(ch);
                return false;
            }
            '\'' => {
                self.in_char = true;
                self.prev = Some(ch);
                return false;
            }
            '/' if self.prev == Some('/') => {
                self.in_line_comment = true;
                self.prev = Some(ch);
                return false;
            }
            '*' if self.prev == Some('/') => {
                self.in_block_comment = true;
                // the opening '*' must not also close the comment
                self.prev = None;
                return false;
            }
            '(' | '[' | '{' => self.depth += 1,
            ')' | ']' | '}' => self.depth -= 1,
            _ => {}
        }
        self.prev = Some(ch);
        true
    }
}

/// Split `text` on `sep` occurring at nesting depth zero outside any
/// literal or comment. Returns `(byte_offset, piece)` pairs; pieces keep
/// their surrounding whitespace. A trailing empty piece (trailing
/// separator) is dropped.
pub fn split_top_level(text: &str, sep: char) -> Vec<(usize, String)> {
    let mut state = ScanState::default();
    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        // A '/' may begin a comment with the next char; step handles it,
        // but the depth-0 check must happen on the separator itself.
        let is_code = state.step(ch);
        if is_code && ch == sep && state.depth == 0 {
            pieces.push((start, text[start..idx].to_string()));
            start = idx + ch.len_utf8();
        }
    }
    if text[start..].trim().is_empty() && !pieces.is_empty() {
        return pieces;
    }
    pieces.push((start, text[start..].to_string()));
    pieces
}

/// Byte offset of the first occurrence of `needle` at depth zero outside
/// literals and comments. `needle` must not itself contain quotes or
/// brackets.
pub fn find_top_level(text: &str, needle: &str) -> Option<usize> {
    let first = needle.chars().next()?;
    let mut state = ScanState::default();
    for (idx, ch) in text.char_indices() {
        let is_code = state.step(ch);
        if is_code && ch == first && state.depth == 0 && text[idx..].starts_with(needle) {
            return Some(idx);
        }
    }
    None
}

/// Given the byte offset of an opening brace in `text`, return the byte
/// offset of its matching closing brace, honoring literals and comments.
pub fn find_matching_brace(text: &str, open_idx: usize) -> Option<usize> {
    let mut state = ScanState::default();
    let mut depth_at_open = None;
    for (idx, ch) in text.char_indices() {
        let is_code = state.step(ch);
        if idx == open_idx {
            if !is_code || ch != '{' {
                return None;
            }
            depth_at_open = Some(state.depth);
            continue;
        }
        if let Some(open_depth) = depth_at_open {
            if is_code && ch == '}' && state.depth == open_depth - 1 {
                return Some(idx);
            }
        }
    }
    None
}

/// Net brace depth change over one line, counting only code braces.
pub fn net_brace_depth(line: &str) -> i32 {
    let mut state = ScanState::default();
    let before = state.depth;
    for ch in line.chars() {
        state.step(ch);
    }
    state.depth - before
}

/// True when the line's code (ignoring literals, comments and trailing
/// whitespace) ends with an opening brace.
pub fn ends_with_open_brace(line: &str) -> bool {
    let mut state = ScanState::default();
    let mut last_code = None;
    for ch in line.chars() {
        if state.step(ch) && !ch.is_whitespace() {
            last_code = Some(ch);
        }
    }
    last_code == Some('{')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn texts(pieces: Vec<(usize, String)>) -> Vec<String> {
        pieces.into_iter().map(|(_, t)| t.trim().to_string()).collect()
    }

    #[test]
    fn test_split_plain_commas() {
        let got = texts(split_top_level("a, b, c", ','));
        assert_eq!(got, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_ignores_comma_in_string() {
        let got = texts(split_top_level(r#"Ok(x) => "a, b", Err(_) => "c""#, ','));
        assert_eq!(got, vec![r#"Ok(x) => "a, b""#, r#"Err(_) => "c""#]);
    }

    #[test]
    fn test_split_ignores_comma_in_nested_call() {
        let got = texts(split_top_level("Ok(x) => add(x, 1), Err(_) => 0", ','));
        assert_eq!(got, vec!["Ok(x) => add(x, 1)", "Err(_) => 0"]);
    }

    #[test]
    fn test_split_ignores_comma_in_collection_literal() {
        let got = texts(split_top_level("A => []int{1, 2, 3}, B => nil", ','));
        assert_eq!(got, vec!["A => []int{1, 2, 3}", "B => nil"]);
    }

    #[test]
    fn test_split_honors_escaped_quote() {
        let got = texts(split_top_level(r#"A => "he said \", b", B => y"#, ','));
        assert_eq!(got, vec![r#"A => "he said \", b""#, "B => y"]);
    }

    #[test]
    fn test_split_char_literal() {
        let got = texts(split_top_level("A => ',', B => 'x'", ','));
        assert_eq!(got, vec!["A => ','", "B => 'x'"]);
    }

    #[test]
    fn test_split_drops_trailing_separator() {
        let got = texts(split_top_level("a, b,\n", ','));
        assert_eq!(got, vec!["a", "b"]);
    }

    #[test]
    fn test_split_ignores_comment_content() {
        let got = texts(split_top_level("a // x, y\n, b", ','));
        assert_eq!(got, vec!["a // x, y", "b"]);
    }

    #[test]
    fn test_find_top_level_skips_string() {
        let text = r#""fake => arrow" => real"#;
        let idx = find_top_level(text, "=>").unwrap();
        assert_eq!(&text[idx..idx + 2], "=>");
        assert_eq!(idx, 16);
    }

    #[test]
    fn test_find_top_level_skips_nested() {
        let text = "f(a => b) => c";
        // the arrow inside the call is at depth 1
        assert_eq!(find_top_level(text, "=>"), Some(10));
    }

    #[test]
    fn test_find_matching_brace() {
        let text = r#"match s { A => "{", B => x }"#;
        let open = text.find('{').unwrap();
        let close = find_matching_brace(text, open).unwrap();
        assert_eq!(close, text.len() - 1);
    }

    #[test]
    fn test_net_brace_depth() {
        assert_eq!(net_brace_depth("if x > 0 {"), 1);
        assert_eq!(net_brace_depth("}"), -1);
        assert_eq!(net_brace_depth(r#"s := "{}""#), 0);
        assert_eq!(net_brace_depth("} else {"), 0);
    }

    #[test]
    fn test_ends_with_open_brace() {
        assert!(ends_with_open_brace("for i := range xs {"));
        assert!(!ends_with_open_brace(r#"x := "{""#));
        assert!(!ends_with_open_brace("x := 1 // {"));
    }
}
