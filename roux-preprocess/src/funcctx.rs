//! Per-function state for the `?` expansion pass.
//!
//! A `FunctionContext` is created when the pass scans a `func` header and
//! dropped when the body's closing brace is reached. It owns the declared
//! result types and the temp-variable counter; nothing here outlives the
//! function, so names cannot collide across functions or units.

use regex::Regex;
use roux_shared::scan::split_top_level;
use std::sync::LazyLock;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // the pattern is a constant
    Regex::new(r"^func\s*(\([^()]*\)\s*)?([A-Za-z_][A-Za-z0-9_]*)").unwrap()
});

#[derive(Debug)]
pub struct FunctionContext {
    pub name: String,
    pub line: usize,
    /// Declared result types, in order. Empty for `func f() {`.
    pub results: Vec<String>,
    counter: usize,
}

impl FunctionContext {
    /// True when `?` can expand here: the final result slot is `error`.
    pub fn has_error_slot(&self) -> bool {
        self.results.last().map(String::as_str) == Some("error")
    }

    /// Result types preceding the error slot.
    pub fn value_results(&self) -> &[String] {
        &self.results[..self.results.len().saturating_sub(1)]
    }

    /// Allocate the next site id, reserving `values` temp names.
    pub fn next_site(&mut self, values: usize) -> usize {
        let base = self.counter;
        self.counter += values.max(1);
        base
    }
}

#[derive(Debug)]
pub enum HeaderParse {
    /// Not a function header at all.
    NotHeader,
    Supported(FunctionContext),
    /// A header the pass cannot analyze; `?` sites inside it must refuse
    /// to expand instead of guessing zero values.
    Unsupported { name: String, reason: String },
}

pub fn parse_header(line: &str, line_no: usize) -> HeaderParse {
    let trimmed = line.trim();
    if trimmed != "func"
        && !(trimmed.starts_with("func")
            && trimmed[4..]
                .chars()
                .next()
                .is_some_and(|c| c.is_whitespace() || c == '('))
    {
        return HeaderParse::NotHeader;
    }

    let Some(caps) = HEADER_RE.captures(trimmed) else {
        return HeaderParse::Unsupported {
            name: String::new(),
            reason: "function header could not be parsed".to_string(),
        };
    };
    let name = caps[2].to_string();
    let after_name = &trimmed[caps.get(0).map(|m| m.end()).unwrap_or(0)..];

    if after_name.trim_start().starts_with('[') {
        return HeaderParse::Unsupported {
            name,
            reason: "type parameters are not supported by ? expansion".to_string(),
        };
    }
    if !trimmed.ends_with('{') {
        return HeaderParse::Unsupported {
            name,
            reason: "multi-line or bodyless function header".to_string(),
        };
    }

    let Some(params_open) = after_name.find('(') else {
        return HeaderParse::Unsupported {
            name,
            reason: "function header without parameter list".to_string(),
        };
    };
    let Some(params_close) = matching_paren(after_name, params_open) else {
        return HeaderParse::Unsupported {
            name,
            reason: "multi-line parameter list".to_string(),
        };
    };

    let results_text = after_name[params_close + 1..]
        .trim()
        .trim_end_matches('{')
        .trim();
    let results = parse_results(results_text);

    HeaderParse::Supported(FunctionContext {
        name,
        line: line_no,
        results,
        counter: 0,
    })
}

fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (idx, ch) in text.char_indices().skip_while(|&(i, _)| i < open) {
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

fn parse_results(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    if !(text.starts_with('(') && text.ends_with(')')) {
        return vec![text.to_string()];
    }

    let inner = &text[1..text.len() - 1];
    let pieces: Vec<String> = split_top_level(inner, ',')
        .into_iter()
        .map(|(_, p)| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    // named results: every slot reads `name type` with a plain identifier
    // name; `(Config, error)` style slots are single-token
    let named = !pieces.is_empty()
        && pieces.iter().all(|p| {
            let mut tokens = p.split_whitespace();
            let first_is_name = tokens
                .next()
                .is_some_and(|t| t.chars().all(|c| c.is_alphanumeric() || c == '_'))
                && !matches!(
                    p.split_whitespace().next(),
                    Some("chan") | Some("func") | Some("map") | Some("interface") | Some("struct")
                );
            first_is_name && tokens.next().is_some()
        });

    pieces
        .into_iter()
        .map(|p| {
            if named {
                p.split_whitespace().skip(1).collect::<Vec<_>>().join(" ")
            } else {
                p
            }
        })
        .collect()
}
