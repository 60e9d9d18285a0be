//! Block parser for preprocessed Roux units.
//!
//! Hand-written and line-oriented: `union` and `func` declarations are
//! structured, brace-delimited statements are recursed into so nested
//! matches are found, and everything else passes through verbatim. Match
//! heads and arms are carved out of the raw text with the literal-aware
//! splitter.

use crate::ast::*;
use roux_shared::scan::{
    ends_with_open_brace, find_matching_brace, find_top_level, split_top_level,
};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Parse error at {line}:{column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

pub fn parse(source: &str) -> Result<Module, ParseError> {
    Parser::new(source).parse_module()
}

struct Parser<'a> {
    source: &'a str,
    lines: Vec<&'a str>,
    line_starts: Vec<usize>,
    index: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        let lines: Vec<&str> = source.lines().collect();
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Parser {
            source,
            lines,
            line_starts,
            index: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.index >= self.lines.len()
    }

    fn current(&self) -> &'a str {
        self.lines.get(self.index).copied().unwrap_or("")
    }

    /// 1-based line number of the current line.
    fn line_no(&self) -> usize {
        self.index + 1
    }

    fn advance(&mut self) -> &'a str {
        let line = self.current();
        self.index += 1;
        line
    }

    fn err(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            line: self.line_no().min(self.lines.len().max(1)),
            column: 1,
        }
    }

    /// Translate an absolute byte offset into a 1-based (line, column).
    fn pos_at(&self, offset: usize) -> (usize, usize) {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let column = self.source[self.line_starts[line_idx]..offset].chars().count() + 1;
        (line_idx + 1, column)
    }

    fn line_offset(&self, line_idx: usize) -> usize {
        self.line_starts.get(line_idx).copied().unwrap_or(self.source.len())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Module
    // ─────────────────────────────────────────────────────────────────────

    fn parse_module(&mut self) -> Result<Module, ParseError> {
        let mut items = Vec::new();
        while !self.at_end() {
            let trimmed = self.current().trim_start();
            if trimmed.starts_with("union ") && ends_with_open_brace(self.current()) {
                items.push(Item::Union(self.parse_union()?));
            } else if trimmed.starts_with("func ") && ends_with_open_brace(self.current()) {
                items.push(Item::Func(self.parse_func()?));
            } else {
                items.push(Item::Raw(RawLine {
                    text: self.current().to_string(),
                    line: self.line_no(),
                }));
                self.advance();
            }
        }
        Ok(Module { items })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Unions
    // ─────────────────────────────────────────────────────────────────────

    fn parse_union(&mut self) -> Result<UnionDecl, ParseError> {
        let header = self.current();
        let line = self.line_no();
        let after_kw = header
            .trim_start()
            .strip_prefix("union ")
            .unwrap_or_default();
        let name = after_kw
            .split(|c: char| c.is_whitespace() || c == '{')
            .next()
            .unwrap_or("")
            .to_string();
        if !is_identifier(&name) {
            return Err(self.err(format!("invalid union name '{}'", name)));
        }
        let column = header.find(&name).map(|i| i + 1).unwrap_or(1);
        self.advance();

        let mut variants = Vec::new();
        loop {
            if self.at_end() {
                return Err(self.err(format!("unterminated union '{}'", name)));
            }
            let raw = self.current();
            let trimmed = raw.trim();
            if trimmed == "}" {
                self.advance();
                break;
            }
            if trimmed.is_empty() || trimmed.starts_with("//") {
                self.advance();
                continue;
            }
            variants.push(self.parse_variant(raw)?);
            self.advance();
        }

        if variants.is_empty() {
            return Err(self.err(format!("union '{}' has no variants", name)));
        }
        Ok(UnionDecl {
            name,
            variants,
            line,
            column,
        })
    }

    fn parse_variant(&self, raw: &str) -> Result<Variant, ParseError> {
        let line = self.line_no();
        let trimmed = raw.trim().trim_end_matches(',');
        let column = raw.find(trimmed.chars().next().unwrap_or(' ')).map(|i| i + 1).unwrap_or(1);

        let (name, kind) = match trimmed.find('(') {
            None => {
                if !is_identifier(trimmed) {
                    return Err(self.err(format!("invalid variant '{}'", trimmed)));
                }
                (trimmed.to_string(), VariantKind::Unit)
            }
            Some(paren) => {
                let name = trimmed[..paren].trim().to_string();
                if !is_identifier(&name) {
                    return Err(self.err(format!("invalid variant name '{}'", name)));
                }
                if !trimmed.ends_with(')') {
                    return Err(self.err(format!("malformed variant '{}'", name)));
                }
                let inner = &trimmed[paren + 1..trimmed.len() - 1];
                (name, self.parse_variant_fields(inner)?)
            }
        };
        Ok(Variant {
            name,
            kind,
            line,
            column,
        })
    }

    fn parse_variant_fields(&self, inner: &str) -> Result<VariantKind, ParseError> {
        let pieces: Vec<String> = split_top_level(inner, ',')
            .into_iter()
            .map(|(_, p)| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if pieces.is_empty() {
            return Ok(VariantKind::Unit);
        }

        let named = pieces[0].split_whitespace().count() >= 2;
        if named {
            let mut fields = Vec::new();
            for p in &pieces {
                let mut tokens = p.split_whitespace();
                let (Some(fname), Some(first_ty)) = (tokens.next(), tokens.next()) else {
                    return Err(self.err(format!(
                        "variant mixes named and positional fields: '{}'",
                        p
                    )));
                };
                let mut ty = first_ty.to_string();
                for t in tokens {
                    ty.push(' ');
                    ty.push_str(t);
                }
                if !is_identifier(fname) {
                    return Err(self.err(format!("invalid field name '{}'", fname)));
                }
                fields.push(VariantField {
                    name: fname.to_string(),
                    ty,
                });
            }
            Ok(VariantKind::Named(fields))
        } else {
            for p in &pieces {
                if p.split_whitespace().count() != 1 {
                    return Err(self.err(format!(
                        "variant mixes named and positional fields: '{}'",
                        p
                    )));
                }
            }
            Ok(VariantKind::Positional(pieces))
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Functions
    // ─────────────────────────────────────────────────────────────────────

    fn parse_func(&mut self) -> Result<FuncDecl, ParseError> {
        let header = self.current().to_string();
        let line = self.line_no();
        let name = func_name(&header)
            .ok_or_else(|| self.err("cannot determine function name"))?;
        self.advance();

        let (body, closer) = self.parse_block()?;
        Ok(FuncDecl {
            header,
            name,
            line,
            body,
            closer,
        })
    }

    /// Parse statements until the closing line of the enclosing brace.
    /// Returns the block and the closing line verbatim.
    fn parse_block(&mut self) -> Result<(Block, String), ParseError> {
        let mut stmts = Vec::new();
        loop {
            if self.at_end() {
                return Err(self.err("unexpected end of file inside block"));
            }
            let raw = self.current();
            let trimmed = raw.trim_start();

            if trimmed.starts_with('}') {
                let closer = self.advance().to_string();
                return Ok((Block { stmts }, closer));
            }

            if let Some(head) = match_head(trimmed) {
                stmts.push(Stmt::Match(self.parse_match(head)?));
                continue;
            }

            if ends_with_open_brace(raw) {
                let header = self.advance().to_string();
                let header_line = self.line_no() - 1;
                let (body, closer) = self.parse_block()?;
                stmts.push(Stmt::Nested(NestedStmt {
                    header,
                    line: header_line,
                    body,
                    closer: closer.clone(),
                }));
                // `} else {` both closes the block above and opens a new
                // one; parse_block consumed it as a closer, so open the
                // follow-on block here.
                let mut chain_closer = closer;
                while ends_with_open_brace(&chain_closer) {
                    let chain_line = self.line_no() - 1;
                    let (body, next_closer) = self.parse_block()?;
                    stmts.push(Stmt::Nested(NestedStmt {
                        header: String::new(),
                        line: chain_line,
                        body,
                        closer: next_closer.clone(),
                    }));
                    chain_closer = next_closer;
                }
                continue;
            }

            stmts.push(Stmt::Raw(RawLine {
                text: raw.to_string(),
                line: self.line_no(),
            }));
            self.advance();
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Match
    // ─────────────────────────────────────────────────────────────────────

    fn parse_match(&mut self, head: MatchHead) -> Result<MatchStmt, ParseError> {
        let head_line_idx = self.index;
        let raw = self.current();
        let line = self.line_no();
        let indent: String = raw.chars().take_while(|c| c.is_whitespace()).collect();
        let column = indent.chars().count() + 1;

        // Opening brace: the first top-level '{' after the keyword.
        let line_abs = self.line_offset(head_line_idx);
        let kw_rel = find_top_level(raw, "match")
            .ok_or_else(|| self.err("malformed match head"))?;
        let brace_rel = find_top_level(&raw[kw_rel..], "{")
            .map(|i| kw_rel + i)
            .ok_or_else(|| self.err("match without opening brace"))?;
        let brace_abs = line_abs + brace_rel;
        let close_abs = find_matching_brace(&self.source[line_abs..], brace_rel)
            .map(|rel| line_abs + rel)
            .ok_or_else(|| self.err("unterminated match"))?;

        let subj_abs = line_abs + kw_rel + "match".len();
        let subjects = self.parse_subjects(subj_abs, brace_abs)?;

        let arms = self.parse_arms(brace_abs + 1, close_abs, subjects.len())?;
        if arms.is_empty() {
            return Err(self.err("match with no arms"));
        }

        // Skip past the closing brace's line.
        let (close_line, _) = self.pos_at(close_abs);
        self.index = close_line;

        Ok(MatchStmt {
            context: head.context,
            subjects,
            arms,
            line,
            column,
            indent,
        })
    }

    fn parse_subjects(&self, start: usize, end: usize) -> Result<Vec<Subject>, ParseError> {
        let text = &self.source[start..end];
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(self.err("match without subject"));
        }

        // `(a, b)` wrapping the whole head is a tuple of subjects.
        let is_tuple = trimmed.starts_with('(')
            && trimmed.ends_with(')')
            && paren_wraps_whole(trimmed);
        let (inner_start, inner) = if is_tuple {
            let open = start + text.find('(').unwrap_or(0);
            (open + 1, &self.source[open + 1..start + text.rfind(')').unwrap_or(0)])
        } else {
            (start, text)
        };

        let mut subjects = Vec::new();
        for (rel, piece) in split_top_level(inner, ',') {
            let expr = piece.trim().to_string();
            if expr.is_empty() {
                return Err(self.err("empty match subject"));
            }
            let lead = piece.len() - piece.trim_start().len();
            let (line, column) = self.pos_at(inner_start + rel + lead);
            subjects.push(Subject { expr, line, column });
        }
        Ok(subjects)
    }

    fn parse_arms(
        &self,
        start: usize,
        end: usize,
        subject_count: usize,
    ) -> Result<Vec<MatchArm>, ParseError> {
        let region = &self.source[start..end];
        let mut arms = Vec::new();
        for (rel, piece) in split_top_level(region, ',') {
            if piece.trim().is_empty() {
                continue;
            }
            arms.push(self.parse_arm(start + rel, &piece, subject_count)?);
        }
        Ok(arms)
    }

    fn parse_arm(
        &self,
        abs: usize,
        piece: &str,
        subject_count: usize,
    ) -> Result<MatchArm, ParseError> {
        let lead = piece.len() - piece.trim_start().len();
        let (line, column) = self.pos_at(abs + lead);
        let arm_err = |message: String| ParseError {
            message,
            line,
            column,
        };

        let arrow = find_top_level(piece, "=>")
            .ok_or_else(|| arm_err("match arm without '=>'".into()))?;
        let head = &piece[..arrow];
        let body_text = piece[arrow + 2..].trim();

        let (pattern_text, guard) = match find_top_level(head, " if ") {
            Some(i) => (
                head[..i].trim(),
                Some(head[i + 4..].trim().to_string()),
            ),
            None => (head.trim(), None),
        };

        let patterns = self.parse_patterns(pattern_text, subject_count, &arm_err)?;
        let body = self.parse_arm_body(body_text, &arm_err)?;

        Ok(MatchArm {
            patterns,
            guard,
            body,
            line,
            column,
        })
    }

    fn parse_patterns(
        &self,
        text: &str,
        subject_count: usize,
        arm_err: &dyn Fn(String) -> ParseError,
    ) -> Result<Vec<Pattern>, ParseError> {
        let pieces: Vec<String> = if subject_count > 1 {
            if !(text.starts_with('(') && text.ends_with(')') && paren_wraps_whole(text)) {
                return Err(arm_err(format!(
                    "expected a {}-element tuple pattern, got '{}'",
                    subject_count, text
                )));
            }
            split_top_level(&text[1..text.len() - 1], ',')
                .into_iter()
                .map(|(_, p)| p.trim().to_string())
                .collect()
        } else {
            vec![text.trim().to_string()]
        };

        if pieces.len() != subject_count {
            return Err(arm_err(format!(
                "pattern has {} elements but match has {} subjects",
                pieces.len(),
                subject_count
            )));
        }
        pieces
            .iter()
            .map(|p| self.parse_pattern(p, arm_err))
            .collect()
    }

    fn parse_pattern(
        &self,
        text: &str,
        arm_err: &dyn Fn(String) -> ParseError,
    ) -> Result<Pattern, ParseError> {
        if text == "_" {
            return Ok(Pattern::Wildcard);
        }

        let (name_part, binds) = match text.find('(') {
            None => (text, Vec::new()),
            Some(paren) => {
                if !text.ends_with(')') {
                    return Err(arm_err(format!("malformed pattern '{}'", text)));
                }
                let inner = &text[paren + 1..text.len() - 1];
                let binds = split_top_level(inner, ',')
                    .into_iter()
                    .map(|(_, p)| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .map(|p| {
                        if p == "_" {
                            Ok(Binding::Ignore)
                        } else if is_identifier(&p) {
                            Ok(Binding::Name(p))
                        } else {
                            Err(arm_err(format!("invalid pattern binding '{}'", p)))
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                (&text[..paren], binds)
            }
        };

        let name_part = name_part.trim();
        let (union, variant) = match name_part.split_once('.') {
            Some((u, v)) => (Some(u.trim().to_string()), v.trim().to_string()),
            None => (None, name_part.to_string()),
        };
        if !is_identifier(&variant) || union.as_deref().is_some_and(|u| !is_identifier(u)) {
            return Err(arm_err(format!("invalid pattern '{}'", text)));
        }
        Ok(Pattern::Variant {
            union,
            variant,
            binds,
        })
    }

    fn parse_arm_body(
        &self,
        text: &str,
        arm_err: &dyn Fn(String) -> ParseError,
    ) -> Result<ArmBody, ParseError> {
        if text.starts_with('{') {
            let close = find_matching_brace(text, 0)
                .ok_or_else(|| arm_err("unterminated arm body".into()))?;
            let inner = &text[1..close];
            let lines: Vec<String> = inner
                .lines()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect();
            return Ok(ArmBody::Block(lines));
        }
        if text.is_empty() {
            return Err(arm_err("empty match arm body".into()));
        }
        Ok(ArmBody::Expr(text.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Head detection and small helpers
// ─────────────────────────────────────────────────────────────────────────

struct MatchHead {
    context: MatchContext,
}

/// Recognize a match head on a (trimmed) statement line: `match s {`,
/// `return match s {`, `var x T = match s {`, `x := match s {`. The
/// match may be single-line (`match s { A => f() }`) or open a block.
fn match_head(trimmed: &str) -> Option<MatchHead> {
    let kw = find_top_level(trimmed, "match")?;
    // `match` must be a word of its own
    let after = trimmed[kw + 5..].chars().next();
    if !matches!(after, Some(c) if c.is_whitespace()) {
        return None;
    }
    if trimmed[..kw]
        .chars()
        .last()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
    {
        return None;
    }
    // the match body must open on this line
    find_top_level(&trimmed[kw..], "{")?;
    let before = trimmed[..kw].trim();

    let context = if before.is_empty() {
        MatchContext::Statement
    } else if before == "return" {
        MatchContext::Return
    } else if let Some(binding) = before.strip_suffix('=') {
        let binding = binding.trim_end();
        if let Some(name) = binding.strip_suffix(':') {
            // `x := match …` — no annotation available
            let name = name.trim();
            if !is_identifier(name) {
                return None;
            }
            MatchContext::Bind {
                name: name.to_string(),
                ty: None,
            }
        } else if let Some(rest) = binding.strip_prefix("var ") {
            let mut tokens = rest.split_whitespace();
            let name = tokens.next()?.to_string();
            let ty: Vec<&str> = tokens.collect();
            if !is_identifier(&name) || ty.is_empty() {
                return None;
            }
            MatchContext::Bind {
                name,
                ty: Some(ty.join(" ")),
            }
        } else {
            return None;
        }
    } else {
        return None;
    };
    Some(MatchHead { context })
}

/// Extract the function name from a header line, skipping an optional
/// method receiver: `func Name(…`, `func (r T) Name(…`.
fn func_name(header: &str) -> Option<String> {
    let rest = header.trim_start().strip_prefix("func")?.trim_start();
    let rest = if rest.starts_with('(') {
        let close = rest.find(')')?;
        rest[close + 1..].trim_start()
    } else {
        rest
    };
    let name: String = rest
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if is_identifier(&name) { Some(name) } else { None }
}

/// True when the leading '(' of `text` matches the trailing ')'.
fn paren_wraps_whole(text: &str) -> bool {
    let mut depth = 0i32;
    for (i, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return i == text.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_')
        && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}
