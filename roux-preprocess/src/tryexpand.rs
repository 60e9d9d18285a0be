//! Error-propagation expansion: the postfix `?` operator.
//!
//! `x := f(p)?` and `return f(p)?` (optionally followed by a message
//! literal) expand into a temp assignment, an early-return check that
//! supplies each non-error return slot's zero value, and the surviving
//! binding or return. Expansion refuses any site whose enclosing function
//! signature it cannot analyze: a wrong zero value compiles and then
//! misbehaves, which is strictly worse than a refused expansion.

use crate::funcctx::{FunctionContext, HeaderParse, parse_header};
use crate::scanlines::{LineScanner, Segment, SegmentKind, char_col};
use crate::zerovalue::zero_value;
use roux_shared::{Diagnostic, Span};
use roux_srcmap::{Delta, Mapping, MappingKind, Pos, StageMap};

pub struct PassOutput {
    pub text: String,
    pub stage: StageMap,
    pub needs_fmt: bool,
    pub diagnostics: Vec<Diagnostic>,
}

enum CtxState {
    Supported(FunctionContext),
    Unsupported { name: String, reason: String },
    Closure,
}

struct CtxEntry {
    state: CtxState,
    open_depth: i32,
    /// Set once the body brace has actually opened; a multi-line header
    /// reaches its `{` on a later line and must not be popped before it.
    entered: bool,
}

pub fn tryexpand(input: &str) -> PassOutput {
    let mut scanner = LineScanner::new();
    let mut stage = StageMap::new();
    let mut diagnostics = Vec::new();
    let mut needs_fmt = false;
    let mut out_lines: Vec<String> = Vec::new();
    let mut depth: i32 = 0;
    let mut stack: Vec<CtxEntry> = Vec::new();

    for (i, line) in input.lines().enumerate() {
        let line_no = i + 1;
        let segments = scanner.segments(line);
        let braces = net_braces(line, &segments);

        match parse_header(line, line_no) {
            HeaderParse::Supported(ctx) => {
                stack.push(CtxEntry {
                    state: CtxState::Supported(ctx),
                    open_depth: depth + 1,
                    entered: false,
                });
            }
            HeaderParse::Unsupported { name, reason } => {
                stack.push(CtxEntry {
                    state: CtxState::Unsupported { name, reason },
                    open_depth: depth + 1,
                    entered: false,
                });
            }
            HeaderParse::NotHeader => {
                // a `func` literal opening a block shadows the enclosing
                // signature; `?` inside it must not use the outer context
                if braces > 0 && has_func_word(line, &segments) {
                    stack.push(CtxEntry {
                        state: CtxState::Closure,
                        open_depth: depth + 1,
                        entered: false,
                    });
                }
            }
        }

        let marks = question_marks(line, &segments);
        if marks.is_empty() {
            out_lines.push(line.to_string());
        } else {
            let out_line_no = out_lines.len() + 1;
            match expand_site(line, line_no, &segments, &marks, stack.last_mut(), out_line_no) {
                Ok(expansion) => {
                    let added = expansion.lines.len() as isize - 1;
                    if added > 0 {
                        stage.push_delta(Delta::new(line_no + 1, 1, added, 0));
                    }
                    for m in expansion.mappings {
                        stage.push_mapping(m);
                    }
                    needs_fmt |= expansion.wrapped;
                    out_lines.extend(expansion.lines);
                }
                Err(diag) => {
                    diagnostics.push(diag);
                    out_lines.push(line.to_string());
                }
            }
        }

        depth += braces;
        loop {
            match stack.last_mut() {
                Some(top) if depth >= top.open_depth => {
                    top.entered = true;
                    break;
                }
                Some(top) if top.entered => {
                    stack.pop();
                }
                _ => break,
            }
        }
    }

    let mut text = out_lines.join("\n");
    text.push('\n');
    PassOutput {
        text,
        stage,
        needs_fmt,
        diagnostics,
    }
}

struct Expansion {
    lines: Vec<String>,
    mappings: Vec<Mapping>,
    wrapped: bool,
}

/// The parsed shape of a `?` site.
enum SiteShape {
    /// `a, b := expr?`
    Assign { names: Vec<String>, name_cols: Vec<usize> },
    /// `var x T = expr?` (ty None for `var x = expr?`)
    VarBind { name: String, name_col: usize, ty: Option<String> },
    /// `return expr?`
    Return,
}

fn expand_site(
    line: &str,
    line_no: usize,
    segments: &[Segment],
    marks: &[usize],
    ctx: Option<&mut CtxEntry>,
    out_line_no: usize,
) -> Result<Expansion, Diagnostic> {
    let site_err = |col: usize, msg: String| {
        Diagnostic::error(msg).with_span(Span::point(line_no, col))
    };

    if marks.len() > 1 {
        return Err(site_err(
            char_col(line, marks[1]),
            "multiple ? markers on one line are not supported".to_string(),
        ));
    }
    let q = marks[0];
    let q_col = char_col(line, q);

    // enclosing function checks
    let ctx = match ctx {
        None => {
            return Err(site_err(q_col, "? used outside a function".to_string()));
        }
        Some(entry) => match &mut entry.state {
            CtxState::Closure => {
                return Err(site_err(
                    q_col,
                    "? inside a function literal is not supported".to_string(),
                ));
            }
            CtxState::Unsupported { name, reason } => {
                return Err(site_err(
                    q_col,
                    format!("cannot expand ? in function '{}': {}", name, reason),
                ));
            }
            CtxState::Supported(ctx) => ctx,
        },
    };
    if !ctx.has_error_slot() {
        return Err(site_err(
            q_col,
            format!(
                "function '{}' does not return error as its final result",
                ctx.name
            ),
        ));
    }

    // zero values for every non-error return slot; refusal blocks the site
    let mut zeros = Vec::new();
    for ty in ctx.value_results() {
        match zero_value(ty) {
            Ok(z) => zeros.push(z),
            Err(reason) => {
                return Err(site_err(
                    q_col,
                    format!("cannot expand ? in function '{}': {}", ctx.name, reason),
                ));
            }
        }
    }

    let message = parse_message(line, segments, q)
        .map_err(|msg| site_err(q_col, msg))?;
    let core = &line[..q];
    let indent: String = line.chars().take_while(|c| c.is_whitespace()).collect();
    let shape = parse_shape(core).map_err(|msg| site_err(q_col, msg))?;

    let expr_start = expr_start_offset(core, &shape);
    let expr = core[expr_start..].trim_end();
    if expr.trim().is_empty() {
        return Err(site_err(q_col, "? without an expression".to_string()));
    }
    if !balanced(expr) {
        return Err(site_err(
            q_col,
            "? is only supported on binding and return statements".to_string(),
        ));
    }

    let value_count = match &shape {
        SiteShape::Assign { names, .. } => names.len(),
        SiteShape::VarBind { .. } => 1,
        SiteShape::Return => ctx.value_results().len(),
    };
    let site = ctx.next_site(value_count);
    let temps: Vec<String> = (0..value_count).map(|k| format!("__tmp{}", site + k)).collect();
    let err_name = format!("__err{}", site);

    let err_expr = match &message {
        None => err_name.clone(),
        Some(lit) => {
            let escaped = lit.inner.replace('%', "%%");
            format!("fmt.Errorf(\"{}: %w\", {})", escaped, err_name)
        }
    };

    // assemble the replacement lines
    let mut lines = Vec::new();
    let mut lead = String::new();
    for t in &temps {
        lead.push_str(t);
        lead.push_str(", ");
    }
    let assign_line = format!("{}{}{} := {}", indent, lead, err_name, expr);
    let expr_gen_col = assign_line[..assign_line.len() - expr.len()].chars().count() + 1;
    lines.push(assign_line);
    lines.push(format!("{}if {} != nil {{", indent, err_name));
    let mut ret = String::new();
    for z in &zeros {
        ret.push_str(z);
        ret.push_str(", ");
    }
    lines.push(format!("{}\treturn {}{}", indent, ret, err_expr));
    lines.push(format!("{}}}", indent));

    let temps_joined = temps.join(", ");
    let final_line = match &shape {
        SiteShape::Assign { names, .. } => {
            format!("{}{} := {}", indent, names.join(", "), temps_joined)
        }
        SiteShape::VarBind { name, ty: Some(ty), .. } => {
            format!("{}var {} {} = {}", indent, name, ty, temps_joined)
        }
        SiteShape::VarBind { name, ty: None, .. } => {
            format!("{}{} := {}", indent, name, temps_joined)
        }
        SiteShape::Return if temps.is_empty() => format!("{}return nil", indent),
        SiteShape::Return => format!("{}return {}, nil", indent, temps_joined),
    };
    lines.push(final_line);

    // position mappings: identifiers inside the moved expression, the
    // surviving binding names, and the operator itself
    let mut mappings = Vec::new();
    for (tok_off, tok) in identifier_tokens(expr) {
        let orig = Pos::new(line_no, char_col(line, expr_start + tok_off));
        let generated = Pos::new(
            out_line_no,
            expr_gen_col + expr[..tok_off].chars().count(),
        );
        mappings.push(Mapping::new(
            orig,
            generated,
            tok.chars().count(),
            MappingKind::Identifier,
            Some(tok.to_string()),
        ));
    }
    mappings.push(Mapping::new(
        Pos::new(line_no, q_col),
        Pos::new(out_line_no + 1, indent.chars().count() + 1),
        2,
        MappingKind::Operator,
        Some("?".to_string()),
    ));
    let final_line_no = out_line_no + lines.len() - 1;
    match &shape {
        SiteShape::Assign { names, name_cols } => {
            let mut gen_col = indent.chars().count() + 1;
            for (name, &orig_col) in names.iter().zip(name_cols) {
                mappings.push(Mapping::new(
                    Pos::new(line_no, orig_col),
                    Pos::new(final_line_no, gen_col),
                    name.chars().count(),
                    MappingKind::Identifier,
                    Some(name.clone()),
                ));
                gen_col += name.chars().count() + 2;
            }
        }
        SiteShape::VarBind { name, name_col, ty } => {
            let gen_col = match ty {
                Some(_) => indent.chars().count() + "var ".len() + 1,
                None => indent.chars().count() + 1,
            };
            mappings.push(Mapping::new(
                Pos::new(line_no, *name_col),
                Pos::new(final_line_no, gen_col),
                name.chars().count(),
                MappingKind::Identifier,
                Some(name.clone()),
            ));
        }
        SiteShape::Return => {}
    }

    Ok(Expansion {
        lines,
        mappings,
        wrapped: message.is_some(),
    })
}

struct MessageLit {
    inner: String,
}

/// Everything after the `?` must be whitespace or a single string
/// literal (the human-readable wrap message).
fn parse_message(
    line: &str,
    segments: &[Segment],
    q: usize,
) -> Result<Option<MessageLit>, String> {
    let mut message = None;
    for seg in segments {
        if seg.end <= q + 1 {
            continue;
        }
        let start = seg.start.max(q + 1);
        let text = &line[start..seg.end];
        match seg.kind {
            SegmentKind::Code => {
                if !text.trim().is_empty() {
                    return Err("unexpected code after ?".to_string());
                }
            }
            SegmentKind::Str => {
                if message.is_some() {
                    return Err("multiple message literals after ?".to_string());
                }
                let inner = text
                    .strip_prefix('"')
                    .and_then(|t| t.strip_suffix('"'))
                    .ok_or_else(|| "malformed message literal after ?".to_string())?;
                message = Some(MessageLit {
                    inner: inner.to_string(),
                });
            }
            SegmentKind::Char => {
                return Err("unexpected character literal after ?".to_string());
            }
            SegmentKind::Comment => {}
        }
    }
    Ok(message)
}

fn parse_shape(core: &str) -> Result<SiteShape, String> {
    let trimmed = core.trim_start();
    let indent_bytes = core.len() - trimmed.len();

    if strip_word(trimmed, "return").is_some() {
        return Ok(SiteShape::Return);
    }

    if strip_word(trimmed, "var").is_some() {
        let decl_end = find_assign_eq(core).ok_or("malformed var binding before ?")?;
        let decl = core[..decl_end].trim_start();
        let after_var = strip_word(decl, "var").unwrap_or("").trim_start();
        let mut tokens = after_var.split_whitespace();
        let name = tokens
            .next()
            .ok_or("var binding without a name")?
            .to_string();
        if !is_identifier(&name) {
            return Err(format!("invalid binding name '{}'", name));
        }
        let ty_tokens: Vec<&str> = tokens.collect();
        let ty = if ty_tokens.is_empty() {
            None
        } else {
            Some(ty_tokens.join(" "))
        };
        // the name starts right after `var` plus its following whitespace
        let name_byte = indent_bytes + (trimmed.len() - after_var.len());
        let name_col = core[..name_byte].chars().count() + 1;
        return Ok(SiteShape::VarBind { name, name_col, ty });
    }

    if let Some(at) = find_top_level_str(core, ":=") {
        let lhs = &core[..at];
        let mut names = Vec::new();
        let mut name_cols = Vec::new();
        let mut base = 0;
        for piece in lhs.split(',') {
            let name = piece.trim().to_string();
            if !is_identifier(&name) {
                return Err(format!("invalid binding name '{}'", name));
            }
            let lead = piece.len() - piece.trim_start().len();
            name_cols.push(core[..base + lead].chars().count() + 1);
            names.push(name);
            base += piece.len() + 1;
        }
        if names.is_empty() {
            return Err("binding without names before :=".to_string());
        }
        return Ok(SiteShape::Assign { names, name_cols });
    }

    Err("? is only supported on binding and return statements".to_string())
}

/// Byte offset where the bound expression begins inside `core`.
fn expr_start_offset(core: &str, shape: &SiteShape) -> usize {
    let off = match shape {
        SiteShape::Return => core.find("return").unwrap_or(0) + "return".len(),
        SiteShape::VarBind { .. } => find_assign_eq(core).map(|i| i + 1).unwrap_or(0),
        SiteShape::Assign { .. } => find_top_level_str(core, ":=").map(|i| i + 2).unwrap_or(0),
    };
    off + (core[off..].len() - core[off..].trim_start().len())
}

/// `word` followed by whitespace at the start of `s`.
fn strip_word<'a>(s: &'a str, word: &str) -> Option<&'a str> {
    let rest = s.strip_prefix(word)?;
    if rest.chars().next().is_some_and(|c| c.is_whitespace()) {
        Some(rest)
    } else {
        None
    }
}

/// First `=` at bracket depth zero that is an assignment (not `:=`, `==`,
/// `!=`, `<=`, `>=`).
fn find_assign_eq(core: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut prev = ' ';
    let mut chars = core.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            '=' if depth == 0 => {
                let next = chars.peek().map(|&(_, c)| c);
                if !matches!(prev, ':' | '!' | '<' | '>' | '=') && next != Some('=') {
                    return Some(i);
                }
            }
            _ => {}
        }
        prev = ch;
    }
    None
}

/// First occurrence of `needle` at bracket depth zero.
fn find_top_level_str(core: &str, needle: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, ch) in core.char_indices() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            _ => {}
        }
        if depth == 0 && core[i..].starts_with(needle) {
            return Some(i);
        }
    }
    None
}

/// Net bracket balance of a code fragment, literals excluded. A bound
/// expression must balance; an unbalanced one means the `?` sits inside
/// a construct the line-oriented expansion cannot rewrite.
fn balanced(expr: &str) -> bool {
    let mut scanner = LineScanner::new();
    let segments = scanner.segments(expr);
    let mut depth = 0i32;
    for seg in segments.iter().filter(|s| s.kind == SegmentKind::Code) {
        for ch in expr[seg.start..seg.end].chars() {
            match ch {
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth -= 1,
                _ => {}
            }
        }
    }
    depth == 0
}

/// `(byte_offset, token)` for each identifier token in a code fragment,
/// skipping string/char literal contents.
fn identifier_tokens(expr: &str) -> Vec<(usize, &str)> {
    let mut scanner = LineScanner::new();
    let segments = scanner.segments(expr);
    let mut tokens = Vec::new();
    for seg in segments.iter().filter(|s| s.kind == SegmentKind::Code) {
        let code = &expr[seg.start..seg.end];
        let mut start = None;
        for (i, c) in code.char_indices().chain([(code.len(), ' ')]) {
            let is_ident = c.is_alphanumeric() || c == '_';
            match (start, is_ident) {
                (None, true) => start = Some(i),
                (Some(s), false) => {
                    let tok = &code[s..i];
                    if tok.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_') {
                        tokens.push((seg.start + s, tok));
                    }
                    start = None;
                }
                _ => {}
            }
        }
    }
    tokens
}

fn question_marks(line: &str, segments: &[Segment]) -> Vec<usize> {
    let mut marks = Vec::new();
    for seg in segments.iter().filter(|s| s.kind == SegmentKind::Code) {
        for (i, b) in line[seg.start..seg.end].bytes().enumerate() {
            if b == b'?' {
                marks.push(seg.start + i);
            }
        }
    }
    marks
}

fn net_braces(line: &str, segments: &[Segment]) -> i32 {
    let mut net = 0;
    for seg in segments.iter().filter(|s| s.kind == SegmentKind::Code) {
        for b in line[seg.start..seg.end].bytes() {
            match b {
                b'{' => net += 1,
                b'}' => net -= 1,
                _ => {}
            }
        }
    }
    net
}

fn has_func_word(line: &str, segments: &[Segment]) -> bool {
    !crate::scanlines::find_words(line, segments, "func").is_empty()
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_')
        && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn expand_ok(src: &str) -> PassOutput {
        let out = tryexpand(src);
        assert!(
            out.diagnostics.is_empty(),
            "unexpected diagnostics: {:?}",
            out.diagnostics
                .iter()
                .map(|d| d.message.clone())
                .collect::<Vec<_>>()
        );
        out
    }

    #[test]
    fn test_scenario_a_binding_expansion() {
        let src = "func Load(path string) (Config, error) {\n\tvar data = Read(path)?\n\treturn data, nil\n}\n";
        let out = expand_ok(src);
        let lines: Vec<&str> = out.text.lines().collect();
        assert_eq!(lines[1], "\t__tmp0, __err0 := Read(path)");
        assert_eq!(lines[2], "\tif __err0 != nil {");
        assert_eq!(lines[3], "\t\treturn Config{}, __err0");
        assert_eq!(lines[4], "\t}");
        assert_eq!(lines[5], "\tdata := __tmp0");
        assert!(!out.needs_fmt);
    }

    #[test]
    fn test_short_assign_expansion() {
        let src = "func Load(path string) (Config, error) {\n\tdata := Read(path)?\n\treturn data, nil\n}\n";
        let out = expand_ok(src);
        assert!(out.text.contains("\t__tmp0, __err0 := Read(path)\n"));
        assert!(out.text.contains("\tdata := __tmp0\n"));
    }

    #[test]
    fn test_message_wraps_error() {
        let src =
            "func Load(path string) (Config, error) {\n\tdata := Read(path)? \"read config\"\n\treturn data, nil\n}\n";
        let out = expand_ok(src);
        assert!(
            out.text
                .contains("return Config{}, fmt.Errorf(\"read config: %w\", __err0)")
        );
        assert!(out.needs_fmt);
    }

    #[test]
    fn test_percent_in_message_escaped() {
        let src =
            "func Load(p string) (int, error) {\n\tn := Parse(p)? \"50% done\"\n\treturn n, nil\n}\n";
        let out = expand_ok(src);
        assert!(out.text.contains("fmt.Errorf(\"50%% done: %w\", __err0)"));
    }

    #[test]
    fn test_return_expansion() {
        let src = "func Load(p string) (Config, error) {\n\treturn Read(p)?\n}\n";
        let out = expand_ok(src);
        let lines: Vec<&str> = out.text.lines().collect();
        assert_eq!(lines[1], "\t__tmp0, __err0 := Read(p)");
        assert_eq!(lines[2], "\tif __err0 != nil {");
        assert_eq!(lines[3], "\t\treturn Config{}, __err0");
        assert_eq!(lines[4], "\t}");
        assert_eq!(lines[5], "\treturn __tmp0, nil");
    }

    #[test]
    fn test_error_only_return() {
        let src = "func Close() error {\n\treturn shutdown()?\n}\n";
        let out = expand_ok(src);
        let lines: Vec<&str> = out.text.lines().collect();
        assert_eq!(lines[1], "\t__err0 := shutdown()");
        assert_eq!(lines[3], "\t\treturn __err0");
        assert_eq!(lines[5], "\treturn nil");
    }

    #[test]
    fn test_multi_binding() {
        let src = "func F() (int, error) {\n\ta, b := pair()?\n\treturn a + b, nil\n}\n";
        let out = expand_ok(src);
        assert!(out.text.contains("\t__tmp0, __tmp1, __err0 := pair()\n"));
        assert!(out.text.contains("\ta, b := __tmp0, __tmp1\n"));
    }

    #[test]
    fn test_temp_names_unique_within_function() {
        let src = "func F(p string) (int, error) {\n\ta := one(p)?\n\tb := two(p)?\n\treturn a + b, nil\n}\n";
        let out = expand_ok(src);
        assert!(out.text.contains("__tmp0, __err0 := one(p)"));
        assert!(out.text.contains("__tmp1, __err1 := two(p)"));
    }

    #[test]
    fn test_counter_resets_per_function() {
        let src = "func F(p string) (int, error) {\n\ta := one(p)?\n\treturn a, nil\n}\n\nfunc G(p string) (int, error) {\n\tb := one(p)?\n\treturn b, nil\n}\n";
        let out = expand_ok(src);
        let count = out.text.matches("__tmp0, __err0 :=").count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_zero_values_multiple_slots() {
        let src = "func F() (string, int, *Conn, error) {\n\treturn dial()?\n}\n";
        let out = expand_ok(src);
        assert!(out.text.contains("\t\treturn \"\", 0, nil, __err0\n"));
        assert!(out.text.contains("\treturn __tmp0, __tmp1, __tmp2, nil\n"));
    }

    #[test]
    fn test_unsupported_signature_refuses() {
        let src = "func Map[T any](xs []T) ([]T, error) {\n\tr := step(xs)?\n\treturn r, nil\n}\n";
        let out = tryexpand(src);
        assert_eq!(out.diagnostics.len(), 1);
        assert!(out.diagnostics[0].message.contains("type parameters"));
        // the site is left unexpanded, never guessed
        assert!(out.text.contains("r := step(xs)?"));
    }

    #[test]
    fn test_no_error_slot_refuses() {
        let src = "func F() int {\n\tx := g()?\n\treturn x\n}\n";
        let out = tryexpand(src);
        assert_eq!(out.diagnostics.len(), 1);
        assert!(out.diagnostics[0].message.contains("does not return error"));
    }

    #[test]
    fn test_question_in_string_untouched() {
        let src = "func F() (int, error) {\n\ts := \"what?\"\n\treturn len(s), nil\n}\n";
        let out = expand_ok(src);
        assert!(out.text.contains("\ts := \"what?\"\n"));
    }

    #[test]
    fn test_closure_site_refused() {
        let src = "func F() (int, error) {\n\tcb := func() {\n\t\tx := g()?\n\t}\n\treturn 0, nil\n}\n";
        let out = tryexpand(src);
        assert_eq!(out.diagnostics.len(), 1);
        assert!(out.diagnostics[0].message.contains("function literal"));
    }

    #[test]
    fn test_outside_function_refused() {
        let src = "var x = g()?\n";
        let out = tryexpand(src);
        assert_eq!(out.diagnostics.len(), 1);
        assert!(out.diagnostics[0].message.contains("outside a function"));
    }

    #[test]
    fn test_line_delta_recorded() {
        let src = "func F(p string) (int, error) {\n\ta := one(p)?\n\treturn a, nil\n}\n";
        let out = expand_ok(src);
        // `return a, nil` moves from line 3 to line 7 (4 lines inserted)
        assert_eq!(
            out.stage.shift_forward(Pos::new(3, 2)),
            Pos::new(7, 2)
        );
    }

    #[test]
    fn test_identifier_mapping_for_moved_expr() {
        let src = "func F(p string) (int, error) {\n\ta := one(p)?\n\treturn a, nil\n}\n";
        let out = expand_ok(src);
        // diagnostic on `one` in the generated temp assignment maps back
        // to `one` on the original line, not to the `?`
        let gen_col = "\t__tmp0, __err0 := ".chars().count() + 1;
        let back = out.stage.to_original(Pos::new(2, gen_col));
        assert_eq!(back, Pos::new(2, "\ta := ".chars().count() + 1));
    }

    #[test]
    fn test_operator_mapping_present() {
        let src = "func F(p string) (int, error) {\n\ta := one(p)?\n\treturn a, nil\n}\n";
        let out = expand_ok(src);
        let op = out
            .stage
            .mappings()
            .iter()
            .find(|m| m.kind == MappingKind::Operator)
            .unwrap();
        assert_eq!(op.name.as_deref(), Some("?"));
        assert_eq!(op.original_line, 2);
        // anchored on the `if` line of the expansion
        assert_eq!(op.generated_line, 3);
    }
}
