//! Compile-time diagnostics: spans, severities, and rendering.
//!
//! A `CompileContext` wraps one compilation unit (filename + source text)
//! and resolves byte offsets to line/column spans. `format_diagnostic`
//! renders a diagnostic with the offending source line and a caret.

/// A position range in one coordinate space. Lines and columns are 1-based;
/// `length` is the number of columns the span covers (minimum 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
    pub length: usize,
}

impl Span {
    pub fn new(line: usize, column: usize, length: usize) -> Self {
        Span {
            line,
            column,
            length: length.max(1),
        }
    }

    /// Point span of a single column.
    pub fn point(line: usize, column: usize) -> Self {
        Span::new(line, column, 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// A single reportable message, optionally anchored to a span in the
/// original source.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            span: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

/// Per-unit compile context: filename, source text, and a line index for
/// byte-offset resolution.
pub struct CompileContext {
    pub filename: String,
    pub source: String,
    line_offsets: Vec<usize>,
}

impl CompileContext {
    pub fn new(filename: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let mut line_offsets = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_offsets.push(i + 1);
            }
        }
        CompileContext {
            filename: filename.into(),
            source,
            line_offsets,
        }
    }

    /// Resolve a byte offset into a point span. Offsets past the end clamp
    /// to the last line.
    pub fn byte_to_span(&self, offset: usize) -> Span {
        let line_idx = match self.line_offsets.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_offsets[line_idx];
        let column = self.source[line_start..offset.min(self.source.len())]
            .chars()
            .count()
            + 1;
        Span::point(line_idx + 1, column)
    }

    /// The text of a 1-based line, without its newline.
    pub fn line_text(&self, line: usize) -> Option<&str> {
        let start = *self.line_offsets.get(line.checked_sub(1)?)?;
        let end = self
            .line_offsets
            .get(line)
            .map(|&e| e.saturating_sub(1))
            .unwrap_or(self.source.len());
        self.source.get(start..end)
    }
}

/// Render a diagnostic as `severity: message` plus, when a context and span
/// are available, the `file:line:col` anchor, source line, and caret.
pub fn format_diagnostic(diag: &Diagnostic, ctx: Option<&CompileContext>) -> String {
    let mut out = format!("{}: {}", diag.severity.label(), diag.message);
    let (Some(span), Some(ctx)) = (diag.span, ctx) else {
        return out;
    };

    out.push_str(&format!(
        "\n  --> {}:{}:{}",
        ctx.filename, span.line, span.column
    ));
    if let Some(text) = ctx.line_text(span.line) {
        out.push_str(&format!("\n   | {}", text));
        let pad = " ".repeat(span.column.saturating_sub(1));
        let carets = "^".repeat(span.length.min(text.chars().count().max(1)));
        out.push_str(&format!("\n   | {}{}", pad, carets));
    }
    out
}

/// Collects diagnostics for a unit and keeps warning/error counts.
#[derive(Default)]
pub struct Emitter {
    diagnostics: Vec<Diagnostic>,
    errors: usize,
    warnings: usize,
}

impl Emitter {
    pub fn new() -> Self {
        Emitter::default()
    }

    pub fn emit(&mut self, diag: Diagnostic) {
        match diag.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
        }
        self.diagnostics.push(diag);
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn print_failed_header(filename: &str) {
        eprintln!("== compilation failed: {} ==", filename);
    }

    /// Render every collected diagnostic against the unit context.
    pub fn render_all(&self, ctx: &CompileContext) -> String {
        self.diagnostics
            .iter()
            .map(|d| format_diagnostic(d, Some(ctx)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
