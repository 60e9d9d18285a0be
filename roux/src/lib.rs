//! Roux — ergonomic Go, compiled to plain Go.
//!
//! Parses `.roux` source and produces host Go text plus a bidirectional
//! position-translation table, so diagnostics tooling can report surface
//! positions instead of generated ones.
//!
//! The per-unit pipeline is strictly ordered and synchronous: preprocess
//! (text passes) → parse → lower (unions, matches) → emit. All mutable
//! state lives in values created per unit; independent units can be
//! compiled by independent calls with nothing shared.

use roux_lower::{LowerOptions, lower_module};
use roux_parser::parse;
use roux_shared::{CompileContext, Diagnostic, Severity, format_diagnostic};
use roux_srcmap::{CompositeMap, Pos, StageMap, TranslationTable};

pub use roux_lower::HelperLevel;

#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Helper-method generation for lowered unions.
    pub helpers: HelperLevel,
    /// Accept bare variant names in patterns (`Circle(r)`); when false,
    /// `Union.Variant` qualification is required.
    pub allow_bare_variants: bool,
    /// Unit name used in rendered diagnostics.
    pub source_name: Option<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            helpers: HelperLevel::Exhaustive,
            allow_bare_variants: true,
            source_name: None,
        }
    }
}

#[derive(Debug)]
pub struct CompilerOutput {
    pub go_code: String,
    /// Original ↔ generated position table, sorted by generated position.
    pub table: TranslationTable,
    pub warnings: Vec<Diagnostic>,
}

/// A failed unit: every collected diagnostic, with positions already in
/// original surface coordinates.
#[derive(Debug)]
pub struct CompileError {
    pub diagnostics: Vec<Diagnostic>,
    pub source_name: Option<String>,
    pub source_text: Option<String>,
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ctx = self.source_text.as_ref().map(|text| {
            CompileContext::new(
                self.source_name.clone().unwrap_or_else(|| "<input>".into()),
                text.clone(),
            )
        });
        for (i, diag) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", format_diagnostic(diag, ctx.as_ref()))?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}

/// Compile one unit with default options.
pub fn compile(source: &str) -> Result<CompilerOutput, CompileError> {
    compile_with_options(source, &CompileOptions::default())
}

/// Compile one unit, rendering diagnostics against `filename`.
pub fn compile_file(
    source: &str,
    filename: &str,
    options: &CompileOptions,
) -> Result<CompilerOutput, CompileError> {
    let mut opts = options.clone();
    opts.source_name = Some(filename.to_string());
    compile_with_options(source, &opts)
}

pub fn compile_with_options(
    source: &str,
    options: &CompileOptions,
) -> Result<CompilerOutput, CompileError> {
    let fail = |diagnostics: Vec<Diagnostic>| CompileError {
        diagnostics,
        source_name: options.source_name.clone(),
        source_text: Some(source.to_string()),
    };

    // 1. text passes
    let pre = roux_preprocess::preprocess(source);
    let mut diagnostics = pre.diagnostics.clone();
    if pre.has_errors() {
        return Err(fail(diagnostics));
    }

    // translates later-stage positions back into original coordinates
    let preprocess_stages = pre.stages;
    let to_original = |pos: Pos| -> Pos {
        preprocess_stages
            .iter()
            .rev()
            .fold(pos, |p, s| s.to_original(p))
    };

    // 2. parse (unit-fatal on failure, reported at the original position)
    let module = match parse(&pre.text) {
        Ok(module) => module,
        Err(e) => {
            let orig = to_original(Pos::new(e.line, e.column));
            diagnostics.push(
                Diagnostic::error(e.message)
                    .with_span(roux_shared::Span::point(orig.line, orig.column)),
            );
            return Err(fail(diagnostics));
        }
    };

    // 3. lower unions and matches
    let lower_options = LowerOptions {
        helpers: options.helpers,
        allow_bare_variants: options.allow_bare_variants,
    };
    let lowered = lower_module(&module, &lower_options);
    for diag in lowered.diagnostics {
        diagnostics.push(remap_diag(diag, &to_original));
    }

    // 4. emit host text, recording the emit-stage map
    let mut cg = roux_host::Codegen::new();
    cg.emit_module(&lowered.module);
    let (go_code, emit_stage) = cg.finish();

    if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        return Err(fail(diagnostics));
    }

    // 5. compose every stage into the unit's translation table
    let mut composite = CompositeMap::new();
    for stage in preprocess_stages {
        composite.push_stage(stage);
    }
    composite.push_stage(emit_stage);
    let table = composite.table();

    Ok(CompilerOutput {
        go_code,
        table,
        warnings: diagnostics,
    })
}

fn remap_diag(mut diag: Diagnostic, to_original: &dyn Fn(Pos) -> Pos) -> Diagnostic {
    if let Some(span) = diag.span {
        let pos = to_original(Pos::new(span.line, span.column));
        diag.span = Some(roux_shared::Span::new(pos.line, pos.column, span.length));
    }
    diag
}

/// The preprocessed text and its stage maps, exposed for tooling that
/// wants to inspect intermediate output (`--emit-pre`).
pub fn preprocess_only(source: &str) -> (String, Vec<StageMap>, Vec<Diagnostic>) {
    let pre = roux_preprocess::preprocess(source);
    (pre.text, pre.stages, pre.diagnostics)
}
