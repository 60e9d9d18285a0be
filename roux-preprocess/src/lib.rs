//! Text preprocessor for Roux units.
//!
//! A fixed-order sequence of line-oriented passes over raw surface text:
//! keyword substitution, type-annotation stripping, `?` expansion, and
//! (when a wrap call was emitted) import insertion. Each pass produces
//! rewritten text plus a stage map in its own input coordinate space; the
//! stages chain, so diagnostics positions can always be carried back to
//! the original source.

pub mod annotations;
pub mod funcctx;
pub mod imports;
pub mod keywords;
pub mod scanlines;
pub mod tryexpand;
pub mod zerovalue;

use roux_shared::{Diagnostic, Span};
use roux_srcmap::{Pos, StageMap};

pub struct PreprocessOutput {
    /// The fully preprocessed unit text.
    pub text: String,
    /// One stage map per pass, in pass order, including a possibly empty
    /// stage for the conditional import pass.
    pub stages: Vec<StageMap>,
    pub needs_fmt: bool,
    /// Warnings and site errors, with spans already translated back into
    /// the *original* coordinate space.
    pub diagnostics: Vec<Diagnostic>,
}

impl PreprocessOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == roux_shared::Severity::Error)
    }
}

/// Run every pass in its fixed order.
pub fn preprocess(source: &str) -> PreprocessOutput {
    let kw = keywords::keywords(source);
    let ann = annotations::annotations(&kw.text);
    let expanded = tryexpand::tryexpand(&ann.text);

    let (text, import_stage) = if expanded.needs_fmt {
        let im = imports::ensure_import(&expanded.text, "fmt");
        (im.text, im.stage)
    } else {
        (expanded.text, StageMap::new())
    };

    // carry diagnostic spans back to original coordinates: annotation
    // warnings are in keyword-output space, expansion diagnostics one
    // stage further along
    let mut diagnostics = Vec::new();
    for diag in ann.warnings {
        diagnostics.push(remap(diag, &[&kw.stage]));
    }
    for diag in expanded.diagnostics {
        diagnostics.push(remap(diag, &[&kw.stage, &ann.stage]));
    }

    PreprocessOutput {
        text,
        stages: vec![kw.stage, ann.stage, expanded.stage, import_stage],
        needs_fmt: expanded.needs_fmt,
        diagnostics,
    }
}

fn remap(mut diag: Diagnostic, earlier: &[&StageMap]) -> Diagnostic {
    if let Some(span) = diag.span {
        let pos = earlier
            .iter()
            .rev()
            .fold(Pos::new(span.line, span.column), |p, s| s.to_original(p));
        diag.span = Some(Span::new(pos.line, pos.column, span.length));
    }
    diag
}
