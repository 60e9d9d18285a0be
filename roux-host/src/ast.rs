//! Host-language declaration tree.
//!
//! Deliberately shallow: structured nodes exist for everything the
//! lowering passes synthesize (discriminant types, const blocks, structs,
//! switches); surface code the pipeline does not rewrite flows through as
//! raw lines. Names are precomputed by the lowering — the emitter never
//! invents identifiers.
//!
//! `line` fields hold the node's source line in *preprocessed*
//! coordinates, for shift tracking; `pos` fields hold (line, column)
//! anchors that become position mappings when the node is emitted.

use roux_srcmap::Pos;

#[derive(Debug, Clone)]
pub struct GoModule {
    pub decls: Vec<GoDecl>,
}

#[derive(Debug, Clone)]
pub enum GoDecl {
    /// Verbatim passthrough line.
    Raw { text: String, line: Option<usize> },
    /// `type Name Underlying`
    TypeDef {
        name: String,
        underlying: String,
        pos: Option<Pos>,
    },
    /// `const ( E0 Ty = iota … )`
    ConstBlock { ty: String, entries: Vec<ConstEntry> },
    /// `type Name struct { … }`
    StructDef {
        name: String,
        fields: Vec<GoField>,
        pos: Option<Pos>,
    },
    /// A function: verbatim header/closer for parsed functions,
    /// synthesized text for generated constructors and helpers.
    Func {
        header: String,
        body: Vec<GoStmt>,
        closer: String,
        line: Option<usize>,
    },
}

#[derive(Debug, Clone)]
pub struct ConstEntry {
    pub name: String,
    pub pos: Option<Pos>,
}

#[derive(Debug, Clone)]
pub struct GoField {
    pub name: String,
    pub ty: String,
}

#[derive(Debug, Clone)]
pub enum GoStmt {
    /// With `line`: a verbatim source line. Without: synthesized text the
    /// emitter indents to the current depth.
    Raw { text: String, line: Option<usize> },
    /// `lhs := rhs`
    Assign {
        lhs: String,
        rhs: String,
        /// Source anchor of `rhs`, mapped on emission.
        pos: Option<Pos>,
    },
    Switch(GoSwitch),
    /// `var name ty = func() ty { switch …; panic(…) }()` — a match used
    /// as a value-producing binding.
    BindMatch {
        name: String,
        ty: String,
        switch: GoSwitch,
    },
    Return { expr: Option<String> },
    Panic { message: String },
    /// A brace-delimited passthrough block (`if`/`for`/…) whose header
    /// and closer are verbatim lines. An empty header means the block was
    /// opened by the previous block's closer (`} else {`).
    Block {
        header: String,
        body: Vec<GoStmt>,
        closer: String,
        line: Option<usize>,
    },
}

#[derive(Debug, Clone)]
pub struct GoSwitch {
    /// The switched expression, e.g. `__m0.Kind`.
    pub subject: String,
    pub cases: Vec<GoCase>,
    pub default: Option<Vec<GoStmt>>,
    /// Base indentation captured from the match head line.
    pub indent: String,
    pub pos: Option<Pos>,
}

/// One case entry. Guarded arms stay separate entries sharing a label;
/// the emitter coalesces consecutive same-label entries into one host
/// case whose guarded segments break out on success, which is exactly
/// fall-through-on-guard-false.
#[derive(Debug, Clone)]
pub struct GoCase {
    pub label: String,
    pub guard: Option<String>,
    /// Binding-extraction statements, before the guard and body.
    pub binds: Vec<GoStmt>,
    pub body: Vec<GoStmt>,
    pub pos: Option<Pos>,
}

impl GoStmt {
    /// True when control cannot flow past this statement.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GoStmt::Return { .. } | GoStmt::Panic { .. })
    }

    pub fn raw(text: impl Into<String>) -> Self {
        GoStmt::Raw {
            text: text.into(),
            line: None,
        }
    }
}
