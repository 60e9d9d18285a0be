//! Surface syntax tree for preprocessed Roux units.
//!
//! The tree is deliberately shallow: union declarations, function bodies
//! and `match` constructs are structured because the lowering passes
//! rewrite them; everything else is carried as opaque lines that reach the
//! emitter verbatim. Positions are 1-based (line, column) in the
//! preprocessed coordinate space.

/// One parsed compilation unit.
#[derive(Debug, Clone)]
pub struct Module {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone)]
pub enum Item {
    Union(UnionDecl),
    Func(FuncDecl),
    /// Opaque top-level text: package clause, imports, type declarations,
    /// comments, blank lines.
    Raw(RawLine),
}

/// A single passthrough line, kept verbatim.
#[derive(Debug, Clone)]
pub struct RawLine {
    pub text: String,
    pub line: usize,
}

// ─────────────────────────────────────────────────────────────────────────
// Unions
// ─────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct UnionDecl {
    pub name: String,
    pub variants: Vec<Variant>,
    pub line: usize,
    /// Column of the union name on its declaration line.
    pub column: usize,
}

#[derive(Debug, Clone)]
pub struct Variant {
    pub name: String,
    pub kind: VariantKind,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone)]
pub enum VariantKind {
    /// `Point`
    Unit,
    /// `Green(int, int)` — payload types without field names.
    Positional(Vec<String>),
    /// `Circle(radius float64)` — named fields, `name type` pairs.
    Named(Vec<VariantField>),
}

#[derive(Debug, Clone)]
pub struct VariantField {
    pub name: String,
    pub ty: String,
}

impl Variant {
    pub fn is_unit(&self) -> bool {
        matches!(self.kind, VariantKind::Unit)
    }

    pub fn field_count(&self) -> usize {
        match &self.kind {
            VariantKind::Unit => 0,
            VariantKind::Positional(tys) => tys.len(),
            VariantKind::Named(fields) => fields.len(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Functions and statements
// ─────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FuncDecl {
    /// The full header line, up to and including the opening brace.
    pub header: String,
    pub name: String,
    pub line: usize,
    pub body: Block,
    /// The closing-brace line as written.
    pub closer: String,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    /// One opaque statement line, kept verbatim.
    Raw(RawLine),
    /// A brace-delimited construct the lowering does not rewrite
    /// (`if`/`for`/plain blocks), recursed into so nested matches are
    /// still found.
    Nested(NestedStmt),
    Match(MatchStmt),
}

#[derive(Debug, Clone)]
pub struct NestedStmt {
    /// Header line including its opening brace (e.g. `if x > 0 {`).
    pub header: String,
    pub line: usize,
    pub body: Block,
    /// Closing line (`}`, `} else {` handling is passthrough: an
    /// `} else {` line closes one nested statement and opens another).
    pub closer: String,
}

// ─────────────────────────────────────────────────────────────────────────
// Match
// ─────────────────────────────────────────────────────────────────────────

/// Where a match appears, which decides how its arms yield values.
#[derive(Debug, Clone)]
pub enum MatchContext {
    /// `match s { … }` in statement position.
    Statement,
    /// `return match s { … }`.
    Return,
    /// `var x T = match s { … }` (or `x := match s { … }`, which carries
    /// no annotation and is rejected during lowering).
    Bind { name: String, ty: Option<String> },
}

#[derive(Debug, Clone)]
pub struct MatchStmt {
    pub context: MatchContext,
    pub subjects: Vec<Subject>,
    pub arms: Vec<MatchArm>,
    pub line: usize,
    pub column: usize,
    /// Leading whitespace of the head line, reused by emission.
    pub indent: String,
}

/// One match subject expression, kept as raw text with its position.
#[derive(Debug, Clone)]
pub struct Subject {
    pub expr: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone)]
pub struct MatchArm {
    /// One pattern per subject; a single-subject match has exactly one.
    pub patterns: Vec<Pattern>,
    pub guard: Option<String>,
    pub body: ArmBody,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone)]
pub enum Pattern {
    /// `_`
    Wildcard,
    /// `Circle(r)`, `Shape.Circle(r)`, or a bare unit variant `Point`.
    Variant {
        union: Option<String>,
        variant: String,
        binds: Vec<Binding>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Name(String),
    Ignore,
}

#[derive(Debug, Clone)]
pub enum ArmBody {
    /// `=> expr`
    Expr(String),
    /// `=> { … }`, body lines verbatim without the outer braces.
    Block(Vec<String>),
}

impl Pattern {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Pattern::Wildcard)
    }
}
