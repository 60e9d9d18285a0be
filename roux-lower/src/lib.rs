//! Tree lowering: tagged unions and pattern matches.
//!
//! Consumes the parsed surface tree and produces the host declaration
//! tree. A first pass registers every union declaration (duplicate names
//! are hard errors); matches are then lowered against that registry.
//! Site-local errors accumulate and independent sites keep lowering; the
//! driver fails the unit at the end if any error was recorded.

pub mod matches;
pub mod naming;
pub mod registry;
pub mod unions;

use matches::MatchLowerer;
use registry::VariantRegistry;
use roux_host::ast::{GoDecl, GoModule, GoStmt};
use roux_parser::ast::{Block, Item, Module, Stmt, UnionDecl};
use roux_shared::{Diagnostic, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelperLevel {
    /// Predicates only.
    Minimal,
    /// Predicates plus unwrap accessors.
    Exhaustive,
}

#[derive(Debug, Clone)]
pub struct LowerOptions {
    pub helpers: HelperLevel,
    /// When false, match patterns must qualify their variant as
    /// `Union.Variant`; bare names are rejected.
    pub allow_bare_variants: bool,
}

impl Default for LowerOptions {
    fn default() -> Self {
        LowerOptions {
            helpers: HelperLevel::Exhaustive,
            allow_bare_variants: true,
        }
    }
}

pub struct LowerOutput {
    pub module: GoModule,
    pub diagnostics: Vec<Diagnostic>,
}

impl LowerOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

pub fn lower_module(module: &Module, options: &LowerOptions) -> LowerOutput {
    let mut diagnostics = Vec::new();

    let unions: Vec<&UnionDecl> = module
        .items
        .iter()
        .filter_map(|item| match item {
            Item::Union(u) => Some(u),
            _ => None,
        })
        .collect();
    let registry = VariantRegistry::build(&unions, &mut diagnostics);

    let mut subject_counter = 0usize;
    let mut decls = Vec::new();
    for item in &module.items {
        match item {
            Item::Raw(raw) => decls.push(GoDecl::Raw {
                text: raw.text.clone(),
                line: Some(raw.line),
            }),
            Item::Union(u) => {
                // a duplicate declaration was reported by the registry
                // pass and must not be lowered a second time
                let registered = registry.union(&u.name).is_some_and(|info| info.line == u.line);
                if registered {
                    decls.extend(unions::lower_union(u, options));
                }
            }
            Item::Func(f) => {
                let body = lower_block(
                    &f.body,
                    &registry,
                    options,
                    &mut diagnostics,
                    &mut subject_counter,
                );
                decls.push(GoDecl::Func {
                    header: f.header.clone(),
                    body,
                    closer: f.closer.clone(),
                    line: Some(f.line),
                });
            }
        }
    }

    LowerOutput {
        module: GoModule { decls },
        diagnostics,
    }
}

fn lower_block(
    block: &Block,
    registry: &VariantRegistry,
    options: &LowerOptions,
    diagnostics: &mut Vec<Diagnostic>,
    subject_counter: &mut usize,
) -> Vec<GoStmt> {
    let mut stmts = Vec::new();
    for stmt in &block.stmts {
        match stmt {
            Stmt::Raw(raw) => stmts.push(GoStmt::Raw {
                text: raw.text.clone(),
                line: Some(raw.line),
            }),
            Stmt::Nested(nested) => {
                let body =
                    lower_block(&nested.body, registry, options, diagnostics, subject_counter);
                stmts.push(GoStmt::Block {
                    header: nested.header.clone(),
                    body,
                    closer: nested.closer.clone(),
                    line: (!nested.header.is_empty()).then_some(nested.line),
                });
            }
            Stmt::Match(m) => {
                let mut lowerer = MatchLowerer {
                    registry,
                    options,
                    diagnostics,
                    subject_counter,
                };
                if let Some(lowered) = lowerer.lower(m) {
                    stmts.extend(lowered);
                }
            }
        }
    }
    stmts
}
