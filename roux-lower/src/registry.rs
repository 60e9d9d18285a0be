//! Variant registry: union name → ordered variants.
//!
//! Built in a first pass over every union declaration in the unit, before
//! any match is lowered, because arm lowering must resolve a bare variant
//! name to its owning union and discriminant constant. Duplicate names are
//! hard errors, never silent overwrites. The registry is per-unit state:
//! it is created by the driver for one unit and dropped with it.

use roux_parser::ast::{UnionDecl, Variant};
use roux_shared::{Diagnostic, Span};
use std::collections::HashMap;

#[derive(Debug)]
pub struct UnionInfo {
    pub name: String,
    /// Deep-copied from the declaration; the registry never aliases the
    /// parse tree it was built from.
    pub variants: Vec<Variant>,
    pub line: usize,
    pub column: usize,
}

impl UnionInfo {
    pub fn variant_index(&self, name: &str) -> Option<usize> {
        self.variants.iter().position(|v| v.name == name)
    }
}

#[derive(Debug, Default)]
pub struct VariantRegistry {
    unions: Vec<UnionInfo>,
    by_name: HashMap<String, usize>,
    /// variant name → indices of unions declaring it.
    owners: HashMap<String, Vec<usize>>,
}

#[derive(Debug)]
pub enum ResolveError {
    UnknownUnion(String),
    UnknownVariant(String),
    /// The bare variant name is declared by more than one union.
    Ambiguous(String, Vec<String>),
    /// Qualified lookup found the union but not the variant.
    NotInUnion { union: String, variant: String },
}

impl ResolveError {
    pub fn message(&self) -> String {
        match self {
            ResolveError::UnknownUnion(u) => format!("unknown union '{}'", u),
            ResolveError::UnknownVariant(v) => format!("unknown variant '{}'", v),
            ResolveError::Ambiguous(v, unions) => format!(
                "variant '{}' is declared by {}; qualify it as '<Union>.{}'",
                v,
                unions.join(" and "),
                v
            ),
            ResolveError::NotInUnion { union, variant } => {
                format!("union '{}' has no variant '{}'", union, variant)
            }
        }
    }
}

impl VariantRegistry {
    /// First pass over the unit's union declarations. Duplicates are
    /// reported and skipped; lowering of unrelated sites continues.
    pub fn build(decls: &[&UnionDecl], diagnostics: &mut Vec<Diagnostic>) -> Self {
        let mut registry = VariantRegistry::default();
        for decl in decls {
            if registry.by_name.contains_key(&decl.name) {
                diagnostics.push(
                    Diagnostic::error(format!("duplicate union name '{}'", decl.name))
                        .with_span(Span::new(decl.line, decl.column, decl.name.chars().count())),
                );
                continue;
            }

            let mut variants: Vec<Variant> = Vec::new();
            for variant in &decl.variants {
                if variants.iter().any(|v| v.name == variant.name) {
                    diagnostics.push(
                        Diagnostic::error(format!(
                            "duplicate variant '{}' in union '{}'",
                            variant.name, decl.name
                        ))
                        .with_span(Span::new(
                            variant.line,
                            variant.column,
                            variant.name.chars().count(),
                        )),
                    );
                    continue;
                }
                variants.push(variant.clone());
            }

            let idx = registry.unions.len();
            registry.by_name.insert(decl.name.clone(), idx);
            for variant in &variants {
                registry
                    .owners
                    .entry(variant.name.clone())
                    .or_default()
                    .push(idx);
            }
            registry.unions.push(UnionInfo {
                name: decl.name.clone(),
                variants,
                line: decl.line,
                column: decl.column,
            });
        }
        registry
    }

    pub fn union(&self, name: &str) -> Option<&UnionInfo> {
        self.by_name.get(name).map(|&i| &self.unions[i])
    }

    pub fn is_empty(&self) -> bool {
        self.unions.is_empty()
    }

    /// Resolve a pattern's variant to its owning union. A qualified
    /// pattern names the union; a bare name resolves only when a single
    /// union declares it.
    pub fn resolve(
        &self,
        union: Option<&str>,
        variant: &str,
    ) -> Result<(&UnionInfo, usize), ResolveError> {
        match union {
            Some(union_name) => {
                let info = self
                    .union(union_name)
                    .ok_or_else(|| ResolveError::UnknownUnion(union_name.to_string()))?;
                let idx = info.variant_index(variant).ok_or_else(|| {
                    ResolveError::NotInUnion {
                        union: union_name.to_string(),
                        variant: variant.to_string(),
                    }
                })?;
                Ok((info, idx))
            }
            None => {
                let owners = self
                    .owners
                    .get(variant)
                    .filter(|o| !o.is_empty())
                    .ok_or_else(|| ResolveError::UnknownVariant(variant.to_string()))?;
                if owners.len() > 1 {
                    return Err(ResolveError::Ambiguous(
                        variant.to_string(),
                        owners.iter().map(|&i| self.unions[i].name.clone()).collect(),
                    ));
                }
                let info = &self.unions[owners[0]];
                let idx = info
                    .variant_index(variant)
                    .ok_or_else(|| ResolveError::UnknownVariant(variant.to_string()))?;
                Ok((info, idx))
            }
        }
    }
}
