//! Pattern-match lowering.
//!
//! A single-subject match becomes a switch on the subject's discriminant.
//! A match over N subjects becomes N nested switches, one level per tuple
//! position, so case labels at each level are drawn from one subject's
//! discriminant and cannot collide. Binding extraction happens at the
//! leaves, where the full pattern path is known. Guarded arms keep their
//! own case entries and earn no exhaustiveness credit.

use crate::naming;
use crate::registry::{UnionInfo, VariantRegistry};
use roux_host::ast::{GoCase, GoStmt, GoSwitch};
use roux_parser::ast::{ArmBody, Binding, MatchArm, MatchContext, MatchStmt, Pattern, VariantKind};
use roux_shared::{Diagnostic, Span};
use roux_srcmap::Pos;

pub struct MatchLowerer<'a> {
    pub registry: &'a VariantRegistry,
    pub options: &'a crate::LowerOptions,
    pub diagnostics: &'a mut Vec<Diagnostic>,
    /// Per-unit counter for hoisted subject temporaries.
    pub subject_counter: &'a mut usize,
}

/// A pattern resolved against the registry.
enum RPat<'a> {
    Wild,
    Variant {
        info: &'a UnionInfo,
        index: usize,
        binds: &'a [Binding],
    },
}

struct RArm<'a> {
    arm: &'a MatchArm,
    pats: Vec<RPat<'a>>,
}

impl RArm<'_> {
    fn fully_wild(&self) -> bool {
        self.pats.iter().all(|p| matches!(p, RPat::Wild))
    }
}

impl<'a> MatchLowerer<'a> {
    /// Lower one match. Returns `None` when lowering was aborted by a
    /// site error; the diagnostics explain why, and nothing partial is
    /// emitted.
    pub fn lower(&mut self, m: &'a MatchStmt) -> Option<Vec<GoStmt>> {
        let span = Span::point(m.line, m.column);
        let value = !matches!(m.context, MatchContext::Statement);

        let bind = match &m.context {
            MatchContext::Bind { name, ty } => match ty {
                Some(ty) => Some((name.clone(), ty.clone())),
                None => {
                    self.diagnostics.push(
                        Diagnostic::error(format!(
                            "binding '{}' of a match needs a type annotation (var {} T = match …)",
                            name, name
                        ))
                        .with_span(span),
                    );
                    return None;
                }
            },
            _ => None,
        };

        let arms = self.resolve_arms(m)?;
        self.check_duplicate_wildcard(&arms)?;

        let base = *self.subject_counter;
        *self.subject_counter += m.subjects.len();

        let mut stmts: Vec<GoStmt> = m
            .subjects
            .iter()
            .enumerate()
            .map(|(i, s)| GoStmt::Assign {
                lhs: naming::subject_temp(base + i),
                rhs: s.expr.clone(),
                pos: Some(Pos::new(s.line, s.column)),
            })
            .collect();

        let switch_indent = if bind.is_some() {
            format!("{}\t", m.indent)
        } else {
            m.indent.clone()
        };
        // the bool marks arms folded into a specific group through a
        // wildcard; they stay reachable through other groups, so they are
        // never dead code when shadowed in one of them
        let members: Vec<(&RArm, bool)> = arms.iter().map(|r| (r, false)).collect();
        let (sw, exhaustive) = self.build_switch(m, base, 0, &members, switch_indent, value)?;

        if !exhaustive {
            self.diagnostics.push(
                Diagnostic::error(match sw.cases.first() {
                    Some(_) => "match is not exhaustive: every variant needs an unguarded arm or a wildcard arm".to_string(),
                    None => "match has no reachable arms".to_string(),
                })
                .with_span(span),
            );
        }

        match bind {
            Some((name, ty)) => stmts.push(GoStmt::BindMatch {
                name,
                ty,
                switch: sw,
            }),
            None => {
                stmts.push(GoStmt::Switch(sw));
                if matches!(m.context, MatchContext::Return) {
                    // never reached when exhaustiveness holds; it exists so
                    // the enclosing function still returns on every path
                    stmts.push(GoStmt::Panic {
                        message: "unreachable match".to_string(),
                    });
                }
            }
        }
        Some(stmts)
    }

    fn resolve_arms(&mut self, m: &'a MatchStmt) -> Option<Vec<RArm<'a>>> {
        let mut arms = Vec::new();
        let mut failed = false;
        for arm in &m.arms {
            let mut pats = Vec::new();
            for pattern in &arm.patterns {
                match pattern {
                    Pattern::Wildcard => pats.push(RPat::Wild),
                    Pattern::Variant {
                        union,
                        variant,
                        binds,
                    } => {
                        if union.is_none() && !self.options.allow_bare_variants {
                            self.diagnostics.push(
                                Diagnostic::error(format!(
                                    "bare variant '{}' is disabled; qualify it as '<Union>.{}'",
                                    variant, variant
                                ))
                                .with_span(Span::point(arm.line, arm.column)),
                            );
                            failed = true;
                            continue;
                        }
                        match self.registry.resolve(union.as_deref(), variant) {
                            Ok((info, index)) => {
                                if self.check_binds(arm, info, index, binds) {
                                    pats.push(RPat::Variant { info, index, binds });
                                } else {
                                    failed = true;
                                }
                            }
                            Err(err) => {
                                self.diagnostics.push(
                                    Diagnostic::error(err.message())
                                        .with_span(Span::point(arm.line, arm.column)),
                                );
                                failed = true;
                            }
                        }
                    }
                }
            }
            arms.push(RArm { arm, pats });
        }
        if failed { None } else { Some(arms) }
    }

    fn check_binds(
        &mut self,
        arm: &MatchArm,
        info: &UnionInfo,
        index: usize,
        binds: &[Binding],
    ) -> bool {
        let variant = &info.variants[index];
        let fields = variant.field_count();
        if binds.is_empty() {
            return true;
        }
        if variant.is_unit() {
            self.diagnostics.push(
                Diagnostic::error(format!(
                    "variant '{}' carries no payload but the pattern binds {}",
                    variant.name,
                    binds.len()
                ))
                .with_span(Span::point(arm.line, arm.column)),
            );
            return false;
        }
        if binds.len() != fields {
            self.diagnostics.push(
                Diagnostic::error(format!(
                    "variant '{}' has {} fields but the pattern binds {}",
                    variant.name,
                    fields,
                    binds.len()
                ))
                .with_span(Span::point(arm.line, arm.column)),
            );
            return false;
        }
        true
    }

    /// A second arm whose pattern covers everything is a duplicate
    /// default; the host forbids duplicate default labels.
    fn check_duplicate_wildcard(&mut self, arms: &[RArm]) -> Option<()> {
        let mut seen = false;
        for r in arms {
            if r.fully_wild() && r.arm.guard.is_none() {
                if seen {
                    self.diagnostics.push(
                        Diagnostic::error("duplicate wildcard arm: this match already has a default")
                            .with_span(Span::point(r.arm.line, r.arm.column)),
                    );
                    return None;
                }
                seen = true;
            }
        }
        Some(())
    }

    /// Build the switch for one tuple level. Returns the switch and
    /// whether this subtree is exhaustive.
    fn build_switch(
        &mut self,
        m: &MatchStmt,
        base: usize,
        level: usize,
        members: &[(&RArm<'a>, bool)],
        indent: String,
        value: bool,
    ) -> Option<(GoSwitch, bool)> {
        let last = level + 1 == m.subjects.len();
        let subject = format!("{}.Kind", naming::subject_temp(base + level));

        // the union switched over at this level, fixed by the first
        // variant pattern; every other variant pattern must agree
        let mut level_union: Option<&UnionInfo> = None;
        for (r, _) in members {
            if let RPat::Variant { info, index, .. } = &r.pats[level] {
                match level_union {
                    None => level_union = Some(info),
                    Some(expected) if !std::ptr::eq(expected, *info) => {
                        self.diagnostics.push(
                            Diagnostic::error(format!(
                                "variant '{}' is not part of union '{}'",
                                info.variants
                                    .get(*index)
                                    .map(|v| v.name.as_str())
                                    .unwrap_or("?"),
                                expected.name
                            ))
                            .with_span(Span::point(r.arm.line, r.arm.column)),
                        );
                        return None;
                    }
                    Some(_) => {}
                }
            }
        }

        // group arms by discriminant, in order of first appearance; an
        // arm with a wildcard at this level joins every group (it stays
        // reachable through the other discriminants via the default)
        let mut order: Vec<usize> = Vec::new();
        for (r, _) in members {
            if let RPat::Variant { index, .. } = &r.pats[level] {
                if !order.contains(index) {
                    order.push(*index);
                }
            }
        }
        let defaults: Vec<(&RArm, bool)> = members
            .iter()
            .filter(|(r, _)| matches!(r.pats[level], RPat::Wild))
            .copied()
            .collect();

        let mut cases = Vec::new();
        let mut all_groups_covered = true;
        for &variant_idx in &order {
            let group: Vec<(&RArm, bool)> = members
                .iter()
                .filter_map(|&(r, folded)| match &r.pats[level] {
                    RPat::Variant { index, .. } if *index == variant_idx => Some((r, folded)),
                    RPat::Variant { .. } => None,
                    RPat::Wild => Some((r, true)),
                })
                .collect();
            let union = level_union?;
            let label = naming::discriminant(&union.name, &union.variants[variant_idx].name);

            if last {
                let (group_cases, covered) = self.leaf_cases(base, &label, &group, value);
                cases.extend(group_cases);
                all_groups_covered &= covered;
            } else {
                let pos = group
                    .iter()
                    .find(|(r, _)| matches!(r.pats[level], RPat::Variant { .. }))
                    .map(|(r, _)| Pos::new(r.arm.line, r.arm.column));
                let (body, covered) =
                    self.subtree(m, base, level + 1, &group, format!("{}\t", indent), value)?;
                cases.push(GoCase {
                    label,
                    guard: None,
                    binds: Vec::new(),
                    body,
                    pos,
                });
                all_groups_covered &= covered;
            }
        }

        let mut default_covers = false;
        let default = if defaults.is_empty() {
            None
        } else if last {
            let (stmts, covered) =
                self.leaf_segments(base, &defaults, &format!("{}\t", indent), value);
            default_covers = covered;
            Some(stmts)
        } else {
            let (stmts, covered) =
                self.subtree(m, base, level + 1, &defaults, format!("{}\t", indent), value)?;
            default_covers = covered;
            Some(stmts)
        };

        let exhaustive = default_covers
            || (level_union.is_some_and(|u| order.len() == u.variants.len()) && all_groups_covered);

        Some((
            GoSwitch {
                subject,
                cases,
                default,
                indent,
                pos: Some(Pos::new(m.line, m.column)),
            },
            exhaustive,
        ))
    }

    /// Lower a set of arms below `level`: skip levels where every pattern
    /// is a wildcard, emit leaf segments at the end.
    fn subtree(
        &mut self,
        m: &MatchStmt,
        base: usize,
        level: usize,
        members: &[(&RArm<'a>, bool)],
        indent: String,
        value: bool,
    ) -> Option<(Vec<GoStmt>, bool)> {
        if level >= m.subjects.len() {
            return Some(self.leaf_segments(base, members, &indent, value));
        }
        let any_specific = members
            .iter()
            .any(|(r, _)| matches!(r.pats[level], RPat::Variant { .. }));
        if !any_specific {
            return self.subtree(m, base, level + 1, members, indent, value);
        }
        let (sw, exhaustive) = self.build_switch(m, base, level, members, indent, value)?;
        Some((vec![GoStmt::Switch(sw)], exhaustive))
    }

    /// Case entries for one discriminant at the last tuple level. Guarded
    /// arms keep separate entries; anything after the first unguarded arm
    /// is unreachable for this label.
    fn leaf_cases(
        &mut self,
        base: usize,
        label: &str,
        group: &[(&RArm, bool)],
        value: bool,
    ) -> (Vec<GoCase>, bool) {
        let mut cases = Vec::new();
        let mut covered = false;
        for &(r, folded) in group {
            if covered {
                if !folded {
                    self.warn_unreachable(r);
                }
                continue;
            }
            let body = self.body_stmts(r, value);
            cases.push(GoCase {
                label: label.to_string(),
                guard: r.arm.guard.clone(),
                binds: self.bind_stmts(base, r),
                body,
                pos: Some(Pos::new(r.arm.line, r.arm.column)),
            });
            if r.arm.guard.is_none() {
                covered = true;
            }
        }
        (cases, covered)
    }

    /// Sequential arm segments outside a dedicated case: the default
    /// branch, or trailing all-wildcard levels. Guarded segments break
    /// out of the enclosing switch on success.
    fn leaf_segments(
        &mut self,
        base: usize,
        members: &[(&RArm, bool)],
        indent: &str,
        value: bool,
    ) -> (Vec<GoStmt>, bool) {
        let mut stmts = Vec::new();
        let mut covered = false;
        for &(r, folded) in members {
            if covered {
                if !folded {
                    self.warn_unreachable(r);
                }
                continue;
            }
            let binds = self.bind_stmts(base, r);
            let body = self.body_stmts(r, value);
            match &r.arm.guard {
                Some(guard) => {
                    stmts.extend(binds);
                    let terminal = body.last().is_some_and(GoStmt::is_terminal);
                    let mut inner = body;
                    if !terminal {
                        inner.push(GoStmt::raw("break"));
                    }
                    stmts.push(GoStmt::Block {
                        header: format!("{}if {} {{", indent, guard),
                        body: inner,
                        closer: format!("{}}}", indent),
                        line: None,
                    });
                }
                None => {
                    stmts.extend(binds);
                    stmts.extend(body);
                    covered = true;
                }
            }
        }
        (stmts, covered)
    }

    /// Binding-extraction statements for every tuple position of an arm.
    fn bind_stmts(&mut self, base: usize, r: &RArm) -> Vec<GoStmt> {
        let mut stmts = Vec::new();
        for (i, pat) in r.pats.iter().enumerate() {
            let RPat::Variant { info, index, binds } = pat else {
                continue;
            };
            let variant = &info.variants[*index];
            for (j, bind) in binds.iter().enumerate() {
                let Binding::Name(name) = bind else { continue };
                let field = match &variant.kind {
                    VariantKind::Named(fields) => naming::exported_field(&fields[j].name),
                    VariantKind::Positional(_) => naming::positional_field(j),
                    VariantKind::Unit => continue,
                };
                stmts.push(GoStmt::raw(format!(
                    "{} := {}.{}.{}",
                    name,
                    naming::subject_temp(base + i),
                    variant.name,
                    field
                )));
            }
        }
        stmts
    }

    /// An arm body in statement or value position. In value position the
    /// terminal expression becomes an explicit return — a bare expression
    /// statement is invalid there in the host model.
    fn body_stmts(&mut self, r: &RArm, value: bool) -> Vec<GoStmt> {
        match &r.arm.body {
            ArmBody::Expr(e) => {
                if value {
                    vec![GoStmt::Return {
                        expr: Some(e.clone()),
                    }]
                } else {
                    vec![GoStmt::raw(e.clone())]
                }
            }
            ArmBody::Block(lines) => {
                for line in lines {
                    if line.starts_with("match ") {
                        self.diagnostics.push(
                            Diagnostic::error(
                                "a match inside a match arm block is not supported; bind it outside the arm",
                            )
                            .with_span(Span::point(r.arm.line, r.arm.column)),
                        );
                    }
                }
                let mut stmts: Vec<GoStmt> = Vec::new();
                if value {
                    let Some((terminal, rest)) = lines.split_last() else {
                        self.diagnostics.push(
                            Diagnostic::error("empty arm body in a value-producing match")
                                .with_span(Span::point(r.arm.line, r.arm.column)),
                        );
                        return stmts;
                    };
                    stmts.extend(rest.iter().map(GoStmt::raw));
                    stmts.push(GoStmt::Return {
                        expr: Some(terminal.clone()),
                    });
                } else {
                    stmts.extend(lines.iter().map(GoStmt::raw));
                }
                stmts
            }
        }
    }

    fn warn_unreachable(&mut self, r: &RArm) {
        self.diagnostics.push(
            Diagnostic::warning("unreachable match arm")
                .with_span(Span::point(r.arm.line, r.arm.column)),
        );
    }
}
