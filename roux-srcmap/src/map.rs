//! Stage maps, transitive composition, and the flat translation table.
//!
//! A stage records two things while rewriting text. `Delta`s describe pure
//! positional drift (a keyword grew by two columns, three lines were
//! inserted) and apply to every position at or after their anchor.
//! `Mapping`s anchor tokens the stage moved or rewrote. Translation through
//! a stage prefers an exact containing mapping, then a nearby mapping on
//! the same line, and finally falls back to delta arithmetic, which
//! degenerates to identity where the stage touched nothing.

use crate::mapping::{Mapping, MappingKind, Pos};

/// Maximum column distance for the nearest-mapping fallback.
const NEARBY_COLUMNS: usize = 8;

/// A positional shift recorded in the *input* coordinate space of the
/// stage that produced it. Positions at or after `(line, column)` shift by
/// `line_delta` lines; positions on the same input line additionally shift
/// by `col_delta` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delta {
    pub line: usize,
    pub column: usize,
    pub line_delta: isize,
    pub col_delta: isize,
}

impl Delta {
    pub fn new(line: usize, column: usize, line_delta: isize, col_delta: isize) -> Self {
        Delta {
            line,
            column,
            line_delta,
            col_delta,
        }
    }

    fn applies_to(anchor: Pos, pos: Pos) -> bool {
        anchor.line < pos.line || (anchor.line == pos.line && anchor.column <= pos.column)
    }
}

/// The positional record of one rewrite stage: input space on one side,
/// output space on the other. Deltas and mappings are append-only and must
/// be pushed in input-position order (passes scan top to bottom, so this
/// holds by construction).
#[derive(Debug, Clone, Default)]
pub struct StageMap {
    deltas: Vec<Delta>,
    mappings: Vec<Mapping>,
}

impl StageMap {
    pub fn new() -> Self {
        StageMap::default()
    }

    pub fn push_delta(&mut self, delta: Delta) {
        self.deltas.push(delta);
    }

    pub fn push_mapping(&mut self, mapping: Mapping) {
        self.mappings.push(mapping);
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty() && self.mappings.is_empty()
    }

    /// Pure delta arithmetic, input → output.
    pub fn shift_forward(&self, pos: Pos) -> Pos {
        let mut line = pos.line as isize;
        let mut column = pos.column as isize;
        for d in &self.deltas {
            if Delta::applies_to(Pos::new(d.line, d.column), pos) {
                line += d.line_delta;
                if d.line == pos.line {
                    column += d.col_delta;
                }
            }
        }
        clamp_pos(line, column)
    }

    /// Pure delta arithmetic, output → input. Each delta's anchor is first
    /// carried into output space by the deltas recorded before it.
    pub fn shift_back(&self, pos: Pos) -> Pos {
        let mut line = pos.line as isize;
        let mut column = pos.column as isize;
        for (i, d) in self.deltas.iter().enumerate() {
            let anchor = self.anchor_in_output(i, d);
            if Delta::applies_to(anchor, pos) {
                line -= d.line_delta;
                if anchor.line == pos.line {
                    column -= d.col_delta;
                }
            }
        }
        clamp_pos(line, column)
    }

    /// A delta's anchor carried into output space, including its own
    /// shift, so that `shift_back` inverts `shift_forward` exactly for
    /// positions that have a preimage.
    fn anchor_in_output(&self, index: usize, delta: &Delta) -> Pos {
        let mut line = delta.line as isize;
        let mut column = delta.column as isize;
        for d in &self.deltas[..=index] {
            if Delta::applies_to(
                Pos::new(d.line, d.column),
                Pos::new(delta.line, delta.column),
            ) {
                line += d.line_delta;
                if d.line == delta.line {
                    column += d.col_delta;
                }
            }
        }
        clamp_pos(line, column)
    }

    /// Input-space position → output-space position.
    pub fn to_generated(&self, pos: Pos) -> Pos {
        if let Some(m) = best_mapping(&self.mappings, pos, Side::Original) {
            return m.generated_pos();
        }
        self.shift_forward(pos)
    }

    /// Output-space position → input-space position.
    pub fn to_original(&self, pos: Pos) -> Pos {
        if let Some(m) = best_mapping(&self.mappings, pos, Side::Generated) {
            return m.original_pos();
        }
        self.shift_back(pos)
    }
}

fn clamp_pos(line: isize, column: isize) -> Pos {
    Pos::new(line.max(1) as usize, column.max(1) as usize)
}

#[derive(Clone, Copy)]
enum Side {
    Original,
    Generated,
}

/// Containment first (larger length wins among multiple containers), then
/// the nearest mapping within `NEARBY_COLUMNS` on the same line.
fn best_mapping(mappings: &[Mapping], pos: Pos, side: Side) -> Option<&Mapping> {
    let contains = |m: &Mapping| match side {
        Side::Original => m.contains_original(pos),
        Side::Generated => m.contains_generated(pos),
    };
    let distance = |m: &Mapping| match side {
        Side::Original => m.original_distance(pos),
        Side::Generated => m.generated_distance(pos),
    };

    if let Some(best) = mappings
        .iter()
        .filter(|m| contains(m))
        .max_by_key(|m| m.length)
    {
        return Some(best);
    }

    mappings
        .iter()
        .filter_map(|m| distance(m).map(|d| (m, d)))
        .filter(|&(_, d)| d > 0 && d <= NEARBY_COLUMNS)
        .min_by(|(a, da), (b, db)| da.cmp(db).then(b.length.cmp(&a.length)))
        .map(|(m, _)| m)
}

/// An ordered chain of stage maps: stage 0's input is the original surface
/// source, the last stage's output is the generated host text. Translation
/// chains the stages transitively rather than consulting them as
/// independent tables.
#[derive(Debug, Default)]
pub struct CompositeMap {
    stages: Vec<StageMap>,
}

impl CompositeMap {
    pub fn new() -> Self {
        CompositeMap::default()
    }

    pub fn push_stage(&mut self, stage: StageMap) {
        self.stages.push(stage);
    }

    /// Original-space position → generated-space position.
    pub fn to_generated(&self, pos: Pos) -> Pos {
        self.stages.iter().fold(pos, |p, s| s.to_generated(p))
    }

    /// Generated-space position → original-space position.
    pub fn to_original(&self, pos: Pos) -> Pos {
        self.stages.iter().rev().fold(pos, |p, s| s.to_original(p))
    }

    /// Project every stage's mappings into a single original↔generated
    /// table: a stage-`i` mapping has its input side pulled back through
    /// stages `0..i` and its output side pushed forward through stages
    /// `i+1..`.
    pub fn table(&self) -> TranslationTable {
        let mut projected = Vec::new();
        for (i, stage) in self.stages.iter().enumerate() {
            for m in stage.mappings() {
                let original = self.stages[..i]
                    .iter()
                    .rev()
                    .fold(m.original_pos(), |p, s| s.to_original(p));
                let generated = self.stages[i + 1..]
                    .iter()
                    .fold(m.generated_pos(), |p, s| s.to_generated(p));
                projected.push(Mapping::new(
                    original,
                    generated,
                    m.length,
                    m.kind,
                    m.name.clone(),
                ));
            }
        }
        TranslationTable::from_mappings(projected)
    }
}

/// The flat, persisted translation table: all mappings for one compilation
/// unit, sorted by generated position. The producer guarantees and
/// documents the sort; consumers may rely on it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TranslationTable {
    mappings: Vec<Mapping>,
}

impl TranslationTable {
    pub fn from_mappings(mut mappings: Vec<Mapping>) -> Self {
        mappings.sort_by_key(|m| (m.generated_line, m.generated_column));
        TranslationTable { mappings }
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Generated position → original position: exact containing mapping
    /// (larger length wins), else nearest within a small column distance,
    /// else the position unchanged.
    pub fn to_original(&self, pos: Pos) -> Pos {
        best_mapping(&self.mappings, pos, Side::Generated)
            .map(Mapping::original_pos)
            .unwrap_or(pos)
    }

    /// Original position → generated position, same policy mirrored.
    pub fn to_generated(&self, pos: Pos) -> Pos {
        best_mapping(&self.mappings, pos, Side::Original)
            .map(Mapping::generated_pos)
            .unwrap_or(pos)
    }

    /// Chain two tables: `first` maps A→B, `second` maps B→C, the result
    /// maps A→C. Composing with an empty (identity) table on either side
    /// yields the same table.
    pub fn compose(first: &TranslationTable, second: &TranslationTable) -> TranslationTable {
        let mut out: Vec<Mapping> = first
            .mappings
            .iter()
            .map(|m| {
                let generated = second.to_generated(m.generated_pos());
                Mapping::new(m.original_pos(), generated, m.length, m.kind, m.name.clone())
            })
            .collect();
        for m in &second.mappings {
            let original = first.to_original(m.original_pos());
            let projected =
                Mapping::new(original, m.generated_pos(), m.length, m.kind, m.name.clone());
            if !out.contains(&projected) {
                out.push(projected);
            }
        }
        TranslationTable::from_mappings(out)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.mappings)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let mappings: Vec<Mapping> = serde_json::from_str(text)?;
        Ok(TranslationTable::from_mappings(mappings))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ident(orig: (usize, usize), generated: (usize, usize), len: usize, name: &str) -> Mapping {
        Mapping::new(
            Pos::new(orig.0, orig.1),
            Pos::new(generated.0, generated.1),
            len,
            MappingKind::Identifier,
            Some(name.to_string()),
        )
    }

    fn op(orig: (usize, usize), generated: (usize, usize)) -> Mapping {
        Mapping::new(
            Pos::new(orig.0, orig.1),
            Pos::new(generated.0, generated.1),
            1,
            MappingKind::Operator,
            None,
        )
    }

    // ─── Delta arithmetic ────────────────────────────────────────────────

    #[test]
    fn test_shift_forward_column_growth() {
        let mut stage = StageMap::new();
        // "fn" grew to "func": +2 columns from column 3 onward on line 1
        stage.push_delta(Delta::new(1, 3, 0, 2));
        assert_eq!(stage.shift_forward(Pos::new(1, 4)), Pos::new(1, 6));
        assert_eq!(stage.shift_forward(Pos::new(1, 2)), Pos::new(1, 2));
        assert_eq!(stage.shift_forward(Pos::new(2, 4)), Pos::new(2, 4));
    }

    #[test]
    fn test_shift_forward_line_insertion() {
        let mut stage = StageMap::new();
        // two lines inserted after line 4
        stage.push_delta(Delta::new(5, 1, 2, 0));
        assert_eq!(stage.shift_forward(Pos::new(4, 7)), Pos::new(4, 7));
        assert_eq!(stage.shift_forward(Pos::new(5, 1)), Pos::new(7, 1));
        assert_eq!(stage.shift_forward(Pos::new(9, 3)), Pos::new(11, 3));
    }

    #[test]
    fn test_shift_back_inverts_forward() {
        let mut stage = StageMap::new();
        stage.push_delta(Delta::new(1, 3, 0, 2));
        stage.push_delta(Delta::new(3, 1, 2, 0));
        stage.push_delta(Delta::new(6, 5, 0, -4));
        for &(line, column) in &[(1, 1), (1, 5), (2, 2), (3, 1), (6, 5), (6, 9), (8, 2)] {
            let p = Pos::new(line, column);
            assert_eq!(stage.shift_back(stage.shift_forward(p)), p, "at {:?}", p);
        }
    }

    // ─── Stage translation ───────────────────────────────────────────────

    #[test]
    fn test_stage_prefers_mapping_over_delta() {
        let mut stage = StageMap::new();
        stage.push_mapping(ident((2, 5), (4, 9), 4, "data"));
        stage.push_delta(Delta::new(3, 1, 2, 0));
        // inside the mapping's generated span: anchored result
        assert_eq!(stage.to_original(Pos::new(4, 11)), Pos::new(2, 5));
        // far from any mapping: delta arithmetic
        assert_eq!(stage.to_original(Pos::new(9, 3)), Pos::new(7, 3));
    }

    // ─── Translation table policy ────────────────────────────────────────

    #[test]
    fn test_containment_invariant() {
        let m = ident((3, 8), (7, 12), 5, "parse");
        let table = TranslationTable::from_mappings(vec![m.clone()]);
        for col in 12..17 {
            assert_eq!(table.to_original(Pos::new(7, col)), Pos::new(3, 8));
        }
        // well past the span and the nearest-mapping threshold: identity
        assert_eq!(table.to_original(Pos::new(7, 30)), Pos::new(7, 30));
    }

    #[test]
    fn test_larger_length_wins_over_operator() {
        // identifier span overlapping a one-column operator mapping
        let table = TranslationTable::from_mappings(vec![
            op((1, 20), (5, 10)),
            ident((1, 12), (5, 8), 6, "reader"),
        ]);
        assert_eq!(table.to_original(Pos::new(5, 10)), Pos::new(1, 12));
    }

    #[test]
    fn test_nearest_fallback_within_threshold() {
        let table = TranslationTable::from_mappings(vec![ident((2, 4), (6, 10), 3, "cfg")]);
        // 2 columns right of the span end: nearest wins
        assert_eq!(table.to_original(Pos::new(6, 14)), Pos::new(2, 4));
        // far away: identity
        assert_eq!(table.to_original(Pos::new(6, 40)), Pos::new(6, 40));
        // other line: identity
        assert_eq!(table.to_original(Pos::new(7, 11)), Pos::new(7, 11));
    }

    #[test]
    fn test_reverse_direction_same_policy() {
        let table = TranslationTable::from_mappings(vec![ident((2, 4), (6, 10), 3, "cfg")]);
        assert_eq!(table.to_generated(Pos::new(2, 5)), Pos::new(6, 10));
        assert_eq!(table.to_generated(Pos::new(2, 9)), Pos::new(6, 10));
        assert_eq!(table.to_generated(Pos::new(9, 9)), Pos::new(9, 9));
    }

    // ─── Composition ─────────────────────────────────────────────────────

    #[test]
    fn test_compose_identity_is_idempotent() {
        let table = TranslationTable::from_mappings(vec![
            ident((1, 3), (2, 7), 4, "x"),
            op((4, 9), (8, 1)),
        ]);
        let identity = TranslationTable::default();
        assert_eq!(TranslationTable::compose(&identity, &table), table);
        assert_eq!(TranslationTable::compose(&table, &identity), table);
    }

    #[test]
    fn test_composite_chains_stages() {
        // stage 1: keyword growth on line 1; stage 2: two lines inserted
        // before line 1's successors
        let mut s1 = StageMap::new();
        s1.push_delta(Delta::new(1, 3, 0, 2));
        let mut s2 = StageMap::new();
        s2.push_delta(Delta::new(2, 1, 2, 0));

        let mut composite = CompositeMap::new();
        composite.push_stage(s1);
        composite.push_stage(s2);

        assert_eq!(composite.to_generated(Pos::new(1, 4)), Pos::new(1, 6));
        assert_eq!(composite.to_generated(Pos::new(3, 2)), Pos::new(5, 2));
        assert_eq!(composite.to_original(Pos::new(5, 2)), Pos::new(3, 2));
    }

    #[test]
    fn test_table_projection_through_later_stage() {
        // a mapping recorded by stage 1 whose generated side then drifts
        // two lines in stage 2
        let mut s1 = StageMap::new();
        s1.push_mapping(ident((2, 5), (2, 1), 4, "data"));
        let mut s2 = StageMap::new();
        s2.push_delta(Delta::new(1, 1, 2, 0));

        let mut composite = CompositeMap::new();
        composite.push_stage(s1);
        composite.push_stage(s2);

        let table = composite.table();
        assert_eq!(table.mappings().len(), 1);
        let m = &table.mappings()[0];
        assert_eq!(m.generated_pos(), Pos::new(4, 1));
        assert_eq!(m.original_pos(), Pos::new(2, 5));
    }

    #[test]
    fn test_table_sorted_by_generated_position() {
        let table = TranslationTable::from_mappings(vec![
            ident((1, 1), (9, 2), 2, "b"),
            ident((2, 1), (3, 5), 2, "a"),
            ident((3, 1), (3, 1), 2, "c"),
        ]);
        let positions: Vec<_> = table.mappings().iter().map(Mapping::generated_pos).collect();
        assert_eq!(
            positions,
            vec![Pos::new(3, 1), Pos::new(3, 5), Pos::new(9, 2)]
        );
    }

    #[test]
    fn test_json_round_trip() {
        let table = TranslationTable::from_mappings(vec![
            ident((1, 3), (2, 7), 4, "x"),
            op((4, 9), (8, 1)),
        ]);
        let json = table.to_json().unwrap();
        let back = TranslationTable::from_json(&json).unwrap();
        assert_eq!(back, table);
    }
}
