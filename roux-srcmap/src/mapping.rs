//! Mapping records: one correspondence between an input-side position and
//! an output-side position, valid for `length` columns on the output side.

use serde::{Deserialize, Serialize};

/// A 1-based (line, column) position in some coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
}

impl Pos {
    pub fn new(line: usize, column: usize) -> Self {
        Pos { line, column }
    }
}

/// What a mapping anchors. Identifier and expression mappings are longer
/// and more informative than single-character operator mappings; the
/// translation tie-break prefers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingKind {
    Identifier,
    Expression,
    Operator,
}

/// One recorded correspondence. Append-only: built once at the rewrite
/// site that produced the span, never mutated afterwards.
///
/// Within a single stage, "original" means the stage's input space and
/// "generated" its output space; after projection through a
/// [`crate::CompositeMap`], they mean surface source and final host text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub original_line: usize,
    pub original_column: usize,
    pub generated_line: usize,
    pub generated_column: usize,
    pub length: usize,
    pub kind: MappingKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
}

impl Mapping {
    pub fn new(
        original: Pos,
        generated: Pos,
        length: usize,
        kind: MappingKind,
        name: Option<String>,
    ) -> Self {
        Mapping {
            original_line: original.line,
            original_column: original.column,
            generated_line: generated.line,
            generated_column: generated.column,
            length: length.max(1),
            kind,
            name,
        }
    }

    pub fn original_pos(&self) -> Pos {
        Pos::new(self.original_line, self.original_column)
    }

    pub fn generated_pos(&self) -> Pos {
        Pos::new(self.generated_line, self.generated_column)
    }

    /// True when `pos` falls inside this mapping's generated-side span:
    /// same line, column in `[generated_column, generated_column+length)`.
    pub fn contains_generated(&self, pos: Pos) -> bool {
        pos.line == self.generated_line
            && pos.column >= self.generated_column
            && pos.column < self.generated_column + self.length
    }

    /// The original-side span uses the same length bound.
    pub fn contains_original(&self, pos: Pos) -> bool {
        pos.line == self.original_line
            && pos.column >= self.original_column
            && pos.column < self.original_column + self.length
    }

    /// Column distance from `pos` to the generated-side span on the same
    /// line, or `None` for other lines.
    pub fn generated_distance(&self, pos: Pos) -> Option<usize> {
        if pos.line != self.generated_line {
            return None;
        }
        Some(span_distance(
            pos.column,
            self.generated_column,
            self.length,
        ))
    }

    pub fn original_distance(&self, pos: Pos) -> Option<usize> {
        if pos.line != self.original_line {
            return None;
        }
        Some(span_distance(pos.column, self.original_column, self.length))
    }
}

fn span_distance(column: usize, start: usize, length: usize) -> usize {
    if column < start {
        start - column
    } else if column >= start + length {
        column - (start + length - 1)
    } else {
        0
    }
}
