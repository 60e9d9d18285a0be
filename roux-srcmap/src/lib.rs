//! Position map engine for the Roux pipeline.
//!
//! Every pipeline stage that rewrites text (preprocessor passes, tree
//! lowering + emission) produces a [`StageMap`]: positional deltas for the
//! parts it merely shifted, and token-level [`Mapping`]s for the parts it
//! moved or rewrote. A [`CompositeMap`] chains stage maps transitively so
//! diagnostics tooling can translate generated positions all the way back
//! to the original surface source, and project a flat [`TranslationTable`]
//! for persistence.

pub mod map;
pub mod mapping;

pub use map::{CompositeMap, Delta, StageMap, TranslationTable};
pub use mapping::{Mapping, MappingKind, Pos};
