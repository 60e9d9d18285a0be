//! Shared infrastructure for the Roux compiler crates.
//!
//! Holds the telemetry types (spans, diagnostics, compile context) used by
//! every pipeline stage to report positions against the original surface
//! source rather than generated text.

pub mod scan;
pub mod telemetry;

pub use telemetry::{CompileContext, Diagnostic, Emitter, Severity, Span, format_diagnostic};
