use rust_decimal::Decimal;
use thiserror::Error;

use super::points::{Family, Step};

/// Errors raised by the scoring engine.
///
/// Ordinary gaps in the evidence are not errors; they score as
/// [`StepPoints::NotDetermined`](super::steps::StepPoints). These variants
/// cover a broken framework table and failures of the evidence store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    /// An interval family in the points table has a gap, an overlap, or does
    /// not cover the whole line. Only raised while building the table.
    #[error("framework defect in step {step} ({family}): {reason}")]
    ConfigurationDefect {
        step: Step,
        family: Family,
        reason: String,
    },

    /// A value fell outside every bucket of a step.
    #[error("step {step}: value {value} matched no {family} bucket")]
    UnmatchedValue {
        step: Step,
        value: Decimal,
        family: Family,
    },

    /// The evidence store failed to produce a curation's evidence.
    #[error("evidence source error: {0}")]
    Source(String),
}
