pub mod curation;
pub mod engine;
pub mod error;
pub mod interval;
pub mod points;
pub mod steps;
pub mod types;
pub mod validation;

pub use curation::{
    curation_score, curation_score_from, curation_score_with, Curation, Evidence, EvidenceSource,
    Status,
};
pub use engine::{evidence_score, score_evidence, EvidenceScore, StepContribution};
pub use error::ScoringError;
pub use interval::{Bound, Domain, Interval};
pub use points::{framework, CombineOp, Family, LookupKey, PointsTable, Step};
pub use steps::StepPoints;
pub use types::*;
pub use validation::{
    validate_classification, validate_curation, ClassificationTier, FieldError, RejectionReason,
};
