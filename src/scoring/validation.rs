use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::curation::{Curation, Status};
use super::error::ScoringError;
use super::types::CurationType;

/// Curator-assigned strength of a gene/disease association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationTier {
    #[default]
    NoKnownAssociation,
    Limited,
    Moderate,
    Strong,
    Definitive,
}

impl ClassificationTier {
    pub fn label(&self) -> &'static str {
        match self {
            ClassificationTier::NoKnownAssociation => "No Known Association",
            ClassificationTier::Limited => "Limited",
            ClassificationTier::Moderate => "Moderate",
            ClassificationTier::Strong => "Strong",
            ClassificationTier::Definitive => "Definitive",
        }
    }

    /// Whether `score` is allowed for this tier.
    ///
    /// Strong and Definitive share the same threshold; the score alone cannot
    /// tell them apart.
    pub fn admits(&self, score: Decimal) -> bool {
        match self {
            ClassificationTier::NoKnownAssociation => score.is_zero(),
            ClassificationTier::Limited => score < dec!(25),
            ClassificationTier::Moderate => dec!(25) <= score && score <= dec!(50),
            ClassificationTier::Strong | ClassificationTier::Definitive => score >= dec!(50),
        }
    }

    fn requirement(&self) -> &'static str {
        match self {
            ClassificationTier::NoKnownAssociation => "Score must be 0.",
            ClassificationTier::Limited => "Score must be less than 25.",
            ClassificationTier::Moderate => "Score must be in 25-50.",
            ClassificationTier::Strong | ClassificationTier::Definitive => {
                "Score must be at least 50."
            }
        }
    }
}

impl fmt::Display for ClassificationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a classification does not fit its score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectionReason {
    pub tier: ClassificationTier,
    pub score: Decimal,
    pub message: &'static str,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (score {}, classified {})", self.message, self.score.normalize(), self.tier)
    }
}

/// A rejected field, reported back to whoever filled the form in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check an asserted classification against the curation score.
pub fn validate_classification(
    tier: ClassificationTier,
    score: Decimal,
) -> Result<(), RejectionReason> {
    if tier.admits(score) {
        Ok(())
    } else {
        Err(RejectionReason {
            tier,
            score,
            message: tier.requirement(),
        })
    }
}

/// Validate a curation before it is saved.
///
/// Returns every rejected field at once (empty when the curation is valid).
/// A curation without an id is being created and has no evidence to
/// contradict its classification, so that check is skipped. A broken
/// framework table comes back as `Err`, never as a field rejection.
pub fn validate_curation(curation: &Curation) -> Result<Vec<FieldError>, ScoringError> {
    let mut errors = Vec::new();

    if curation.status == Status::Done
        && curation
            .evidence
            .iter()
            .any(|e| e.status == Status::InProgress && e.attributes.is_included)
    {
        errors.push(FieldError::new(
            "status",
            "All included evidence must be marked as done.",
        ));
    }

    match curation.curation_type {
        CurationType::Allele if curation.allele.is_none() => {
            errors.push(FieldError::new(
                "allele",
                "An allele is required for an allele curation.",
            ));
        }
        CurationType::Haplotype if curation.haplotype.is_none() => {
            errors.push(FieldError::new(
                "haplotype",
                "A haplotype is required for a haplotype curation.",
            ));
        }
        _ => {}
    }

    if curation.id.is_some() {
        let score = curation.score()?;
        if let Err(reason) = validate_classification(curation.classification, score) {
            errors.push(FieldError::new("classification", reason.message));
        }
    }

    Ok(errors)
}
