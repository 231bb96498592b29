use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::engine::score_evidence;
use super::error::ScoringError;
use super::points::{framework, PointsTable};
use super::types::{CurationType, EvidenceAttributes};
use super::validation::ClassificationTier;
use crate::markers::{Allele, Haplotype};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    InProgress,
    Done,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evidence {
    pub status: Status,
    pub attributes: EvidenceAttributes,
}

/// A curation of one allele or haplotype against a disease.
#[derive(Debug, Clone, PartialEq)]
pub struct Curation {
    /// `None` until the curation has been saved once.
    pub id: Option<u64>,
    pub curation_type: CurationType,
    pub allele: Option<Allele>,
    pub haplotype: Option<Haplotype>,
    pub disease: Option<String>,
    pub classification: ClassificationTier,
    pub status: Status,
    pub evidence: Vec<Evidence>,
}

impl Curation {
    /// Resolution used for steps 1B and 6B of every evidence record.
    ///
    /// Falls back to 1 when the curation's marker is missing.
    pub fn num_fields(&self) -> u32 {
        match self.curation_type {
            CurationType::Allele => self.allele.as_ref().map_or(1, Allele::num_fields),
            CurationType::Haplotype => self.haplotype.as_ref().map_or(1, Haplotype::num_fields),
        }
    }

    /// Name of the allele or haplotype under curation, if one is set.
    pub fn marker_name(&self) -> Option<&str> {
        match self.curation_type {
            CurationType::Allele => self.allele.as_ref().map(|a| a.name.as_str()),
            CurationType::Haplotype => self.haplotype.as_ref().map(|h| h.name.as_str()),
        }
    }

    /// Evidence attributes with the curation-level facts filled in.
    pub fn evidence_attributes(&self) -> Vec<EvidenceAttributes> {
        let num_fields = self.num_fields();
        self.evidence
            .iter()
            .map(|e| EvidenceAttributes {
                curation_type: Some(self.curation_type),
                num_fields,
                ..e.attributes.clone()
            })
            .collect()
    }

    pub fn score(&self) -> Result<Decimal, ScoringError> {
        curation_score(&self.evidence_attributes())
    }
}

/// Where a curation's evidence comes from.
///
/// Implementations must hand back a consistent snapshot; the aggregator does
/// not guard against concurrent writers.
pub trait EvidenceSource {
    type Error;

    fn evidence_for_curation(
        &self,
        curation_id: u64,
    ) -> Result<Vec<EvidenceAttributes>, Self::Error>;
}

impl EvidenceSource for [Curation] {
    type Error = String;

    fn evidence_for_curation(
        &self,
        curation_id: u64,
    ) -> Result<Vec<EvidenceAttributes>, Self::Error> {
        self.iter()
            .find(|c| c.id == Some(curation_id))
            .map(Curation::evidence_attributes)
            .ok_or_else(|| format!("no curation with id {}", curation_id))
    }
}

/// Signed total of the included evidence against the framework table.
pub fn curation_score(evidence: &[EvidenceAttributes]) -> Result<Decimal, ScoringError> {
    curation_score_with(evidence, framework()?)
}

/// Signed total of the included evidence.
///
/// Conflicting evidence subtracts its score. Excluded evidence is skipped
/// without being scored.
pub fn curation_score_with(
    evidence: &[EvidenceAttributes],
    table: &PointsTable,
) -> Result<Decimal, ScoringError> {
    evidence
        .iter()
        .filter(|e| e.is_included)
        .try_fold(Decimal::ZERO, |total, e| {
            let score = score_evidence(e, table)?.score;
            Ok(if e.is_conflicting {
                total - score
            } else {
                total + score
            })
        })
}

/// Fetch a curation's evidence from `source` and aggregate it.
pub fn curation_score_from<S>(source: &S, curation_id: u64) -> Result<Decimal, ScoringError>
where
    S: EvidenceSource + ?Sized,
    S::Error: Display,
{
    let evidence = source
        .evidence_for_curation(curation_id)
        .map_err(|e| ScoringError::Source(e.to_string()))?;
    curation_score(&evidence)
}
