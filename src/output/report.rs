use rust_decimal::Decimal;
use serde::Serialize;

use crate::scoring::{
    curation_score_with, score_evidence, validate_classification, ClassificationTier, Curation,
    EvidenceScore, PointsTable, ScoringError,
};

/// One evidence record as shown to the curator.
#[derive(Debug, Clone, Serialize)]
pub struct EvidenceReport {
    /// 1-based position within the curation.
    pub index: usize,
    pub included: bool,
    pub conflicting: bool,
    /// `None` for excluded evidence, which is never scored.
    pub score: Option<EvidenceScore>,
}

/// A curation's score and how each evidence record got there.
#[derive(Debug, Clone, Serialize)]
pub struct CurationReport {
    pub id: Option<u64>,
    pub marker: Option<String>,
    pub disease: Option<String>,
    pub classification: ClassificationTier,
    pub score: Decimal,
    /// Set when the classification does not fit the score.
    pub rejection: Option<String>,
    pub evidence: Vec<EvidenceReport>,
}

impl CurationReport {
    /// Score `curation` against `table`.
    pub fn build(curation: &Curation, table: &PointsTable) -> Result<Self, ScoringError> {
        let attributes = curation.evidence_attributes();

        let evidence = attributes
            .iter()
            .enumerate()
            .map(|(i, attrs)| -> Result<EvidenceReport, ScoringError> {
                let score = if attrs.is_included {
                    Some(score_evidence(attrs, table)?)
                } else {
                    None
                };
                Ok(EvidenceReport {
                    index: i + 1,
                    included: attrs.is_included,
                    conflicting: attrs.is_conflicting,
                    score,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let score = curation_score_with(&attributes, table)?;
        let rejection = validate_classification(curation.classification, score)
            .err()
            .map(|reason| reason.message.to_string());

        Ok(Self {
            id: curation.id,
            marker: curation.marker_name().map(str::to_string),
            disease: curation.disease.clone(),
            classification: curation.classification,
            score,
            rejection,
            evidence,
        })
    }

    /// Heading used in terminal output: marker, disease and id when known.
    pub fn title(&self) -> String {
        let mut title = self.marker.clone().unwrap_or_else(|| "(no marker)".to_string());
        if let Some(disease) = &self.disease {
            title.push_str(" / ");
            title.push_str(disease);
        }
        match self.id {
            Some(id) => format!("#{} {}", id, title),
            None => title,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::Allele;
    use crate::scoring::{
        framework, CurationType, Evidence, EvidenceAttributes, Status, TypingMethod,
    };
    use rust_decimal_macros::dec;

    fn curation() -> Curation {
        let attributes = EvidenceAttributes {
            typing_method: Some(TypingMethod::SangerSeq),
            has_association: true,
            ..Default::default()
        };
        Curation {
            id: Some(4),
            curation_type: CurationType::Allele,
            allele: Some(Allele::new("DRB1*15:01")),
            haplotype: None,
            disease: Some("multiple sclerosis".to_string()),
            classification: ClassificationTier::Limited,
            status: Status::InProgress,
            evidence: vec![
                Evidence {
                    status: Status::Done,
                    attributes: attributes.clone(),
                },
                Evidence {
                    status: Status::Done,
                    attributes: EvidenceAttributes {
                        is_included: false,
                        ..attributes
                    },
                },
            ],
        }
    }

    #[test]
    fn test_build_report() {
        let report = CurationReport::build(&curation(), framework().unwrap()).unwrap();
        // allele 0 + 2 fields 1 + Sanger 4
        assert_eq!(report.score, dec!(5));
        assert_eq!(report.rejection, None);
        assert_eq!(report.evidence.len(), 2);
        assert_eq!(report.evidence[0].score.as_ref().map(|s| s.score), Some(dec!(5)));
        assert!(report.evidence[1].score.is_none());
        assert_eq!(report.title(), "#4 DRB1*15:01 / multiple sclerosis");
    }

    #[test]
    fn test_report_flags_rejected_classification() {
        let mut curation = curation();
        curation.classification = ClassificationTier::Moderate;
        let report = CurationReport::build(&curation, framework().unwrap()).unwrap();
        assert_eq!(report.rejection.as_deref(), Some("Score must be in 25-50."));
    }
}
