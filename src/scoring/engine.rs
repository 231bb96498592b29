use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::error::ScoringError;
use super::points::{framework, CombineOp, PointsTable, Step};
use super::steps::{score_step, StepPoints};
use super::types::EvidenceAttributes;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepContribution {
    pub step: Step,
    pub op: CombineOp,
    pub points: StepPoints,
}

/// Score of one evidence record, with every step's contribution.
///
/// Derived from the attributes on each call; nothing is cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceScore {
    pub steps: Vec<StepContribution>,
    pub score_before_multipliers: Decimal,
    pub score: Decimal,
}

impl EvidenceScore {
    pub fn points(&self, step: Step) -> StepPoints {
        self.steps
            .iter()
            .find(|c| c.step == step)
            .map_or(StepPoints::NotDetermined, |c| c.points)
    }

    /// True when any additive step could not be determined.
    pub fn incomplete(&self) -> bool {
        self.steps
            .iter()
            .any(|c| c.op == CombineOp::Add && !c.points.is_determined())
    }
}

/// Score one evidence record against `table`.
///
/// Additive steps are summed first, treating undetermined steps as 0. The
/// multipliers then apply to that whole sum.
pub fn score_evidence(
    attrs: &EvidenceAttributes,
    table: &PointsTable,
) -> Result<EvidenceScore, ScoringError> {
    let mut steps = Vec::with_capacity(Step::ADDITIVE.len() + Step::MULTIPLIERS.len());
    let mut score_before_multipliers = Decimal::ZERO;

    for step in Step::ADDITIVE {
        let points = score_step(step, attrs, table)?;
        debug!(step = %step, ?points, "additive step");
        score_before_multipliers += points.or_zero();
        steps.push(StepContribution {
            step,
            op: CombineOp::Add,
            points,
        });
    }

    let mut score = score_before_multipliers;
    for step in Step::MULTIPLIERS {
        let points = score_step(step, attrs, table)?;
        debug!(step = %step, ?points, "multiplier step");
        score *= points.or_one();
        steps.push(StepContribution {
            step,
            op: CombineOp::Multiply,
            points,
        });
    }

    Ok(EvidenceScore {
        steps,
        score_before_multipliers,
        score,
    })
}

/// Score one evidence record against the framework table.
pub fn evidence_score(attrs: &EvidenceAttributes) -> Result<Decimal, ScoringError> {
    Ok(score_evidence(attrs, framework()?)?.score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::types::{
        AdditionalPhenotypes, ConfidenceInterval, CurationType, EffectSizeStatistic,
        MultipleTestingCorrection, TypingMethod, Zygosity,
    };
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn table() -> &'static PointsTable {
        framework().unwrap()
    }

    /// Haplotype, 4-field, biallelic, phased, whole genome sequencing,
    /// GWAS p < 1e-14, two-step correction, OR 3.1 with CI [2.2, 4.4],
    /// 12000 subjects, specific phenotype, significant association.
    fn strong_evidence() -> EvidenceAttributes {
        EvidenceAttributes {
            curation_type: Some(CurationType::Haplotype),
            is_gwas: true,
            zygosity: Some(Zygosity::Biallelic),
            phase_confirmed: true,
            typing_method: Some(TypingMethod::WholeGenomeSeq),
            p_value: Some(dec!(0.000000000000001)),
            multiple_testing_correction: Some(MultipleTestingCorrection::TwoStep),
            effect_size_statistic: Some(EffectSizeStatistic::OddsRatio),
            odds_ratio: Some(dec!(3.1)),
            confidence_interval: Some(ConfidenceInterval {
                start: dec!(2.2),
                end: dec!(4.4),
            }),
            cohort_size: Some(12000),
            additional_phenotypes: Some(AdditionalPhenotypes::SpecificDiseaseRelated),
            has_association: true,
            num_fields: 4,
            ..Default::default()
        }
    }

    #[test]
    fn test_full_evidence_score() {
        let result = score_evidence(&strong_evidence(), table()).unwrap();
        // 2 + 3 + 0.5 + 0.5 + 5 + 2 + 2 + 1 + 1 + 4 + 2 = 23
        assert_eq!(result.score_before_multipliers, dec!(23));
        assert_eq!(result.score, dec!(23));
        assert!(!result.incomplete());
        assert_eq!(result.points(Step::S2), StepPoints::Points(dec!(5)));
    }

    #[test]
    fn test_empty_evidence_scores_zero() {
        let result = score_evidence(&EvidenceAttributes::default(), table()).unwrap();
        // 1-field allele resolution and unphased both score 0
        assert_eq!(result.score_before_multipliers, dec!(0));
        assert_eq!(result.score, dec!(0));
        assert!(result.incomplete());
        assert_eq!(result.points(Step::S2), StepPoints::NotDetermined);
    }

    #[test]
    fn test_no_association_zeroes_score() {
        let mut attrs = strong_evidence();
        attrs.has_association = false;
        let result = score_evidence(&attrs, table()).unwrap();
        assert_eq!(result.score_before_multipliers, dec!(23));
        assert_eq!(result.score, dec!(0));
    }

    #[test]
    fn test_multiplier_applies_to_whole_sum() {
        // score before multipliers of 10, no association, >1 field
        let attrs = EvidenceAttributes {
            curation_type: Some(CurationType::Haplotype),
            num_fields: 2,
            typing_method: Some(TypingMethod::WholeGenomeSeq),
            multiple_testing_correction: Some(MultipleTestingCorrection::TwoStep),
            has_association: false,
            ..Default::default()
        };
        let result = score_evidence(&attrs, table()).unwrap();
        assert_eq!(result.score_before_multipliers, dec!(10));
        assert_eq!(result.points(Step::S6B), StepPoints::Points(dec!(1)));
        assert_eq!(result.score, dec!(0));
    }

    #[test]
    fn test_low_resolution_halves_score() {
        let attrs = EvidenceAttributes {
            curation_type: Some(CurationType::Haplotype),
            typing_method: Some(TypingMethod::SangerSeq),
            has_association: true,
            num_fields: 1,
            ..Default::default()
        };
        let result = score_evidence(&attrs, table()).unwrap();
        assert_eq!(result.score_before_multipliers, dec!(6));
        assert_eq!(result.score, dec!(3));
    }

    #[test]
    fn test_evidence_score_uses_framework() {
        assert_eq!(evidence_score(&strong_evidence()).unwrap(), dec!(23));
    }

    #[test]
    fn test_recompute_is_identical() {
        let attrs = strong_evidence();
        let first = evidence_score(&attrs).unwrap();
        let second = evidence_score(&attrs).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(Decimal::serialize(&first), Decimal::serialize(&second));
    }

    proptest! {
        #[test]
        fn prop_scoring_is_deterministic(
            p in 1u64..1_000_000_000,
            size in 0u64..50_000,
            gwas in any::<bool>(),
            fields in 1u32..6,
        ) {
            let attrs = EvidenceAttributes {
                p_value: Some(Decimal::new(p as i64, 10)),
                cohort_size: Some(size),
                is_gwas: gwas,
                num_fields: fields,
                has_association: true,
                ..Default::default()
            };
            let first = score_evidence(&attrs, table()).unwrap();
            let second = score_evidence(&attrs, table()).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_every_p_value_lands_in_a_bucket(
            p in 0u64..u64::MAX,
            scale in 0u32..20,
            gwas in any::<bool>(),
        ) {
            let attrs = EvidenceAttributes {
                p_value: Some(Decimal::from_i128_with_scale(p as i128, scale)),
                is_gwas: gwas,
                ..Default::default()
            };
            prop_assert!(score_evidence(&attrs, table()).is_ok());
        }
    }
}
