//! One scorer per framework step.
//!
//! Each scorer reads only the attributes it needs and returns
//! [`StepPoints::NotDetermined`] when those are not filled in. Only the
//! interval steps can fail, and only when the table itself is broken.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, warn};

use super::error::ScoringError;
use super::interval::Interval;
use super::points::{Category, EffectScale, LookupKey, PointsTable, Step};
use super::types::{EffectSizeStatistic, EvidenceAttributes};

/// Outcome of one scoring step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "points", rename_all = "snake_case")]
pub enum StepPoints {
    Points(Decimal),
    NotDetermined,
}

impl StepPoints {
    pub fn value(&self) -> Option<Decimal> {
        match self {
            StepPoints::Points(points) => Some(*points),
            StepPoints::NotDetermined => None,
        }
    }

    /// Contribution to a sum.
    pub fn or_zero(&self) -> Decimal {
        self.value().unwrap_or(Decimal::ZERO)
    }

    /// Contribution to a product.
    pub fn or_one(&self) -> Decimal {
        self.value().unwrap_or(Decimal::ONE)
    }

    pub fn is_determined(&self) -> bool {
        matches!(self, StepPoints::Points(_))
    }
}

impl From<Option<Decimal>> for StepPoints {
    fn from(points: Option<Decimal>) -> Self {
        points.map_or(StepPoints::NotDetermined, StepPoints::Points)
    }
}

/// Score a single step.
pub fn score_step(
    step: Step,
    attrs: &EvidenceAttributes,
    table: &PointsTable,
) -> Result<StepPoints, ScoringError> {
    let points = match step {
        Step::S1A => step_1a(attrs, table),
        Step::S1B => step_1b(attrs, table),
        Step::S1C => step_1c(attrs, table),
        Step::S1D => step_1d(attrs, table),
        Step::S2 => step_2(attrs, table),
        Step::S3A => step_3a(attrs, table)?,
        Step::S3B => step_3b(attrs, table),
        Step::S3C1 => step_3c1(attrs, table),
        Step::S3C2 => step_3c2(attrs, table),
        Step::S4 => step_4(attrs, table)?,
        Step::S5 => step_5(attrs, table),
        Step::S6A => step_6a(attrs, table),
        Step::S6B => step_6b(attrs, table),
    };
    Ok(points)
}

fn category(table: &PointsTable, step: Step, category: Category) -> StepPoints {
    table.lookup(step, &LookupKey::Category(category), false).into()
}

/// Allele or haplotype.
pub fn step_1a(attrs: &EvidenceAttributes, table: &PointsTable) -> StepPoints {
    match attrs.curation_type {
        Some(kind) => category(table, Step::S1A, Category::CurationType(kind)),
        None => StepPoints::NotDetermined,
    }
}

/// Allele resolution. Counts beyond four fields have no points.
pub fn step_1b(attrs: &EvidenceAttributes, table: &PointsTable) -> StepPoints {
    category(table, Step::S1B, Category::Fields(attrs.num_fields))
}

pub fn step_1c(attrs: &EvidenceAttributes, table: &PointsTable) -> StepPoints {
    match attrs.zygosity {
        Some(zygosity) => category(table, Step::S1C, Category::Zygosity(zygosity)),
        None => StepPoints::NotDetermined,
    }
}

pub fn step_1d(attrs: &EvidenceAttributes, table: &PointsTable) -> StepPoints {
    category(table, Step::S1D, Category::PhaseConfirmed(attrs.phase_confirmed))
}

pub fn step_2(attrs: &EvidenceAttributes, table: &PointsTable) -> StepPoints {
    match attrs.typing_method {
        Some(method) => category(table, Step::S2, Category::TypingMethod(method)),
        None => StepPoints::NotDetermined,
    }
}

/// p-value bucket, GWAS or non-GWAS thresholds.
pub fn step_3a(
    attrs: &EvidenceAttributes,
    table: &PointsTable,
) -> Result<StepPoints, ScoringError> {
    let Some(p_value) = attrs.p_value else {
        return Ok(StepPoints::NotDetermined);
    };
    table
        .bucket_points(Step::S3A, p_value, attrs.is_gwas)
        .map(StepPoints::Points)
        .inspect_err(|e| error!("{}", e))
}

pub fn step_3b(attrs: &EvidenceAttributes, table: &PointsTable) -> StepPoints {
    match attrs.multiple_testing_correction {
        Some(correction) => category(table, Step::S3B, Category::Correction(correction)),
        None => StepPoints::NotDetermined,
    }
}

/// Effect size far enough from the null.
pub fn step_3c1(attrs: &EvidenceAttributes, table: &PointsTable) -> StepPoints {
    let Some((stat, value)) = effect_size(attrs) else {
        return StepPoints::NotDetermined;
    };
    table
        .thresholds(EffectScale::from(stat))
        .find(|(interval, _)| interval.contains(value))
        .map(|(_, points)| points)
        .into()
}

/// Confidence interval that does not cross the null.
pub fn step_3c2(attrs: &EvidenceAttributes, table: &PointsTable) -> StepPoints {
    let (Some(stat), Some(ci)) = (effect_statistic(attrs), attrs.confidence_interval) else {
        return StepPoints::NotDetermined;
    };
    let reported = Interval::closed(ci.start, ci.end, "CI");
    if reported.contains(stat.null_value()) {
        StepPoints::NotDetermined
    } else {
        category(table, Step::S3C2, Category::CiExcludesNull)
    }
}

/// Cohort size bucket, GWAS or non-GWAS thresholds.
pub fn step_4(
    attrs: &EvidenceAttributes,
    table: &PointsTable,
) -> Result<StepPoints, ScoringError> {
    let Some(size) = attrs.cohort_size else {
        return Ok(StepPoints::NotDetermined);
    };
    table
        .bucket_points(Step::S4, Decimal::from(size), attrs.is_gwas)
        .map(StepPoints::Points)
        .inspect_err(|e| error!("{}", e))
}

pub fn step_5(attrs: &EvidenceAttributes, table: &PointsTable) -> StepPoints {
    match attrs.additional_phenotypes {
        Some(phenotypes) => category(table, Step::S5, Category::Phenotypes(phenotypes)),
        None => StepPoints::NotDetermined,
    }
}

/// Association multiplier.
pub fn step_6a(attrs: &EvidenceAttributes, table: &PointsTable) -> StepPoints {
    category(table, Step::S6A, Category::Association(attrs.has_association))
}

/// Low resolution multiplier.
pub fn step_6b(attrs: &EvidenceAttributes, table: &PointsTable) -> StepPoints {
    category(table, Step::S6B, Category::SingleField(attrs.num_fields == 1))
}

/// The effect size the evidence reports.
///
/// The declared statistic picks the value. Without a declaration the first
/// populated value wins, in odds ratio, relative risk, beta order.
pub fn effect_size(attrs: &EvidenceAttributes) -> Option<(EffectSizeStatistic, Decimal)> {
    let populated = attrs.effect_sizes();
    if populated.len() > 1 {
        warn!(
            declared = ?attrs.effect_size_statistic,
            count = populated.len(),
            "more than one effect size populated"
        );
    }
    match attrs.effect_size_statistic {
        Some(stat) => populated.into_iter().find(|(s, _)| *s == stat),
        None => populated.into_iter().next(),
    }
}

/// The statistic whose null the confidence interval is checked against.
fn effect_statistic(attrs: &EvidenceAttributes) -> Option<EffectSizeStatistic> {
    attrs
        .effect_size_statistic
        .or_else(|| attrs.effect_sizes().first().map(|(stat, _)| *stat))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::points::framework;
    use crate::scoring::types::{
        AdditionalPhenotypes, ConfidenceInterval, CurationType, MultipleTestingCorrection,
        TypingMethod, Zygosity,
    };
    use rust_decimal_macros::dec;

    fn table() -> &'static PointsTable {
        framework().unwrap()
    }

    fn pts(value: Decimal) -> StepPoints {
        StepPoints::Points(value)
    }

    #[test]
    fn test_step_1a() {
        let mut attrs = EvidenceAttributes::default();
        assert_eq!(step_1a(&attrs, table()), StepPoints::NotDetermined);
        attrs.curation_type = Some(CurationType::Allele);
        assert_eq!(step_1a(&attrs, table()), pts(dec!(0)));
        attrs.curation_type = Some(CurationType::Haplotype);
        assert_eq!(step_1a(&attrs, table()), pts(dec!(2)));
    }

    #[test]
    fn test_step_1b_resolution() {
        let mut attrs = EvidenceAttributes::default();
        let expected = [(1, dec!(0)), (2, dec!(1)), (3, dec!(2)), (4, dec!(3))];
        for (fields, points) in expected {
            attrs.num_fields = fields;
            assert_eq!(step_1b(&attrs, table()), pts(points), "{} fields", fields);
        }
        attrs.num_fields = 5;
        assert_eq!(step_1b(&attrs, table()), StepPoints::NotDetermined);
    }

    #[test]
    fn test_step_1c_and_1d() {
        let mut attrs = EvidenceAttributes::default();
        assert_eq!(step_1c(&attrs, table()), StepPoints::NotDetermined);
        attrs.zygosity = Some(Zygosity::Biallelic);
        assert_eq!(step_1c(&attrs, table()), pts(dec!(0.5)));
        attrs.zygosity = Some(Zygosity::Monoallelic);
        assert_eq!(step_1c(&attrs, table()), pts(dec!(0)));

        assert_eq!(step_1d(&attrs, table()), pts(dec!(0)));
        attrs.phase_confirmed = true;
        assert_eq!(step_1d(&attrs, table()), pts(dec!(0.5)));
    }

    #[test]
    fn test_step_2_unset_is_not_determined() {
        let mut attrs = EvidenceAttributes::default();
        assert_eq!(step_2(&attrs, table()), StepPoints::NotDetermined);
        attrs.typing_method = Some(TypingMethod::LongReadSeq);
        assert_eq!(step_2(&attrs, table()), pts(dec!(5)));
    }

    #[test]
    fn test_step_3a_gwas_branch() {
        let mut attrs = EvidenceAttributes {
            p_value: Some(dec!(0.00000005)),
            is_gwas: true,
            ..Default::default()
        };
        let gwas = step_3a(&attrs, table()).unwrap();
        assert_eq!(gwas, pts(dec!(0.5)));

        attrs.is_gwas = false;
        let non_gwas = step_3a(&attrs, table()).unwrap();
        assert_eq!(non_gwas, pts(dec!(2)));
        assert_ne!(gwas, non_gwas);
    }

    #[test]
    fn test_step_3a_unset() {
        let attrs = EvidenceAttributes::default();
        assert_eq!(step_3a(&attrs, table()).unwrap(), StepPoints::NotDetermined);
    }

    #[test]
    fn test_step_3b() {
        let mut attrs = EvidenceAttributes::default();
        assert_eq!(step_3b(&attrs, table()), StepPoints::NotDetermined);
        attrs.multiple_testing_correction = Some(MultipleTestingCorrection::TwoStep);
        assert_eq!(step_3b(&attrs, table()), pts(dec!(2)));
        attrs.multiple_testing_correction = Some(MultipleTestingCorrection::Overall);
        assert_eq!(step_3b(&attrs, table()), pts(dec!(1)));
    }

    #[test]
    fn test_step_3c1_ratio_thresholds() {
        let mut attrs = EvidenceAttributes {
            effect_size_statistic: Some(EffectSizeStatistic::OddsRatio),
            ..Default::default()
        };
        for (value, expected) in [
            (dec!(2.0), pts(dec!(1))),
            (dec!(3.5), pts(dec!(1))),
            (dec!(0.5), pts(dec!(1))),
            (dec!(1.99), StepPoints::NotDetermined),
            (dec!(0.51), StepPoints::NotDetermined),
        ] {
            attrs.odds_ratio = Some(value);
            assert_eq!(step_3c1(&attrs, table()), expected, "OR {}", value);
        }
    }

    #[test]
    fn test_step_3c1_beta_thresholds() {
        let mut attrs = EvidenceAttributes {
            effect_size_statistic: Some(EffectSizeStatistic::Beta),
            ..Default::default()
        };
        for (value, expected) in [
            (dec!(0.5), pts(dec!(1))),
            (dec!(-0.5), pts(dec!(1))),
            (dec!(0.49), StepPoints::NotDetermined),
            (dec!(-0.49), StepPoints::NotDetermined),
        ] {
            attrs.beta = Some(value);
            assert_eq!(step_3c1(&attrs, table()), expected, "beta {}", value);
        }
    }

    #[test]
    fn test_step_3c1_zero_ratio() {
        // zero is an entered value, and it sits below the 0.5 threshold
        let mut attrs = EvidenceAttributes {
            odds_ratio: Some(dec!(0)),
            ..Default::default()
        };
        assert_eq!(step_3c1(&attrs, table()), pts(dec!(1)));

        attrs.odds_ratio = None;
        attrs.relative_risk = Some(dec!(0));
        assert_eq!(step_3c1(&attrs, table()), pts(dec!(1)));
    }

    #[test]
    fn test_step_3c2_zero_ci_start() {
        let attrs = EvidenceAttributes {
            effect_size_statistic: Some(EffectSizeStatistic::OddsRatio),
            odds_ratio: Some(dec!(0.4)),
            confidence_interval: Some(ConfidenceInterval {
                start: dec!(0),
                end: dec!(0.8),
            }),
            ..Default::default()
        };
        assert_eq!(step_3c2(&attrs, table()), pts(dec!(1)));
    }

    #[test]
    fn test_step_3c1_declared_statistic_wins() {
        // relative risk is declared; the stray odds ratio is ignored
        let attrs = EvidenceAttributes {
            effect_size_statistic: Some(EffectSizeStatistic::RelativeRisk),
            odds_ratio: Some(dec!(5)),
            relative_risk: Some(dec!(1.2)),
            ..Default::default()
        };
        assert_eq!(step_3c1(&attrs, table()), StepPoints::NotDetermined);
    }

    #[test]
    fn test_step_3c1_undeclared_uses_priority_order() {
        let attrs = EvidenceAttributes {
            odds_ratio: Some(dec!(1.1)),
            beta: Some(dec!(0.9)),
            ..Default::default()
        };
        assert_eq!(
            effect_size(&attrs),
            Some((EffectSizeStatistic::OddsRatio, dec!(1.1)))
        );
        assert_eq!(step_3c1(&attrs, table()), StepPoints::NotDetermined);
    }

    #[test]
    fn test_step_3c2_ratio_null_is_one() {
        let mut attrs = EvidenceAttributes {
            effect_size_statistic: Some(EffectSizeStatistic::OddsRatio),
            confidence_interval: Some(ConfidenceInterval {
                start: dec!(1.2),
                end: dec!(3.4),
            }),
            ..Default::default()
        };
        assert_eq!(step_3c2(&attrs, table()), pts(dec!(1)));

        attrs.confidence_interval = Some(ConfidenceInterval {
            start: dec!(0.8),
            end: dec!(1.0),
        });
        assert_eq!(step_3c2(&attrs, table()), StepPoints::NotDetermined);
    }

    #[test]
    fn test_step_3c2_beta_null_is_zero() {
        let mut attrs = EvidenceAttributes {
            effect_size_statistic: Some(EffectSizeStatistic::Beta),
            confidence_interval: Some(ConfidenceInterval {
                start: dec!(0.8),
                end: dec!(1.3),
            }),
            ..Default::default()
        };
        assert_eq!(step_3c2(&attrs, table()), pts(dec!(1)));

        attrs.confidence_interval = Some(ConfidenceInterval {
            start: dec!(-0.2),
            end: dec!(0.4),
        });
        assert_eq!(step_3c2(&attrs, table()), StepPoints::NotDetermined);
    }

    #[test]
    fn test_step_3c2_needs_statistic_and_interval() {
        let attrs = EvidenceAttributes {
            confidence_interval: Some(ConfidenceInterval {
                start: dec!(1.2),
                end: dec!(3.4),
            }),
            ..Default::default()
        };
        assert_eq!(step_3c2(&attrs, table()), StepPoints::NotDetermined);

        let attrs = EvidenceAttributes {
            effect_size_statistic: Some(EffectSizeStatistic::OddsRatio),
            ..Default::default()
        };
        assert_eq!(step_3c2(&attrs, table()), StepPoints::NotDetermined);
    }

    #[test]
    fn test_step_4_cohort_branch() {
        let mut attrs = EvidenceAttributes {
            cohort_size: Some(600),
            ..Default::default()
        };
        assert_eq!(step_4(&attrs, table()).unwrap(), pts(dec!(4)));
        attrs.is_gwas = true;
        assert_eq!(step_4(&attrs, table()).unwrap(), pts(dec!(0)));
        attrs.cohort_size = None;
        assert_eq!(step_4(&attrs, table()).unwrap(), StepPoints::NotDetermined);
    }

    #[test]
    fn test_step_5() {
        let mut attrs = EvidenceAttributes::default();
        assert_eq!(step_5(&attrs, table()), StepPoints::NotDetermined);
        attrs.additional_phenotypes = Some(AdditionalPhenotypes::SpecificDiseaseRelated);
        assert_eq!(step_5(&attrs, table()), pts(dec!(2)));
        attrs.additional_phenotypes = Some(AdditionalPhenotypes::OnlyDiseaseTested);
        assert_eq!(step_5(&attrs, table()), pts(dec!(0)));
    }

    #[test]
    fn test_multipliers() {
        let mut attrs = EvidenceAttributes::default();
        assert_eq!(step_6a(&attrs, table()), pts(dec!(0)));
        assert_eq!(step_6b(&attrs, table()), pts(dec!(0.5)));
        attrs.has_association = true;
        attrs.num_fields = 2;
        assert_eq!(step_6a(&attrs, table()), pts(dec!(1)));
        assert_eq!(step_6b(&attrs, table()), pts(dec!(1)));
    }

    #[test]
    fn test_step_points_fallbacks() {
        assert_eq!(StepPoints::NotDetermined.or_zero(), Decimal::ZERO);
        assert_eq!(StepPoints::NotDetermined.or_one(), Decimal::ONE);
        assert_eq!(pts(dec!(1.5)).or_zero(), dec!(1.5));
        assert!(!StepPoints::NotDetermined.is_determined());
    }
}
