//! The scoring framework as data.
//!
//! Every point value the engine can award lives in one ordered table built at
//! startup. The numbers are the framework's calibration, not settings.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

use super::error::ScoringError;
use super::interval::{check_partition, Domain, Interval};
use super::types::{
    AdditionalPhenotypes, CurationType, EffectSizeStatistic, MultipleTestingCorrection,
    TypingMethod, Zygosity,
};

/// A scoring step of the framework, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Step {
    S1A,
    S1B,
    S1C,
    S1D,
    S2,
    S3A,
    S3B,
    S3C1,
    S3C2,
    S4,
    S5,
    S6A,
    S6B,
}

impl Step {
    /// Steps summed into the score before multipliers.
    pub const ADDITIVE: [Step; 11] = [
        Step::S1A,
        Step::S1B,
        Step::S1C,
        Step::S1D,
        Step::S2,
        Step::S3A,
        Step::S3B,
        Step::S3C1,
        Step::S3C2,
        Step::S4,
        Step::S5,
    ];

    /// Steps applied to the summed score.
    pub const MULTIPLIERS: [Step; 2] = [Step::S6A, Step::S6B];

    pub fn op(&self) -> CombineOp {
        match self {
            Step::S6A | Step::S6B => CombineOp::Multiply,
            _ => CombineOp::Add,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Step::S1A => "Allele or Haplotype",
            Step::S1B => "Allele Resolution",
            Step::S1C => "Zygosity",
            Step::S1D => "Phase",
            Step::S2 => "Typing Method",
            Step::S3A => "Statistics (p-value)",
            Step::S3B => "Multiple Testing Correction",
            Step::S3C1 => "Statistics (Effect Size)",
            Step::S3C2 => "Confidence Interval",
            Step::S4 => "Cohort Size",
            Step::S5 => "Additional Phenotypes",
            Step::S6A => "Weighing Association (multiplier)",
            Step::S6B => "Low Field Resolution (multiplier)",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = match self {
            Step::S1A => "1A",
            Step::S1B => "1B",
            Step::S1C => "1C",
            Step::S1D => "1D",
            Step::S2 => "2",
            Step::S3A => "3A",
            Step::S3B => "3B",
            Step::S3C1 => "3C1",
            Step::S3C2 => "3C2",
            Step::S4 => "4",
            Step::S5 => "5",
            Step::S6A => "6A",
            Step::S6B => "6B",
        };
        f.write_str(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CombineOp {
    Add,
    Multiply,
}

impl CombineOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CombineOp::Add => "+",
            CombineOp::Multiply => "×",
        }
    }
}

/// Which threshold set an interval-keyed step uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Gwas,
    NonGwas,
}

impl Family {
    pub fn for_study(is_gwas: bool) -> Self {
        if is_gwas {
            Family::Gwas
        } else {
            Family::NonGwas
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::Gwas => f.write_str("GWAS"),
            Family::NonGwas => f.write_str("non-GWAS"),
        }
    }
}

/// How far an effect size must sit from the null to count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectScale {
    /// Odds ratio and relative risk, null at 1.
    Ratio,
    /// Beta coefficient, null at 0.
    Beta,
}

impl From<EffectSizeStatistic> for EffectScale {
    fn from(stat: EffectSizeStatistic) -> Self {
        match stat {
            EffectSizeStatistic::OddsRatio | EffectSizeStatistic::RelativeRisk => {
                EffectScale::Ratio
            }
            EffectSizeStatistic::Beta => EffectScale::Beta,
        }
    }
}

/// Literal category tokens of the non-interval steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    CurationType(CurationType),
    Fields(u32),
    Zygosity(Zygosity),
    PhaseConfirmed(bool),
    TypingMethod(TypingMethod),
    Correction(MultipleTestingCorrection),
    CiExcludesNull,
    Phenotypes(AdditionalPhenotypes),
    Association(bool),
    SingleField(bool),
}

impl Category {
    pub fn label(&self) -> String {
        match self {
            Category::CurationType(CurationType::Allele) => "Allele".to_string(),
            Category::CurationType(CurationType::Haplotype) => "Haplotype".to_string(),
            Category::Fields(3) => "3-field, G-group, P-group".to_string(),
            Category::Fields(n) => format!("{}-field", n),
            Category::Zygosity(Zygosity::Monoallelic) => "Monoallelic (heterozygous)".to_string(),
            Category::Zygosity(Zygosity::Biallelic) => "Biallelic (homozygous)".to_string(),
            Category::PhaseConfirmed(true) => "Phase confirmed".to_string(),
            Category::PhaseConfirmed(false) => "Phase not confirmed".to_string(),
            Category::TypingMethod(method) => method.label().to_string(),
            Category::Correction(MultipleTestingCorrection::Overall) => {
                "Overall correction for multiple testing".to_string()
            }
            Category::Correction(MultipleTestingCorrection::TwoStep) => {
                "2-step p-value correction".to_string()
            }
            Category::CiExcludesNull => "CI does not cross 1 (OR/RR) or 0 (beta)".to_string(),
            Category::Phenotypes(AdditionalPhenotypes::SpecificDiseaseRelated) => {
                "Has specific disease-related phenotype".to_string()
            }
            Category::Phenotypes(AdditionalPhenotypes::OnlyDiseaseTested) => {
                "Only disease tested".to_string()
            }
            Category::Association(true) => "Significant association with disease".to_string(),
            Category::Association(false) => "No significant association".to_string(),
            Category::SingleField(true) => "1-field resolution".to_string(),
            Category::SingleField(false) => "> 1-field resolution".to_string(),
        }
    }
}

/// What a table row is keyed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CategoryKey {
    Token(Category),
    /// One of the five ordered buckets of an interval step.
    Bucket { family: Family, interval: Interval },
    /// A region outside the null band of an effect size.
    Threshold { scale: EffectScale, interval: Interval },
}

impl CategoryKey {
    pub fn label(&self) -> String {
        match self {
            CategoryKey::Token(category) => category.label(),
            CategoryKey::Bucket { family, interval } => format!("{}: {}", family, interval),
            CategoryKey::Threshold { interval, .. } => interval.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointsEntry {
    pub step: Step,
    pub key: CategoryKey,
    pub points: Decimal,
    pub op: CombineOp,
}

/// Key used to query the table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LookupKey {
    Category(Category),
    Value(Decimal),
}

/// The framework's points, grouped by step in evaluation order.
#[derive(Debug, Clone, PartialEq)]
pub struct PointsTable {
    entries: Vec<PointsEntry>,
}

static FRAMEWORK: LazyLock<Result<PointsTable, ScoringError>> = LazyLock::new(PointsTable::build);

/// The process-wide framework table.
///
/// Built on first use. A defective table yields the same error on every call,
/// so callers should touch this once at startup.
pub fn framework() -> Result<&'static PointsTable, ScoringError> {
    FRAMEWORK.as_ref().map_err(Clone::clone)
}

impl PointsTable {
    /// Build the framework table and check every interval family.
    pub fn build() -> Result<Self, ScoringError> {
        Self::from_entries(framework_entries())
    }

    /// Wrap `entries`, rejecting any bucket family that does not tile the line.
    pub fn from_entries(entries: Vec<PointsEntry>) -> Result<Self, ScoringError> {
        let table = Self { entries };
        for (step, domain) in [(Step::S3A, Domain::Real), (Step::S4, Domain::Integer)] {
            for family in [Family::Gwas, Family::NonGwas] {
                let intervals: Vec<Interval> =
                    table.buckets(step, family).map(|(interval, _)| interval).collect();
                check_partition(&intervals, domain).map_err(|reason| {
                    ScoringError::ConfigurationDefect {
                        step,
                        family,
                        reason,
                    }
                })?;
            }
        }
        Ok(table)
    }

    pub fn entries(&self) -> &[PointsEntry] {
        &self.entries
    }

    pub fn entries_for(&self, step: Step) -> impl Iterator<Item = &PointsEntry> {
        self.entries.iter().filter(move |e| e.step == step)
    }

    /// Buckets of an interval step for one family, in table order.
    pub fn buckets(
        &self,
        step: Step,
        family: Family,
    ) -> impl Iterator<Item = (Interval, Decimal)> + '_ {
        self.entries_for(step).filter_map(move |e| match e.key {
            CategoryKey::Bucket { family: f, interval } if f == family => {
                Some((interval, e.points))
            }
            _ => None,
        })
    }

    /// Effect size regions that earn points, for one scale.
    pub fn thresholds(&self, scale: EffectScale) -> impl Iterator<Item = (Interval, Decimal)> + '_ {
        self.entries_for(Step::S3C1).filter_map(move |e| match e.key {
            CategoryKey::Threshold { scale: s, interval } if s == scale => {
                Some((interval, e.points))
            }
            _ => None,
        })
    }

    /// Points for a step given a category token or a numeric value.
    ///
    /// Numeric values are matched against the bucket family chosen by
    /// `is_gwas`; `is_gwas` is ignored for category tokens.
    pub fn lookup(&self, step: Step, key: &LookupKey, is_gwas: bool) -> Option<Decimal> {
        match key {
            LookupKey::Category(category) => self.entries_for(step).find_map(|e| match e.key {
                CategoryKey::Token(c) if c == *category => Some(e.points),
                _ => None,
            }),
            LookupKey::Value(value) => self
                .buckets(step, Family::for_study(is_gwas))
                .find(|(interval, _)| interval.contains(*value))
                .map(|(_, points)| points),
        }
    }

    /// Points for the bucket holding `value`. A miss means the table is broken.
    pub fn bucket_points(
        &self,
        step: Step,
        value: Decimal,
        is_gwas: bool,
    ) -> Result<Decimal, ScoringError> {
        self.lookup(step, &LookupKey::Value(value), is_gwas)
            .ok_or(ScoringError::UnmatchedValue {
                step,
                value,
                family: Family::for_study(is_gwas),
            })
    }
}

fn token(step: Step, category: Category, points: Decimal) -> PointsEntry {
    PointsEntry {
        step,
        key: CategoryKey::Token(category),
        points,
        op: step.op(),
    }
}

fn bucket(step: Step, family: Family, interval: Interval, points: Decimal) -> PointsEntry {
    PointsEntry {
        step,
        key: CategoryKey::Bucket { family, interval },
        points,
        op: step.op(),
    }
}

fn threshold(scale: EffectScale, interval: Interval) -> PointsEntry {
    PointsEntry {
        step: Step::S3C1,
        key: CategoryKey::Threshold { scale, interval },
        points: dec!(1),
        op: CombineOp::Add,
    }
}

/// Five buckets from a descending list of lower cut points.
///
/// `cuts[0]` opens the top bucket `[cuts[0], ∞)`; each following cut closes the
/// bucket below it. Points run from `points[0]` at the top to `points[4]` at
/// `(-∞, cuts[3])`.
fn p_value_buckets(family: Family, cuts: [Decimal; 4], points: [Decimal; 5]) -> Vec<PointsEntry> {
    const VAR: &str = "p-value";
    let mut entries = vec![bucket(Step::S3A, family, Interval::at_least(cuts[0], VAR), points[0])];
    for i in 1..4 {
        let interval = Interval::half_open(cuts[i], cuts[i - 1], VAR);
        entries.push(bucket(Step::S3A, family, interval, points[i]));
    }
    entries.push(bucket(Step::S3A, family, Interval::below(cuts[3], VAR), points[4]));
    entries
}

/// Five cohort size buckets from the inclusive upper ends of the middle three.
fn cohort_buckets(
    family: Family,
    first: Decimal,
    ends: [Decimal; 3],
    points: [Decimal; 5],
) -> Vec<PointsEntry> {
    const VAR: &str = "size";
    let mut entries = vec![bucket(Step::S4, family, Interval::below(first, VAR), points[0])];
    let mut start = first;
    for (i, end) in ends.iter().enumerate() {
        entries.push(bucket(Step::S4, family, Interval::closed(start, *end, VAR), points[i + 1]));
        start = *end + Decimal::ONE;
    }
    entries.push(bucket(Step::S4, family, Interval::at_least(start, VAR), points[4]));
    entries
}

fn framework_entries() -> Vec<PointsEntry> {
    let p_points = [dec!(0), dec!(0.5), dec!(1), dec!(1.5), dec!(2)];
    let size_points = [dec!(0), dec!(1), dec!(2), dec!(3), dec!(4)];

    let mut entries = vec![
        token(Step::S1A, Category::CurationType(CurationType::Allele), dec!(0)),
        token(Step::S1A, Category::CurationType(CurationType::Haplotype), dec!(2)),
        token(Step::S1B, Category::Fields(1), dec!(0)),
        token(Step::S1B, Category::Fields(2), dec!(1)),
        token(Step::S1B, Category::Fields(3), dec!(2)),
        token(Step::S1B, Category::Fields(4), dec!(3)),
        token(Step::S1C, Category::Zygosity(Zygosity::Monoallelic), dec!(0)),
        token(Step::S1C, Category::Zygosity(Zygosity::Biallelic), dec!(0.5)),
        token(Step::S1D, Category::PhaseConfirmed(true), dec!(0.5)),
        token(Step::S1D, Category::PhaseConfirmed(false), dec!(0)),
    ];

    for method in TypingMethod::ALL {
        let points = match method {
            TypingMethod::TagSnps | TypingMethod::Microarrays => dec!(0),
            TypingMethod::Serological => dec!(1),
            TypingMethod::Imputation => dec!(2),
            TypingMethod::LowResTyping
            | TypingMethod::HighResTyping
            | TypingMethod::WholeExomeSeq
            | TypingMethod::RnaSeq => dec!(3),
            TypingMethod::SangerSeq | TypingMethod::WholeGeneSeq => dec!(4),
            TypingMethod::WholeGenomeSeq
            | TypingMethod::NextGenerationSeq
            | TypingMethod::LongReadSeq => dec!(5),
        };
        entries.push(token(Step::S2, Category::TypingMethod(method), points));
    }

    entries.extend(p_value_buckets(
        Family::Gwas,
        [dec!(0.0001), dec!(0.00000005), dec!(0.00000000001), dec!(0.00000000000001)],
        p_points,
    ));
    entries.extend(p_value_buckets(
        Family::NonGwas,
        [dec!(0.05), dec!(0.01), dec!(0.0005), dec!(0.0001)],
        p_points,
    ));

    entries.extend([
        token(Step::S3B, Category::Correction(MultipleTestingCorrection::Overall), dec!(1)),
        token(Step::S3B, Category::Correction(MultipleTestingCorrection::TwoStep), dec!(2)),
        threshold(EffectScale::Ratio, Interval::at_least(dec!(2.0), "OR/RR")),
        threshold(EffectScale::Ratio, Interval::at_most(dec!(0.5), "OR/RR")),
        threshold(EffectScale::Beta, Interval::at_least(dec!(0.5), "Beta")),
        threshold(EffectScale::Beta, Interval::at_most(dec!(-0.5), "Beta")),
        token(Step::S3C2, Category::CiExcludesNull, dec!(1)),
    ]);

    entries.extend(cohort_buckets(
        Family::Gwas,
        dec!(1000),
        [dec!(2499), dec!(4999), dec!(9999)],
        size_points,
    ));
    entries.extend(cohort_buckets(
        Family::NonGwas,
        dec!(50),
        [dec!(99), dec!(249), dec!(499)],
        size_points,
    ));

    entries.extend([
        token(
            Step::S5,
            Category::Phenotypes(AdditionalPhenotypes::SpecificDiseaseRelated),
            dec!(2),
        ),
        token(Step::S5, Category::Phenotypes(AdditionalPhenotypes::OnlyDiseaseTested), dec!(0)),
        token(Step::S6A, Category::Association(true), dec!(1)),
        token(Step::S6A, Category::Association(false), dec!(0)),
        token(Step::S6B, Category::SingleField(true), dec!(0.5)),
        token(Step::S6B, Category::SingleField(false), dec!(1)),
    ]);

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> &'static PointsTable {
        framework().unwrap()
    }

    #[test]
    fn test_framework_builds() {
        let table = table();
        assert_eq!(table.buckets(Step::S3A, Family::Gwas).count(), 5);
        assert_eq!(table.buckets(Step::S3A, Family::NonGwas).count(), 5);
        assert_eq!(table.buckets(Step::S4, Family::Gwas).count(), 5);
        assert_eq!(table.buckets(Step::S4, Family::NonGwas).count(), 5);
        assert_eq!(table.entries_for(Step::S2).count(), 13);
    }

    #[test]
    fn test_multiplier_steps_multiply() {
        for entry in table().entries() {
            let expected = if Step::MULTIPLIERS.contains(&entry.step) {
                CombineOp::Multiply
            } else {
                CombineOp::Add
            };
            assert_eq!(entry.op, expected, "step {}", entry.step);
        }
    }

    #[test]
    fn test_lookup_categories() {
        let table = table();
        let cat = |c| LookupKey::Category(c);
        assert_eq!(
            table.lookup(Step::S1A, &cat(Category::CurationType(CurationType::Haplotype)), false),
            Some(dec!(2))
        );
        assert_eq!(table.lookup(Step::S1B, &cat(Category::Fields(3)), false), Some(dec!(2)));
        assert_eq!(table.lookup(Step::S1B, &cat(Category::Fields(5)), false), None);
        assert_eq!(
            table.lookup(Step::S2, &cat(Category::TypingMethod(TypingMethod::Serological)), true),
            Some(dec!(1))
        );
        assert_eq!(
            table.lookup(Step::S6B, &cat(Category::SingleField(true)), false),
            Some(dec!(0.5))
        );
        // a token from another step is not found
        assert_eq!(table.lookup(Step::S1C, &cat(Category::Fields(1)), false), None);
    }

    #[test]
    fn test_typing_method_tiers() {
        let table = table();
        let points: Vec<Decimal> = TypingMethod::ALL
            .iter()
            .map(|m| {
                table
                    .lookup(Step::S2, &LookupKey::Category(Category::TypingMethod(*m)), false)
                    .unwrap()
            })
            .collect();
        let expected: Vec<Decimal> = [0, 0, 1, 2, 3, 3, 3, 3, 4, 4, 5, 5, 5]
            .into_iter()
            .map(Decimal::from)
            .collect();
        assert_eq!(points, expected);
    }

    #[test]
    fn test_p_value_buckets_gwas() {
        let table = table();
        let p = |v| table.bucket_points(Step::S3A, v, true).unwrap();
        assert_eq!(p(dec!(0.5)), dec!(0));
        assert_eq!(p(dec!(0.0001)), dec!(0));
        assert_eq!(p(dec!(0.00000005)), dec!(0.5));
        assert_eq!(p(dec!(0.000000049)), dec!(1));
        assert_eq!(p(dec!(0.00000000001)), dec!(1));
        assert_eq!(p(dec!(0.00000000000001)), dec!(1.5));
        assert_eq!(p(dec!(0.000000000000001)), dec!(2));
    }

    #[test]
    fn test_p_value_buckets_non_gwas() {
        let table = table();
        let p = |v| table.bucket_points(Step::S3A, v, false).unwrap();
        assert_eq!(p(dec!(0.05)), dec!(0));
        assert_eq!(p(dec!(0.049)), dec!(0.5));
        assert_eq!(p(dec!(0.01)), dec!(0.5));
        assert_eq!(p(dec!(0.0005)), dec!(1));
        assert_eq!(p(dec!(0.0001)), dec!(1.5));
        assert_eq!(p(dec!(0.00009)), dec!(2));
        assert_eq!(p(dec!(0.00000005)), dec!(2));
    }

    #[test]
    fn test_cohort_buckets() {
        let table = table();
        let gwas = |v: u64| table.bucket_points(Step::S4, Decimal::from(v), true).unwrap();
        assert_eq!(gwas(999), dec!(0));
        assert_eq!(gwas(1000), dec!(1));
        assert_eq!(gwas(2499), dec!(1));
        assert_eq!(gwas(2500), dec!(2));
        assert_eq!(gwas(9999), dec!(3));
        assert_eq!(gwas(10000), dec!(4));

        let non_gwas = |v: u64| table.bucket_points(Step::S4, Decimal::from(v), false).unwrap();
        assert_eq!(non_gwas(0), dec!(0));
        assert_eq!(non_gwas(49), dec!(0));
        assert_eq!(non_gwas(50), dec!(1));
        assert_eq!(non_gwas(100), dec!(2));
        assert_eq!(non_gwas(499), dec!(3));
        assert_eq!(non_gwas(500), dec!(4));
    }

    #[test]
    fn test_unmatched_value_is_reported() {
        let table = table();
        // between two whole-number buckets
        let err = table.bucket_points(Step::S4, dec!(99.5), false).unwrap_err();
        assert_eq!(
            err,
            ScoringError::UnmatchedValue {
                step: Step::S4,
                value: dec!(99.5),
                family: Family::NonGwas,
            }
        );
    }

    #[test]
    fn test_defective_table_rejected() {
        let mut entries = framework_entries();
        // drop the (-∞, 1e-14) GWAS bucket
        entries.retain(|e| {
            !matches!(
                e.key,
                CategoryKey::Bucket { family: Family::Gwas, interval }
                    if e.step == Step::S3A && interval.start() == crate::scoring::Bound::NegInfinity
            )
        });
        let err = PointsTable::from_entries(entries).unwrap_err();
        assert!(matches!(
            err,
            ScoringError::ConfigurationDefect {
                step: Step::S3A,
                family: Family::Gwas,
                ..
            }
        ));
    }

    #[test]
    fn test_bucket_legends() {
        let legends: Vec<String> = table()
            .buckets(Step::S4, Family::NonGwas)
            .map(|(interval, _)| interval.to_string())
            .collect();
        assert_eq!(
            legends,
            vec![
                "-∞ < size < 50",
                "50 ≤ size ≤ 99",
                "100 ≤ size ≤ 249",
                "250 ≤ size ≤ 499",
                "500 ≤ size < ∞",
            ]
        );
    }
}
