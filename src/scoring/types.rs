use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a curation is about a single allele or a haplotype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CurationType {
    Allele,
    Haplotype,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Zygosity {
    /// Heterozygous
    Monoallelic,
    /// Homozygous
    Biallelic,
}

/// Laboratory technique used to resolve the HLA sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypingMethod {
    TagSnps,
    Microarrays,
    Serological,
    Imputation,
    LowResTyping,
    HighResTyping,
    WholeExomeSeq,
    RnaSeq,
    SangerSeq,
    WholeGeneSeq,
    WholeGenomeSeq,
    NextGenerationSeq,
    LongReadSeq,
}

impl TypingMethod {
    pub const ALL: [TypingMethod; 13] = [
        TypingMethod::TagSnps,
        TypingMethod::Microarrays,
        TypingMethod::Serological,
        TypingMethod::Imputation,
        TypingMethod::LowResTyping,
        TypingMethod::HighResTyping,
        TypingMethod::WholeExomeSeq,
        TypingMethod::RnaSeq,
        TypingMethod::SangerSeq,
        TypingMethod::WholeGeneSeq,
        TypingMethod::WholeGenomeSeq,
        TypingMethod::NextGenerationSeq,
        TypingMethod::LongReadSeq,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TypingMethod::TagSnps => "Tagging / Tag SNPs",
            TypingMethod::Microarrays => "Microarrays",
            TypingMethod::Serological => "Serological Typing",
            TypingMethod::Imputation => "Imputation",
            TypingMethod::LowResTyping => "Low-Resolution Molecular Genotyping",
            TypingMethod::HighResTyping => "High-Resolution Molecular Genotyping",
            TypingMethod::WholeExomeSeq => "Whole Exome Sequencing",
            TypingMethod::RnaSeq => "RNA Sequencing",
            TypingMethod::SangerSeq => "Sanger-Sequencing-Based Typing",
            TypingMethod::WholeGeneSeq => "Whole Gene Sequencing",
            TypingMethod::WholeGenomeSeq => "Whole Genome Sequencing",
            TypingMethod::NextGenerationSeq => "Next Generation Sequencing",
            TypingMethod::LongReadSeq => "Long Read Sequencing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MultipleTestingCorrection {
    Overall,
    TwoStep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectSizeStatistic {
    OddsRatio,
    RelativeRisk,
    Beta,
}

impl EffectSizeStatistic {
    /// The value at which the statistic means "no effect".
    pub fn null_value(&self) -> Decimal {
        match self {
            EffectSizeStatistic::OddsRatio | EffectSizeStatistic::RelativeRisk => Decimal::ONE,
            EffectSizeStatistic::Beta => Decimal::ZERO,
        }
    }
}

impl fmt::Display for EffectSizeStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EffectSizeStatistic::OddsRatio => "odds ratio",
            EffectSizeStatistic::RelativeRisk => "relative risk",
            EffectSizeStatistic::Beta => "beta",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdditionalPhenotypes {
    SpecificDiseaseRelated,
    OnlyDiseaseTested,
}

/// Reported confidence interval around the effect size, read as `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfidenceInterval {
    pub start: Decimal,
    pub end: Decimal,
}

/// The scoring-relevant snapshot of one evidence record.
///
/// `None` means the curator has not filled the field in yet; the matching
/// step then scores as not determined.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceAttributes {
    pub curation_type: Option<CurationType>,
    pub is_gwas: bool,
    pub zygosity: Option<Zygosity>,
    pub phase_confirmed: bool,
    pub typing_method: Option<TypingMethod>,
    pub p_value: Option<Decimal>,
    pub multiple_testing_correction: Option<MultipleTestingCorrection>,
    pub effect_size_statistic: Option<EffectSizeStatistic>,
    pub odds_ratio: Option<Decimal>,
    pub relative_risk: Option<Decimal>,
    pub beta: Option<Decimal>,
    pub confidence_interval: Option<ConfidenceInterval>,
    pub cohort_size: Option<u64>,
    pub additional_phenotypes: Option<AdditionalPhenotypes>,
    pub has_association: bool,
    /// Resolution depth of the allele, or the shallowest allele of a haplotype.
    pub num_fields: u32,
    pub is_included: bool,
    pub is_conflicting: bool,
}

impl Default for EvidenceAttributes {
    /// A freshly created evidence record: nothing typed in yet, included,
    /// supporting, and scored at the lowest resolution.
    fn default() -> Self {
        Self {
            curation_type: None,
            is_gwas: false,
            zygosity: None,
            phase_confirmed: false,
            typing_method: None,
            p_value: None,
            multiple_testing_correction: None,
            effect_size_statistic: None,
            odds_ratio: None,
            relative_risk: None,
            beta: None,
            confidence_interval: None,
            cohort_size: None,
            additional_phenotypes: None,
            has_association: false,
            num_fields: 1,
            is_included: true,
            is_conflicting: false,
        }
    }
}

impl EvidenceAttributes {
    /// Populated effect size values, in odds ratio, relative risk, beta order.
    pub fn effect_sizes(&self) -> Vec<(EffectSizeStatistic, Decimal)> {
        [
            (EffectSizeStatistic::OddsRatio, self.odds_ratio),
            (EffectSizeStatistic::RelativeRisk, self.relative_risk),
            (EffectSizeStatistic::Beta, self.beta),
        ]
        .into_iter()
        .filter_map(|(stat, value)| value.map(|v| (stat, v)))
        .collect()
    }
}
