use serde::{Deserialize, Serialize};

use crate::markers::{Allele, Haplotype};
use crate::scoring::{
    AdditionalPhenotypes, ClassificationTier, CurationType, EffectSizeStatistic,
    MultipleTestingCorrection, Status, TypingMethod, Zygosity,
};

/// A file of curations as curators fill them in.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CurationDocument {
    pub curations: Vec<CurationRecord>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CurationRecord {
    /// Absent for a curation that has never been saved.
    pub id: Option<u64>,
    pub curation_type: CurationType,
    pub allele: Option<Allele>,
    pub haplotype: Option<Haplotype>,
    pub disease: Option<String>,
    #[serde(default)]
    pub classification: ClassificationTier,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub evidence: Vec<EvidenceRecord>,
}

/// One piece of evidence. Statistics stay text until they are checked, so a
/// typo can be reported against its field.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EvidenceRecord {
    pub publication: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub is_gwas: bool,
    pub zygosity: Option<Zygosity>,
    #[serde(default)]
    pub phase_confirmed: bool,
    pub typing_method: Option<TypingMethod>,
    #[serde(default)]
    pub demographics: Vec<String>,
    pub p_value: Option<String>,
    pub multiple_testing_correction: Option<MultipleTestingCorrection>,
    pub effect_size_statistic: Option<EffectSizeStatistic>,
    pub odds_ratio: Option<String>,
    pub relative_risk: Option<String>,
    pub beta: Option<String>,
    pub ci_start: Option<String>,
    pub ci_end: Option<String>,
    pub cohort_size: Option<u64>,
    pub additional_phenotypes: Option<AdditionalPhenotypes>,
    #[serde(default)]
    pub has_association: bool,
    #[serde(default = "included_by_default")]
    pub is_included: bool,
    #[serde(default)]
    pub is_conflicting: bool,
}

fn included_by_default() -> bool {
    true
}
