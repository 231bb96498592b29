//! HLA alleles and haplotypes, as far as scoring cares about them.

use serde::{Deserialize, Serialize};

/// Resolution depth of an allele name: `A*01:02:03` has three fields.
pub fn allele_num_fields(name: &str) -> u32 {
    name.matches(':').count() as u32 + 1
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Allele {
    pub name: String,
}

impl Allele {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn num_fields(&self) -> u32 {
        allele_num_fields(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Haplotype {
    pub name: String,
    #[serde(default)]
    pub alleles: Vec<Allele>,
}

impl Haplotype {
    /// Resolution of the least resolved allele; 1 for an empty haplotype.
    pub fn num_fields(&self) -> u32 {
        self.alleles
            .iter()
            .map(Allele::num_fields)
            .min()
            .unwrap_or(1)
    }
}
