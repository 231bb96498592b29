mod schema;

pub use schema::{CurationDocument, CurationRecord, EvidenceRecord};

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::fs;
use std::path::Path;

use crate::scoring::{
    ConfidenceInterval, Curation, Evidence, EvidenceAttributes, FieldError, TypingMethod,
};

/// Load a curation document from a YAML file
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist
/// - The file cannot be read
/// - The YAML cannot be parsed, or names a field the schema does not know
pub fn load_document(path: &Path) -> Result<CurationDocument> {
    if !path.exists() {
        anyhow::bail!("Curation file not found at {}", path.display());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read curation file at {}", path.display()))?;

    let document: CurationDocument = serde_saphyr::from_str(&content)
        .with_context(|| format!("Failed to parse curations: invalid YAML in {}", path.display()))?;

    Ok(document)
}

/// Parse a statistic typed in by a curator.
///
/// Accepts plain decimals (`0.05`) and scientific notation (`5e-8`). Blank
/// text means the value has not been entered. Magnitudes too small for a
/// `Decimal` are held at 1e-28 with their sign, which still lands in the
/// lowest p-value bucket.
pub fn parse_decimal(field: &str, text: &str) -> Result<Option<Decimal>, FieldError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    parse_number(text).map(Some).ok_or_else(|| {
        FieldError::new(
            field,
            format!(
                "Unable to save {} as written. Make sure it is written as a decimal \
                 (e.g. 0.05) or in scientific notation (e.g. 5e-8).",
                describe(field)
            ),
        )
    })
}

/// Most significant digits a `Decimal` mantissa is given.
const MAX_DIGITS: usize = 28;

fn smallest_magnitude(negative: bool) -> Decimal {
    let mut value = Decimal::new(1, MAX_DIGITS as u32);
    value.set_sign_negative(negative);
    value
}

/// `[+-]digits[.digits][e[+-]digits]`, split into mantissa and exponent so
/// that exponents beyond `Decimal`'s scale do not fail the parse.
fn parse_number(text: &str) -> Option<Decimal> {
    let (base, exponent) = match text.split_once(['e', 'E']) {
        Some((base, exponent)) => (base, exponent.parse::<i64>().ok()?),
        None => (text, 0),
    };

    let (negative, unsigned) = match base.as_bytes().first()? {
        b'-' => (true, &base[1..]),
        b'+' => (false, &base[1..]),
        _ => (false, base),
    };
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let digits = format!("{}{}", whole, fraction);
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Some(Decimal::ZERO);
    }
    let significant = digits.trim_end_matches('0');

    // value = significant * 10^power
    let mut power = exponent
        .saturating_sub(fraction.len() as i64)
        .saturating_add((digits.len() - significant.len()) as i64);
    let kept = &significant[..significant.len().min(MAX_DIGITS)];
    power = power.saturating_add((significant.len() - kept.len()) as i64);

    let mut mantissa: i128 = kept.parse().ok()?;
    let value = if power >= 0 {
        let mut value = Decimal::from_i128_with_scale(mantissa, 0);
        for _ in 0..power {
            value = value.checked_mul(Decimal::TEN)?;
        }
        value
    } else {
        let mut scale = power.unsigned_abs();
        while scale > MAX_DIGITS as u64 && mantissa != 0 {
            mantissa /= 10;
            scale -= 1;
        }
        if mantissa == 0 {
            return Some(smallest_magnitude(negative));
        }
        Decimal::from_i128_with_scale(mantissa, scale as u32)
    };

    Some(if negative { -value } else { value })
}

fn describe(field: &str) -> &str {
    match field {
        "p_value" => "p-value",
        "odds_ratio" => "odds ratio",
        "relative_risk" => "relative risk",
        "beta" => "beta coefficient",
        "ci_start" => "confidence interval start",
        "ci_end" => "confidence interval end",
        other => other,
    }
}

impl EvidenceRecord {
    /// Check the record and convert it into engine values.
    ///
    /// Every rejected field is reported, not just the first.
    pub fn into_evidence(self) -> Result<Evidence, Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.publication.as_deref().map_or(true, |p| p.trim().is_empty()) {
            errors.push(FieldError::new("publication", "Please select a publication."));
        }

        if self.typing_method == Some(TypingMethod::Imputation) && self.demographics.is_empty() {
            errors.push(FieldError::new(
                "demographics",
                "Demographics must be provided if typing method is imputation.",
            ));
        }

        let mut parse = |field: &str, text: &Option<String>| {
            match parse_decimal(field, text.as_deref().unwrap_or("")) {
                Ok(value) => value,
                Err(e) => {
                    errors.push(e);
                    None
                }
            }
        };
        let p_value = parse("p_value", &self.p_value);
        let odds_ratio = parse("odds_ratio", &self.odds_ratio);
        let relative_risk = parse("relative_risk", &self.relative_risk);
        let beta = parse("beta", &self.beta);
        let ci_start = parse("ci_start", &self.ci_start);
        let ci_end = parse("ci_end", &self.ci_end);

        if !errors.is_empty() {
            return Err(errors);
        }

        let confidence_interval = match (ci_start, ci_end) {
            (Some(start), Some(end)) => Some(ConfidenceInterval { start, end }),
            _ => None,
        };

        Ok(Evidence {
            status: self.status,
            attributes: EvidenceAttributes {
                is_gwas: self.is_gwas,
                zygosity: self.zygosity,
                phase_confirmed: self.phase_confirmed,
                typing_method: self.typing_method,
                p_value,
                multiple_testing_correction: self.multiple_testing_correction,
                effect_size_statistic: self.effect_size_statistic,
                odds_ratio,
                relative_risk,
                beta,
                confidence_interval,
                cohort_size: self.cohort_size,
                additional_phenotypes: self.additional_phenotypes,
                has_association: self.has_association,
                is_included: self.is_included,
                is_conflicting: self.is_conflicting,
                ..Default::default()
            },
        })
    }
}

impl CurationRecord {
    /// Convert the record, prefixing evidence field errors with their position
    /// (`evidence[2].p_value`).
    pub fn into_curation(self) -> Result<Curation, Vec<FieldError>> {
        let mut errors = Vec::new();
        let mut evidence = Vec::with_capacity(self.evidence.len());

        for (i, record) in self.evidence.into_iter().enumerate() {
            match record.into_evidence() {
                Ok(e) => evidence.push(e),
                Err(field_errors) => errors.extend(field_errors.into_iter().map(|e| {
                    FieldError::new(format!("evidence[{}].{}", i, e.field), e.message)
                })),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Curation {
            id: self.id,
            curation_type: self.curation_type,
            allele: self.allele,
            haplotype: self.haplotype,
            disease: self.disease,
            classification: self.classification,
            status: self.status,
            evidence,
        })
    }
}
