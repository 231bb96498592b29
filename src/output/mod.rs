pub mod formatter;
pub mod report;

pub use formatter::{
    format_curation_report, format_evidence_breakdown, format_field_errors, format_framework,
    format_points, format_score, should_use_colors,
};
pub use report::{CurationReport, EvidenceReport};
