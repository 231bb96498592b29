use std::io::IsTerminal;
use owo_colors::OwoColorize;
use rust_decimal::Decimal;

use super::report::{CurationReport, EvidenceReport};
use crate::scoring::{CombineOp, FieldError, PointsTable, Step, StepPoints};

/// Width of the step title column (fits "Weighing Association (multiplier)")
const TITLE_WIDTH: usize = 34;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a score without trailing zeros (23, 0.5, -4.5)
/// If incomplete is true, appends asterisk to indicate partial scoring
pub fn format_score(score: Decimal, incomplete: bool) -> String {
    let formatted = score.normalize().to_string();
    if incomplete {
        format!("{}*", formatted)
    } else {
        formatted
    }
}

/// Format one step's points with its operator ("+2", "×0.5", "-" if undetermined)
pub fn format_points(points: StepPoints, op: CombineOp) -> String {
    match points {
        StepPoints::Points(value) => format!("{}{}", op.symbol(), value.normalize()),
        StepPoints::NotDetermined => "-".to_string(),
    }
}

fn step_line(step: Step, value: &str) -> String {
    format!(
        "    {:>3}  {:<width$} {}",
        step.to_string(),
        step.title(),
        value,
        width = TITLE_WIDTH
    )
}

/// Format one evidence record with a line per step
pub fn format_evidence_breakdown(evidence: &EvidenceReport, use_colors: bool) -> String {
    let heading = format!("  Evidence {}", evidence.index);

    let Some(score) = &evidence.score else {
        return if use_colors {
            format!("{}  {}", heading, "excluded".dimmed())
        } else {
            format!("{}  excluded", heading)
        };
    };

    let mut summary = format!(
        "score {} (before multipliers {})",
        format_score(score.score, score.incomplete()),
        format_score(score.score_before_multipliers, false)
    );
    if evidence.conflicting {
        summary.push_str(", conflicting");
    }

    let mut lines = vec![if use_colors {
        format!("{}  {}", heading.bold(), summary)
    } else {
        format!("{}  {}", heading, summary)
    }];

    for contribution in &score.steps {
        let value = format_points(contribution.points, contribution.op);
        let line = step_line(contribution.step, &value);
        if use_colors && !contribution.points.is_determined() {
            lines.push(line.dimmed().to_string());
        } else {
            lines.push(line);
        }
    }

    lines.join("\n")
}

/// Format a curation: one summary line, then every evidence breakdown
/// Summary: "{title}  score {score}  {classification} {✓|✗ reason}"
pub fn format_curation_report(report: &CurationReport, use_colors: bool) -> String {
    let incomplete = report
        .evidence
        .iter()
        .filter_map(|e| e.score.as_ref())
        .any(|s| s.incomplete());
    let score = format_score(report.score, incomplete);

    let verdict = match &report.rejection {
        None => {
            if use_colors {
                "✓".green().to_string()
            } else {
                "✓".to_string()
            }
        }
        Some(reason) => {
            if use_colors {
                format!("{} {}", "✗".red(), reason.red())
            } else {
                format!("✗ {}", reason)
            }
        }
    };

    let summary = if use_colors {
        format!(
            "{}  score {}  {} {}",
            report.title().bold(),
            score.bold(),
            report.classification.cyan(),
            verdict
        )
    } else {
        format!(
            "{}  score {}  {} {}",
            report.title(),
            score,
            report.classification,
            verdict
        )
    };

    std::iter::once(summary)
        .chain(
            report
                .evidence
                .iter()
                .map(|e| format_evidence_breakdown(e, use_colors)),
        )
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format validation results for one curation
/// Valid curations print a single "ok" line
pub fn format_field_errors(title: &str, errors: &[FieldError], use_colors: bool) -> String {
    if errors.is_empty() {
        return if use_colors {
            format!("{}  {}", title.bold(), "ok".green())
        } else {
            format!("{}  ok", title)
        };
    }

    let mut lines = vec![if use_colors {
        format!("{}  {}", title.bold(), format!("{} error(s)", errors.len()).red())
    } else {
        format!("{}  {} error(s)", title, errors.len())
    }];
    lines.extend(errors.iter().map(|e| format!("  - {}", e)));
    lines.join("\n")
}

/// Format the framework catalogue, one block per step
/// Interval rows use the same legends curators see ("50 ≤ size ≤ 99")
pub fn format_framework(table: &PointsTable, use_colors: bool) -> String {
    let mut blocks = Vec::new();

    for step in Step::ADDITIVE.into_iter().chain(Step::MULTIPLIERS) {
        let heading = format!("{:>3}  {} ({})", step.to_string(), step.title(), step.op().symbol());
        let mut lines = vec![if use_colors {
            heading.bold().to_string()
        } else {
            heading
        }];

        let rows: Vec<(String, String)> = table
            .entries_for(step)
            .map(|e| (e.key.label(), e.points.normalize().to_string()))
            .collect();
        let width = rows.iter().map(|(label, _)| label.chars().count()).max().unwrap_or(0);

        for (label, points) in rows {
            let padding = " ".repeat(width - label.chars().count());
            lines.push(format!("       {}{}  {:>4}", label, padding, points));
        }
        blocks.push(lines.join("\n"));
    }

    blocks.join("\n")
}
