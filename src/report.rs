use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{ScoredStudent, Subject, Trend};

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectSummary {
    pub subject: Subject,
    pub weakest_count: usize,
    pub avg_score: f64,
    pub declining_count: usize,
}

pub fn summarize_by_subject(scored: &[ScoredStudent]) -> Vec<SubjectSummary> {
    let mut summaries: Vec<SubjectSummary> = Subject::ALL
        .into_iter()
        .map(|subject| {
            let total: f64 = scored.iter().map(|s| s.record.score(subject)).sum();
            SubjectSummary {
                subject,
                weakest_count: scored
                    .iter()
                    .filter(|s| s.result.weakest_subject == subject)
                    .count(),
                avg_score: if scored.is_empty() {
                    0.0
                } else {
                    total / scored.len() as f64
                },
                declining_count: scored
                    .iter()
                    .filter(|s| s.result.subject_trend.get(&subject) == Some(&Trend::Declining))
                    .count(),
            }
        })
        .collect();

    // Stable sort keeps Math, English, Science order among equal counts.
    summaries.sort_by(|a, b| b.weakest_count.cmp(&a.weakest_count));
    summaries
}

fn trend_line(student: &ScoredStudent) -> String {
    Subject::ALL
        .into_iter()
        .map(|subject| {
            let arrow = student
                .result
                .subject_trend
                .get(&subject)
                .copied()
                .unwrap_or(Trend::Unknown)
                .arrow();
            format!("{subject} {arrow}")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Expects `scored` already ranked.
pub fn build_report(source: &str, generated: NaiveDate, scored: &[ScoredStudent]) -> String {
    let summaries = summarize_by_subject(scored);
    let at_risk: Vec<&ScoredStudent> = scored
        .iter()
        .filter(|s| s.result.risk_label.is_at_risk())
        .collect();

    let mut output = String::new();

    let _ = writeln!(output, "# EduStat Student Risk Report");
    let _ = writeln!(output, "Generated on {} from {}", generated, source);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");

    if scored.is_empty() {
        let _ = writeln!(output, "No students in this file.");
        return output;
    }

    let avg_readiness =
        scored.iter().map(|s| s.result.readiness_score).sum::<f64>() / scored.len() as f64;
    let _ = writeln!(
        output,
        "- {} of {} students predicted at risk ({:.1}%)",
        at_risk.len(),
        scored.len(),
        at_risk.len() as f64 * 100.0 / scored.len() as f64
    );
    let _ = writeln!(output, "- Average readiness score {:.2}", avg_readiness);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Weakest Subjects");
    for summary in summaries.iter() {
        let _ = writeln!(
            output,
            "- {}: weakest for {} students (avg score {:.1}, {} declining)",
            summary.subject, summary.weakest_count, summary.avg_score, summary.declining_count
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Students At Risk");

    if at_risk.is_empty() {
        let _ = writeln!(output, "No students predicted at risk.");
    } else {
        for student in at_risk.iter() {
            let _ = writeln!(
                output,
                "- {} ({}, {}) readiness {:.2}, weakest {} [{}]",
                student.record.label(),
                student.record.class_level,
                student.record.gender,
                student.result.readiness_score,
                student.result.weakest_subject,
                trend_line(student)
            );
        }
    }

    output
}
