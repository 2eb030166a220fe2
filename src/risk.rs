use std::collections::BTreeMap;

use crate::classifier::Classifier;
use crate::encoding::{FeatureEncoder, LabelDecoder};
use crate::error::{RiskError, RiskResult};
use crate::models::{PredictionResult, StudentRecord, Subject, Trend};

const ATTENDANCE_WEIGHT: f64 = 0.4;
const SCORE_WEIGHT: f64 = 0.6;

/// Combines the injected classifier with the derived per-student metrics.
pub struct RiskEngine<C> {
    classifier: C,
    encoder: FeatureEncoder,
    decoder: LabelDecoder,
}

impl<C: Classifier> RiskEngine<C> {
    pub fn new(classifier: C, encoder: FeatureEncoder, decoder: LabelDecoder) -> Self {
        Self {
            classifier,
            encoder,
            decoder,
        }
    }

    pub fn predict(&self, record: &StudentRecord) -> RiskResult<PredictionResult> {
        validate(record)?;
        let features = self.encoder.encode(record)?;
        let code = self.classifier.predict(&features)?;
        let risk_label = self.decoder.decode(code)?;
        tracing::debug!(student = record.label(), code, ?risk_label, "classified");

        Ok(PredictionResult {
            risk_label,
            weakest_subject: weakest_subject(record),
            subject_trend: subject_trends(record),
            readiness_score: readiness_score(record),
        })
    }
}

/// Lowest current score; ties go to the earlier subject in `Subject::ALL`.
pub fn weakest_subject(record: &StudentRecord) -> Subject {
    let mut weakest = Subject::ALL[0];
    for subject in Subject::ALL.into_iter().skip(1) {
        if record.score(subject) < record.score(weakest) {
            weakest = subject;
        }
    }
    weakest
}

/// Equal current and previous scores count as declining.
pub fn trend(current: f64, previous: Option<f64>) -> Trend {
    match previous {
        None => Trend::Unknown,
        Some(prev) if current > prev => Trend::Improving,
        Some(_) => Trend::Declining,
    }
}

pub fn subject_trends(record: &StudentRecord) -> BTreeMap<Subject, Trend> {
    Subject::ALL
        .into_iter()
        .map(|subject| {
            (
                subject,
                trend(record.score(subject), record.previous_score(subject)),
            )
        })
        .collect()
}

pub fn readiness_score(record: &StudentRecord) -> f64 {
    let average = Subject::ALL
        .into_iter()
        .map(|subject| record.score(subject))
        .sum::<f64>()
        / Subject::ALL.len() as f64;
    round2(record.attendance_rate * ATTENDANCE_WEIGHT + average * SCORE_WEIGHT)
}

/// Two decimals, ties to even.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

pub fn validate(record: &StudentRecord) -> RiskResult<()> {
    check_range("age", f64::from(record.age), 10.0, 20.0)?;
    check_range("attendance_rate", record.attendance_rate, 30.0, 100.0)?;
    check_range("study_hours", f64::from(record.study_hours), 0.0, 24.0)?;

    for subject in Subject::ALL {
        let (current, previous) = match subject {
            Subject::Math => ("math_score", "prev_math_score"),
            Subject::English => ("english_score", "prev_english_score"),
            Subject::Science => ("science_score", "prev_science_score"),
        };
        check_range(current, record.score(subject), 0.0, 100.0)?;
        if let Some(value) = record.previous_score(subject) {
            check_range(previous, value, 0.0, 100.0)?;
        }
    }

    Ok(())
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> RiskResult<()> {
    // NaN fails both comparisons, so test containment rather than exclusion.
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(RiskError::OutOfRangeInput {
            field,
            value,
            min,
            max,
        })
    }
}
