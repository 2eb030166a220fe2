use std::io::Read;
use std::path::Path;

use anyhow::Context;

use crate::classifier::Classifier;
use crate::models::{ScoredStudent, StudentRecord};
use crate::risk::RiskEngine;

pub fn load_csv(csv_path: &Path) -> anyhow::Result<Vec<StudentRecord>> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    read_records(file)
}

/// CSV line number of the `idx`-th data row; line 1 is the header.
fn csv_line(idx: usize) -> usize {
    idx + 2
}

pub fn read_records<R: Read>(input: R) -> anyhow::Result<Vec<StudentRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);
    let mut records = Vec::new();

    for (idx, result) in reader.deserialize::<StudentRecord>().enumerate() {
        let record = result.with_context(|| format!("invalid student row {}", csv_line(idx)))?;
        records.push(record);
    }

    Ok(records)
}

/// Scores every record, stopping at the first row that cannot be predicted.
/// Errors name rows the same way `read_records` does.
pub fn score_records<C: Classifier>(
    engine: &RiskEngine<C>,
    records: Vec<StudentRecord>,
) -> anyhow::Result<Vec<ScoredStudent>> {
    let mut scored = Vec::with_capacity(records.len());

    for (idx, record) in records.into_iter().enumerate() {
        let result = engine
            .predict(&record)
            .with_context(|| format!("student row {} ({})", csv_line(idx), record.label()))?;
        scored.push(ScoredStudent { record, result });
    }

    Ok(scored)
}

/// At-risk students first, then lowest readiness.
pub fn rank(scored: &mut [ScoredStudent]) {
    scored.sort_by(|a, b| {
        b.result
            .risk_label
            .is_at_risk()
            .cmp(&a.result.risk_label.is_at_risk())
            .then(
                a.result
                    .readiness_score
                    .partial_cmp(&b.result.readiness_score)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{CategoryEncoding, FeatureEncoder, LabelDecoder};
    use crate::error::RiskResult;
    use crate::models::RiskLabel;

    const SAMPLE: &str = "\
student_id,gender,age,class_level,attendance_rate,math_score,english_score,science_score,study_hours,parental_support,food_security,at_risk,prev_math_score
STUD00001,Male,15,SS1,85.0,60.0,62.0,58.0,10,Yes,Yes,No,55.5
STUD00002,Female,12,JSS1,52.3,40.1,44.0,39.8,3,No,No,Yes,
STUD00003, Female ,17,SS3,91.0,78.0,70.0,82.0,14,Yes,Yes,No,
";

    struct AttendanceRule;

    impl Classifier for AttendanceRule {
        fn predict(&self, features: &[f64]) -> RiskResult<i64> {
            Ok(if features[3] < 60.0 { 1 } else { 0 })
        }
    }

    fn engine() -> RiskEngine<AttendanceRule> {
        RiskEngine::new(
            AttendanceRule,
            FeatureEncoder::new(CategoryEncoding::standard()),
            LabelDecoder::standard(),
        )
    }

    #[test]
    fn reads_dataset_rows_with_optional_columns() {
        let records = read_records(SAMPLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].student_id.as_deref(), Some("STUD00001"));
        assert_eq!(records[0].prev_math_score, Some(55.5));
        assert_eq!(records[1].prev_math_score, None);
        assert_eq!(records[1].prev_science_score, None);
        assert_eq!(records[2].gender, "Female");
    }

    #[test]
    fn bad_row_names_its_line() {
        let csv = "gender,age,class_level,attendance_rate,math_score,english_score,science_score,study_hours,parental_support,food_security\n\
                   Male,fifteen,SS1,85,60,62,58,10,Yes,Yes\n";
        let err = read_records(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn ranks_at_risk_first_then_readiness() {
        let records = read_records(SAMPLE.as_bytes()).unwrap();
        let mut scored = score_records(&engine(), records).unwrap();
        rank(&mut scored);

        assert_eq!(scored[0].result.risk_label, RiskLabel::AtRisk);
        assert_eq!(scored[0].record.student_id.as_deref(), Some("STUD00002"));
        assert_eq!(scored[1].record.student_id.as_deref(), Some("STUD00001"));
        assert_eq!(scored[2].record.student_id.as_deref(), Some("STUD00003"));
    }

    #[test]
    fn unknown_category_aborts_batch() {
        let mut records = read_records(SAMPLE.as_bytes()).unwrap();
        records[1].class_level = "SS4".to_string();
        let err = score_records(&engine(), records).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("SS4"));
        // Second data row sits on line 3 of the file, as in read errors.
        assert!(message.starts_with("student row 3 (STUD00002)"));
    }
}
