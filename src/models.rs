use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw student attributes as supplied by the caller. Categorical fields keep
/// the caller's strings so unseen values surface at encoding time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    #[serde(default)]
    pub student_id: Option<String>,
    pub gender: String,
    pub age: u32,
    pub class_level: String,
    pub attendance_rate: f64,
    pub math_score: f64,
    pub english_score: f64,
    pub science_score: f64,
    #[serde(default)]
    pub prev_math_score: Option<f64>,
    #[serde(default)]
    pub prev_english_score: Option<f64>,
    #[serde(default)]
    pub prev_science_score: Option<f64>,
    pub study_hours: u32,
    pub parental_support: String,
    pub food_security: String,
}

impl StudentRecord {
    pub fn score(&self, subject: Subject) -> f64 {
        match subject {
            Subject::Math => self.math_score,
            Subject::English => self.english_score,
            Subject::Science => self.science_score,
        }
    }

    pub fn previous_score(&self, subject: Subject) -> Option<f64> {
        match subject {
            Subject::Math => self.prev_math_score,
            Subject::English => self.prev_english_score,
            Subject::Science => self.prev_science_score,
        }
    }

    pub fn label(&self) -> &str {
        self.student_id.as_deref().unwrap_or("(unnamed)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Subject {
    Math,
    English,
    Science,
}

impl Subject {
    /// Fixed priority order, also used to break ties for the weakest subject.
    pub const ALL: [Subject; 3] = [Subject::Math, Subject::English, Subject::Science];
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Subject::Math => "Math",
            Subject::English => "English",
            Subject::Science => "Science",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Improving,
    Declining,
    Unknown,
}

impl Trend {
    pub fn arrow(self) -> &'static str {
        match self {
            Trend::Improving => "↑",
            Trend::Declining => "↓",
            Trend::Unknown => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    AtRisk,
    NotAtRisk,
}

impl RiskLabel {
    pub fn is_at_risk(self) -> bool {
        self == RiskLabel::AtRisk
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub risk_label: RiskLabel,
    pub weakest_subject: Subject,
    pub subject_trend: BTreeMap<Subject, Trend>,
    pub readiness_score: f64,
}

/// A scored batch row, kept together for listing and reporting.
#[derive(Debug, Clone)]
pub struct ScoredStudent {
    pub record: StudentRecord,
    pub result: PredictionResult,
}
