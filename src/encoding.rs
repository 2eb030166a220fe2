use serde::{Deserialize, Serialize};

use crate::error::{RiskError, RiskResult};
use crate::models::{RiskLabel, StudentRecord};

/// Column order the classifier was trained on.
pub const FEATURE_NAMES: [&str; 10] = [
    "gender",
    "age",
    "class_level",
    "attendance_rate",
    "math_score",
    "english_score",
    "science_score",
    "study_hours",
    "parental_support",
    "food_security",
];

pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

const AT_RISK_CLASS: &str = "Yes";
const NOT_AT_RISK_CLASS: &str = "No";

/// String classes of one categorical column. A class's code is its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTable {
    classes: Vec<String>,
}

impl CategoryTable {
    /// Numbers the sorted distinct classes from zero.
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut classes: Vec<String> = values.into_iter().map(Into::into).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn code(&self, value: &str) -> Option<i64> {
        self.classes
            .iter()
            .position(|class| class == value)
            .map(|idx| idx as i64)
    }

    pub fn class(&self, code: i64) -> Option<&str> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| self.classes.get(idx))
            .map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// First class listed more than once, if any.
    pub fn duplicate(&self) -> Option<&str> {
        self.classes
            .iter()
            .enumerate()
            .find(|(idx, class)| self.classes[..*idx].contains(*class))
            .map(|(_, class)| class.as_str())
    }
}

/// Per-field category tables, fixed at training time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEncoding {
    pub gender: CategoryTable,
    pub class_level: CategoryTable,
    pub parental_support: CategoryTable,
    pub food_security: CategoryTable,
}

impl CategoryEncoding {
    /// Tables matching the form's value sets.
    pub fn standard() -> Self {
        Self {
            gender: CategoryTable::fit(["Male", "Female"]),
            class_level: CategoryTable::fit(["JSS1", "JSS2", "JSS3", "SS1", "SS2", "SS3"]),
            parental_support: CategoryTable::fit(["Yes", "No"]),
            food_security: CategoryTable::fit(["Yes", "No"]),
        }
    }

    pub fn tables(&self) -> [(&'static str, &CategoryTable); 4] {
        [
            ("gender", &self.gender),
            ("class_level", &self.class_level),
            ("parental_support", &self.parental_support),
            ("food_security", &self.food_security),
        ]
    }

    fn lookup(table: &CategoryTable, field: &'static str, value: &str) -> RiskResult<i64> {
        table.code(value).ok_or_else(|| RiskError::UnknownCategory {
            field,
            value: value.to_string(),
        })
    }
}

/// Maps classifier output codes back to a risk label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelDecoder {
    table: CategoryTable,
}

impl LabelDecoder {
    pub fn standard() -> Self {
        Self {
            table: CategoryTable::fit([AT_RISK_CLASS, NOT_AT_RISK_CLASS]),
        }
    }

    pub fn decode(&self, code: i64) -> RiskResult<RiskLabel> {
        match self.table.class(code) {
            Some(AT_RISK_CLASS) => Ok(RiskLabel::AtRisk),
            Some(NOT_AT_RISK_CLASS) => Ok(RiskLabel::NotAtRisk),
            _ => Err(RiskError::UnknownLabel(code)),
        }
    }

    pub fn classes(&self) -> &[String] {
        self.table.classes()
    }

    /// True when both risk classes have a code.
    pub fn covers_risk_labels(&self) -> bool {
        self.table.code(AT_RISK_CLASS).is_some() && self.table.code(NOT_AT_RISK_CLASS).is_some()
    }
}

#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    encoding: CategoryEncoding,
}

impl FeatureEncoder {
    pub fn new(encoding: CategoryEncoding) -> Self {
        Self { encoding }
    }

    /// Builds the feature vector in `FEATURE_NAMES` order.
    pub fn encode(&self, record: &StudentRecord) -> RiskResult<Vec<f64>> {
        let enc = &self.encoding;
        let gender = CategoryEncoding::lookup(&enc.gender, "gender", &record.gender)?;
        let class_level =
            CategoryEncoding::lookup(&enc.class_level, "class_level", &record.class_level)?;
        let parental_support = CategoryEncoding::lookup(
            &enc.parental_support,
            "parental_support",
            &record.parental_support,
        )?;
        let food_security =
            CategoryEncoding::lookup(&enc.food_security, "food_security", &record.food_security)?;

        Ok(vec![
            gender as f64,
            f64::from(record.age),
            class_level as f64,
            record.attendance_rate,
            record.math_score,
            record.english_score,
            record.science_score,
            f64::from(record.study_hours),
            parental_support as f64,
            food_security as f64,
        ])
    }
}
