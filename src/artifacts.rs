use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::classifier::ForestClassifier;
use crate::encoding::{CategoryEncoding, FeatureEncoder, LabelDecoder, FEATURE_COUNT};
use crate::error::{RiskError, RiskResult};
use crate::risk::RiskEngine;

pub const MODEL_FILE: &str = "student_model.json";
pub const ENCODERS_FILE: &str = "encoders.json";
pub const TARGET_ENCODER_FILE: &str = "target_encoder.json";

/// Everything loaded from the model directory at startup. Read-only afterwards.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub classifier: ForestClassifier,
    pub encoding: CategoryEncoding,
    pub decoder: LabelDecoder,
}

impl ModelArtifacts {
    pub fn load(dir: &Path) -> RiskResult<Self> {
        let model_path = dir.join(MODEL_FILE);
        let classifier: ForestClassifier = read_json(&model_path).map_err(|err| {
            RiskError::ClassifierUnavailable(err.to_string())
        })?;
        if classifier.trees.is_empty() {
            return Err(RiskError::ClassifierUnavailable(format!(
                "{} contains no trees",
                model_path.display()
            )));
        }
        if classifier.n_features != FEATURE_COUNT {
            return Err(RiskError::FeatureMismatch {
                expected: FEATURE_COUNT,
                actual: classifier.n_features,
            });
        }
        if let Some(idx) = classifier.max_feature_idx().filter(|&idx| idx >= FEATURE_COUNT) {
            return Err(RiskError::Artifact {
                path: model_path,
                reason: format!("split on feature {idx}, model has {FEATURE_COUNT}"),
            });
        }

        let encoders_path = dir.join(ENCODERS_FILE);
        let encoding: CategoryEncoding = read_json(&encoders_path)?;
        for (field, table) in encoding.tables() {
            if let Some(class) = table.duplicate() {
                return Err(RiskError::Artifact {
                    path: encoders_path,
                    reason: format!("{field} lists {class:?} more than once"),
                });
            }
        }

        let target_path = dir.join(TARGET_ENCODER_FILE);
        let decoder: LabelDecoder = read_json(&target_path)?;
        if decoder.classes().len() != 2 || !decoder.covers_risk_labels() {
            return Err(RiskError::Artifact {
                path: target_path,
                reason: format!("expected target classes No and Yes, found {:?}", decoder.classes()),
            });
        }

        tracing::info!(
            dir = %dir.display(),
            trees = classifier.trees.len(),
            "model artifacts loaded"
        );

        Ok(Self {
            classifier,
            encoding,
            decoder,
        })
    }

    pub fn engine(&self) -> RiskEngine<&ForestClassifier> {
        RiskEngine::new(
            &self.classifier,
            FeatureEncoder::new(self.encoding.clone()),
            self.decoder.clone(),
        )
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> RiskResult<T> {
    let artifact_err = |reason: String| RiskError::Artifact {
        path: path.to_path_buf(),
        reason,
    };
    let bytes = fs::read(path).map_err(|err| artifact_err(err.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|err| artifact_err(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Leaf, Split, TreeNode};
    use crate::models::{RiskLabel, StudentRecord, Subject};

    fn write_artifacts(dir: &Path, classifier: &ForestClassifier) {
        fs::write(
            dir.join(MODEL_FILE),
            serde_json::to_vec(classifier).unwrap(),
        )
        .unwrap();
        fs::write(
            dir.join(ENCODERS_FILE),
            serde_json::to_vec(&CategoryEncoding::standard()).unwrap(),
        )
        .unwrap();
        fs::write(
            dir.join(TARGET_ENCODER_FILE),
            serde_json::to_vec(&LabelDecoder::standard()).unwrap(),
        )
        .unwrap();
    }

    // Flags low attendance (feature 3) as at risk.
    fn attendance_forest() -> ForestClassifier {
        ForestClassifier {
            n_features: FEATURE_COUNT,
            trees: vec![TreeNode::Node(Split {
                feature_idx: 3,
                threshold: 60.0,
                left: Box::new(TreeNode::Leaf(Leaf { class_label: 1 })),
                right: Box::new(TreeNode::Leaf(Leaf { class_label: 0 })),
            })],
        }
    }

    fn record(attendance_rate: f64) -> StudentRecord {
        StudentRecord {
            student_id: Some("STUD00042".to_string()),
            gender: "Female".to_string(),
            age: 13,
            class_level: "JSS2".to_string(),
            attendance_rate,
            math_score: 48.0,
            english_score: 71.0,
            science_score: 66.0,
            prev_math_score: Some(52.0),
            prev_english_score: None,
            prev_science_score: None,
            study_hours: 6,
            parental_support: "No".to_string(),
            food_security: "Yes".to_string(),
        }
    }

    #[test]
    fn loads_directory_and_predicts() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path(), &attendance_forest());

        let artifacts = ModelArtifacts::load(dir.path()).unwrap();
        let engine = artifacts.engine();

        let low = engine.predict(&record(45.0)).unwrap();
        assert_eq!(low.risk_label, RiskLabel::AtRisk);
        assert_eq!(low.weakest_subject, Subject::Math);

        let high = engine.predict(&record(92.0)).unwrap();
        assert_eq!(high.risk_label, RiskLabel::NotAtRisk);
    }

    #[test]
    fn missing_model_is_classifier_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ModelArtifacts::load(dir.path()),
            Err(RiskError::ClassifierUnavailable(_))
        ));
    }

    #[test]
    fn corrupt_model_is_classifier_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path(), &attendance_forest());
        fs::write(dir.path().join(MODEL_FILE), b"not json").unwrap();
        assert!(matches!(
            ModelArtifacts::load(dir.path()),
            Err(RiskError::ClassifierUnavailable(_))
        ));
    }

    #[test]
    fn rejects_model_with_wrong_width() {
        let dir = tempfile::tempdir().unwrap();
        let mut forest = attendance_forest();
        forest.n_features = 8;
        write_artifacts(dir.path(), &forest);
        assert_eq!(
            ModelArtifacts::load(dir.path()).unwrap_err(),
            RiskError::FeatureMismatch {
                expected: FEATURE_COUNT,
                actual: 8
            }
        );
    }

    fn artifact_path(result: RiskResult<ModelArtifacts>) -> std::path::PathBuf {
        match result {
            Err(RiskError::Artifact { path, .. }) => path,
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_target_classes_other_than_yes_no() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path(), &attendance_forest());
        fs::write(dir.path().join(TARGET_ENCODER_FILE), r#"["false", "true"]"#).unwrap();
        let path = artifact_path(ModelArtifacts::load(dir.path()));
        assert!(path.ends_with(TARGET_ENCODER_FILE));
    }

    #[test]
    fn rejects_split_beyond_feature_count() {
        let dir = tempfile::tempdir().unwrap();
        let forest = ForestClassifier {
            n_features: FEATURE_COUNT,
            trees: vec![TreeNode::Node(Split {
                feature_idx: FEATURE_COUNT,
                threshold: 1.0,
                left: Box::new(TreeNode::Leaf(Leaf { class_label: 1 })),
                right: Box::new(TreeNode::Leaf(Leaf { class_label: 0 })),
            })],
        };
        write_artifacts(dir.path(), &forest);
        let path = artifact_path(ModelArtifacts::load(dir.path()));
        assert!(path.ends_with(MODEL_FILE));
    }

    #[test]
    fn rejects_repeated_encoder_classes() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path(), &attendance_forest());
        let encoders = r#"{
            "gender": ["Female", "Male"],
            "class_level": ["JSS1", "JSS2", "JSS2", "SS1", "SS2", "SS3"],
            "parental_support": ["No", "Yes"],
            "food_security": ["No", "Yes"]
        }"#;
        fs::write(dir.path().join(ENCODERS_FILE), encoders).unwrap();
        let path = artifact_path(ModelArtifacts::load(dir.path()));
        assert!(path.ends_with(ENCODERS_FILE));
    }

    #[test]
    fn missing_encoders_report_path() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path(), &attendance_forest());
        fs::remove_file(dir.path().join(ENCODERS_FILE)).unwrap();
        match ModelArtifacts::load(dir.path()) {
            Err(RiskError::Artifact { path, .. }) => {
                assert!(path.ends_with(ENCODERS_FILE));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
