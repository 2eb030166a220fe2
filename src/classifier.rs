use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{RiskError, RiskResult};

/// A pre-trained binary classifier that maps a feature vector to a label code.
pub trait Classifier {
    fn predict(&self, features: &[f64]) -> RiskResult<i64>;
}

impl<C: Classifier + ?Sized> Classifier for &C {
    fn predict(&self, features: &[f64]) -> RiskResult<i64> {
        (**self).predict(features)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Split {
    pub feature_idx: usize,
    pub threshold: f64,
    pub left: Box<TreeNode>,
    pub right: Box<TreeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leaf {
    pub class_label: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Node(Split),
    Leaf(Leaf),
}

impl TreeNode {
    /// Largest feature index any split in this tree reads.
    fn max_feature_idx(&self) -> Option<usize> {
        match self {
            TreeNode::Leaf(_) => None,
            TreeNode::Node(split) => [
                Some(split.feature_idx),
                split.left.max_feature_idx(),
                split.right.max_feature_idx(),
            ]
            .into_iter()
            .flatten()
            .max(),
        }
    }

    fn predict(&self, features: &[f64]) -> RiskResult<i64> {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf(leaf) => return Ok(leaf.class_label),
                TreeNode::Node(split) => {
                    let value = features.get(split.feature_idx).ok_or_else(|| {
                        RiskError::ClassifierUnavailable(format!(
                            "tree splits on feature {} of {}",
                            split.feature_idx,
                            features.len()
                        ))
                    })?;
                    node = if *value <= split.threshold {
                        &*split.left
                    } else {
                        &*split.right
                    };
                }
            }
        }
    }
}

/// Decision forest voting by simple majority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestClassifier {
    pub n_features: usize,
    pub trees: Vec<TreeNode>,
}

impl ForestClassifier {
    pub fn max_feature_idx(&self) -> Option<usize> {
        self.trees.iter().filter_map(TreeNode::max_feature_idx).max()
    }
}

impl Classifier for ForestClassifier {
    fn predict(&self, features: &[f64]) -> RiskResult<i64> {
        if self.trees.is_empty() {
            return Err(RiskError::ClassifierUnavailable(
                "forest has no trees".to_string(),
            ));
        }
        if features.len() != self.n_features {
            return Err(RiskError::FeatureMismatch {
                expected: self.n_features,
                actual: features.len(),
            });
        }

        let mut votes: BTreeMap<i64, usize> = BTreeMap::new();
        for tree in &self.trees {
            *votes.entry(tree.predict(features)?).or_insert(0) += 1;
        }

        // Ascending key order, and max_by_key keeps the last max, so walk in reverse
        // to let the lowest code win a tied vote.
        votes
            .into_iter()
            .rev()
            .max_by_key(|&(_, count)| count)
            .map(|(label, _)| label)
            .ok_or_else(|| RiskError::ClassifierUnavailable("no votes cast".to_string()))
    }
}
