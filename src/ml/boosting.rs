//! Gradient-boosted regression trees
//!
//! Evaluation and path attribution for an ensemble of binary regression trees
//! exported from an offline trainer. Each tree is a flat node array with the
//! root at index 0 and children always stored after their parent.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::models::{Contributions, MLModel};
use super::FeatureVector;
use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// `x[feature] < threshold` goes left. `value` is the mean response of
    /// the training rows that reached this node.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        value: f64,
        /// Branch taken when the input is NaN.
        #[serde(default = "default_left")]
        default_left: bool,
    },
    Leaf {
        value: f64,
    },
}

fn default_left() -> bool {
    true
}

impl TreeNode {
    pub fn value(&self) -> f64 {
        match *self {
            Self::Split { value, .. } | Self::Leaf { value } => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    fn validate(&self, n_features: usize) -> Result<(), EngineError> {
        if self.nodes.is_empty() {
            return Err(EngineError::InvalidModel("tree has no nodes".into()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            let TreeNode::Split {
                feature,
                threshold,
                left,
                right,
                ..
            } = *node
            else {
                continue;
            };
            if feature >= n_features {
                return Err(EngineError::InvalidModel(format!(
                    "node {i} splits on feature {feature}, model has {n_features}"
                )));
            }
            if !threshold.is_finite() {
                return Err(EngineError::InvalidModel(format!(
                    "node {i} has a non-finite threshold"
                )));
            }
            for child in [left, right] {
                if child <= i || child >= self.nodes.len() {
                    return Err(EngineError::InvalidModel(format!(
                        "node {i} has out-of-order child {child}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Walk root to leaf, calling `visit(feature, parent_value, child_value)`
    /// at every split. Returns the leaf value.
    fn walk(&self, x: &[f64], mut visit: impl FnMut(usize, f64, f64)) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    value,
                    default_left,
                } => {
                    let v = x[*feature];
                    let go_left = if v.is_nan() { *default_left } else { v < *threshold };
                    let next = if go_left { *left } else { *right };
                    visit(*feature, *value, self.nodes[next].value());
                    idx = next;
                }
            }
        }
    }

    pub fn predict(&self, x: &[f64]) -> f64 {
        self.walk(x, |_, _, _| {})
    }

    fn root_value(&self) -> f64 {
        self.nodes.first().map(TreeNode::value).unwrap_or(0.0)
    }
}

/// Additive ensemble: `base_score + Σ tree(x)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    pub n_features: usize,
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<RegressionTree>,
}

impl GradientBoostedTrees {
    /// Structural checks that make evaluation panic-free.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.trees.is_empty() {
            return Err(EngineError::InvalidModel("ensemble has no trees".into()));
        }
        self.trees
            .iter()
            .try_for_each(|tree| tree.validate(self.n_features))
    }
}

impl MLModel for GradientBoostedTrees {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        self.check_len(features)?;
        Ok(self.base_score
            + self
                .trees
                .iter()
                .map(|t| t.predict(&features.features))
                .sum::<f64>())
    }

    /// Saabas path attribution: at each split the change in node expectation
    /// is credited to the split feature. The bias is the sum of root values.
    fn contributions(&self, features: &FeatureVector) -> Result<Contributions> {
        self.check_len(features)?;
        let mut values = vec![0.0; self.n_features];
        let mut base_value = self.base_score;

        for tree in &self.trees {
            base_value += tree.root_value();
            tree.walk(&features.features, |feature, parent, child| {
                values[feature] += child - parent;
            });
        }

        Ok(Contributions { base_value, values })
    }

    fn n_features(&self) -> usize {
        self.n_features
    }
}
