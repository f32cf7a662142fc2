//! Opaque scorers: encoded feature matrix → fraud probabilities.

use super::artifact::TreeSpec;
use super::error::ScorerError;
use ndarray::{Array1, ArrayView1, ArrayView2};

/// The trained decision function. Implementations must be deterministic and
/// must not mutate shared state observable by other callers.
pub trait Scorer: Send + Sync {
    /// One probability of the positive (fraud) class per row, in row order.
    fn predict_proba(&self, features: ArrayView2<'_, f32>) -> Result<Vec<f64>, ScorerError>;

    /// Short label for logs and health output.
    fn kind(&self) -> &'static str;
}

fn check_width(features: &ArrayView2<'_, f32>, expected: usize) -> Result<(), ScorerError> {
    if features.ncols() == expected {
        Ok(())
    } else {
        Err(ScorerError::Width {
            expected,
            found: features.ncols(),
        })
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

pub struct LogisticScorer {
    coef: Array1<f64>,
    intercept: f64,
}

impl LogisticScorer {
    pub fn new(coef: &[f64], intercept: f64, width: usize) -> Result<Self, String> {
        if coef.len() != width {
            return Err(format!(
                "logistic model has {} coefficients for {} features",
                coef.len(),
                width
            ));
        }
        if !intercept.is_finite() || coef.iter().any(|c| !c.is_finite()) {
            return Err("logistic model has non-finite parameters".to_string());
        }
        Ok(Self {
            coef: Array1::from(coef.to_vec()),
            intercept,
        })
    }
}

impl Scorer for LogisticScorer {
    fn predict_proba(&self, features: ArrayView2<'_, f32>) -> Result<Vec<f64>, ScorerError> {
        check_width(&features, self.coef.len())?;
        // f64 accumulation: saturated f32 features must not overflow the sum
        let logits = features.mapv(f64::from).dot(&self.coef);
        Ok(logits.iter().map(|&z| sigmoid(z + self.intercept)).collect())
    }

    fn kind(&self) -> &'static str {
        "logistic"
    }
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf(f64),
}

struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_spec(spec: &TreeSpec, width: usize) -> Result<Self, String> {
        let n = spec.children_left.len();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if [
            spec.children_right.len(),
            spec.feature.len(),
            spec.threshold.len(),
            spec.value.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            return Err("tree arrays differ in length".to_string());
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let (left, right) = (spec.children_left[i], spec.children_right[i]);
            if left == -1 {
                if right != -1 {
                    return Err(format!("node {i} has only one child"));
                }
                let value = spec.value[i];
                if !(0.0..=1.0).contains(&value) {
                    return Err(format!("leaf {i} value {value} is not a probability"));
                }
                nodes.push(Node::Leaf(value));
                continue;
            }
            // children always follow their parent, so traversal terminates
            let child = |c: i64| {
                usize::try_from(c)
                    .ok()
                    .filter(|&c| c > i && c < n)
                    .ok_or_else(|| format!("node {i} has invalid child {c}"))
            };
            let feature = usize::try_from(spec.feature[i])
                .ok()
                .filter(|&f| f < width)
                .ok_or_else(|| format!("node {i} splits on unknown feature {}", spec.feature[i]))?;
            let threshold = spec.threshold[i];
            if !threshold.is_finite() {
                return Err(format!("node {i} has a non-finite threshold"));
            }
            nodes.push(Node::Split {
                feature,
                threshold,
                left: child(left)?,
                right: child(right)?,
            });
        }
        Ok(Self { nodes })
    }

    fn predict(&self, row: &ArrayView1<'_, f32>) -> f64 {
        let mut node = 0;
        loop {
            match self.nodes[node] {
                Node::Leaf(p) => return p,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if f64::from(row[feature]) <= threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// Averaged leaf probabilities over an ensemble of trees.
pub struct ForestScorer {
    trees: Vec<Tree>,
    width: usize,
}

impl ForestScorer {
    pub fn new(specs: &[TreeSpec], width: usize) -> Result<Self, String> {
        if specs.is_empty() {
            return Err("forest has no trees".to_string());
        }
        let trees = specs
            .iter()
            .enumerate()
            .map(|(t, spec)| Tree::from_spec(spec, width).map_err(|e| format!("tree {t}: {e}")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { trees, width })
    }
}

impl Scorer for ForestScorer {
    fn predict_proba(&self, features: ArrayView2<'_, f32>) -> Result<Vec<f64>, ScorerError> {
        check_width(&features, self.width)?;
        let n_trees = self.trees.len() as f64;
        Ok(features
            .rows()
            .into_iter()
            .map(|row| self.trees.iter().map(|t| t.predict(&row)).sum::<f64>() / n_trees)
            .collect())
    }

    fn kind(&self) -> &'static str {
        "forest"
    }
}
