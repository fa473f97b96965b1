//! JSON model artifacts exported by the training job.
//!
//! Two model kinds are supported, matching the candidates the training job
//! selects between:
//!
//! ```json
//! {"kind": "linear", "intercept": 1000.0, "coefficients": {"area": 2500.0}}
//! ```
//!
//! ```json
//! {
//!   "kind": "forest",
//!   "trees": [
//!     {"nodes": [
//!       {"feature": "area", "threshold": 80.0, "left": 1, "right": 2},
//!       {"leaf": 300000.0},
//!       {"leaf": 450000.0}
//!     ]}
//!   ],
//!   "fill_values": {"area": 95.0}
//! }
//! ```
//!
//! Feature names are resolved against the loaded schema once, in [`ModelArtifact::bind`].

use crate::models::Regressor;
use crate::schema::{FeatureRow, FeatureSchema, FeatureValue};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Serialized model as found on disk
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelArtifact {
    Linear {
        intercept: f64,
        coefficients: BTreeMap<String, f64>,
        /// Imputation values for missing inputs
        #[serde(default)]
        fill_values: BTreeMap<String, f64>,
    },
    Forest {
        trees: Vec<TreeArtifact>,
        #[serde(default)]
        fill_values: BTreeMap<String, f64>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeArtifact {
    pub nodes: Vec<NodeArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NodeArtifact {
    Split {
        feature: String,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        leaf: f64,
    },
}

impl ModelArtifact {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).context("Invalid model artifact")
    }

    /// Resolve feature names to schema positions and validate the structure
    pub fn bind(self, schema: &FeatureSchema) -> Result<Box<dyn Regressor>> {
        match self {
            ModelArtifact::Linear {
                intercept,
                coefficients,
                fill_values,
            } => {
                let columns = BoundColumns::new(schema, &fill_values)?;
                let terms = coefficients
                    .into_iter()
                    .map(|(name, weight)| Ok((columns.resolve(&name)?, weight)))
                    .collect::<Result<Vec<_>>>()?;

                Ok(Box::new(LinearRegressor {
                    intercept,
                    terms,
                    columns,
                }))
            }
            ModelArtifact::Forest { trees, fill_values } => {
                if trees.is_empty() {
                    bail!("forest artifact has no trees");
                }
                let columns = BoundColumns::new(schema, &fill_values)?;
                let trees = trees
                    .into_iter()
                    .enumerate()
                    .map(|(i, tree)| {
                        bind_tree(tree, &columns).with_context(|| format!("invalid tree {}", i))
                    })
                    .collect::<Result<Vec<_>>>()?;

                Ok(Box::new(ForestRegressor { trees, columns }))
            }
        }
    }
}

/// Schema columns plus per-column imputation values
#[derive(Debug, Clone)]
struct BoundColumns {
    names: Vec<String>,
    fill: Vec<Option<f64>>,
}

impl BoundColumns {
    fn new(schema: &FeatureSchema, fill_values: &BTreeMap<String, f64>) -> Result<Self> {
        let mut fill = vec![None; schema.len()];
        for (name, value) in fill_values {
            let i = schema
                .position(name)
                .with_context(|| format!("fill value for unknown feature '{}'", name))?;
            fill[i] = Some(*value);
        }

        Ok(Self {
            names: schema.columns().to_vec(),
            fill,
        })
    }

    fn resolve(&self, name: &str) -> Result<usize> {
        match self.names.iter().position(|n| n == name) {
            Some(i) => Ok(i),
            None => bail!("model references feature '{}' missing from schema", name),
        }
    }

    /// Numeric input at a bound position
    fn input(&self, row: &FeatureRow, index: usize) -> Result<f64> {
        let name = &self.names[index];
        match row.value_at(index) {
            Some(FeatureValue::Number(n)) => Ok(*n),
            Some(FeatureValue::Missing) => match self.fill[index] {
                Some(v) => Ok(v),
                None => bail!("missing value for feature '{}'", name),
            },
            Some(FeatureValue::Text(s)) => {
                bail!("feature '{}' has non-numeric value '{}'", name, s)
            }
            None => bail!("row has no column at position {} ('{}')", index, name),
        }
    }

    fn check_row(&self, row: &FeatureRow) -> Result<()> {
        if row.len() != self.names.len() {
            bail!(
                "row has {} columns, model expects {}",
                row.len(),
                self.names.len()
            );
        }
        Ok(())
    }
}

/// `intercept + Σ weight · value`
#[derive(Debug, Clone)]
pub struct LinearRegressor {
    intercept: f64,
    terms: Vec<(usize, f64)>,
    columns: BoundColumns,
}

impl Regressor for LinearRegressor {
    fn name(&self) -> &str {
        "linear"
    }

    fn predict(&self, row: &FeatureRow) -> Result<f64> {
        self.columns.check_row(row)?;
        let mut total = self.intercept;
        for &(index, weight) in &self.terms {
            total += weight * self.columns.input(row, index)?;
        }
        Ok(total)
    }
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf(f64),
}

fn bind_tree(tree: TreeArtifact, columns: &BoundColumns) -> Result<Vec<Node>> {
    if tree.nodes.is_empty() {
        bail!("tree has no nodes");
    }
    let len = tree.nodes.len();

    tree.nodes
        .into_iter()
        .enumerate()
        .map(|(i, node)| match node {
            NodeArtifact::Leaf { leaf } => Ok(Node::Leaf(leaf)),
            NodeArtifact::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                // children must point forward so traversal always terminates
                for child in [left, right] {
                    if child <= i || child >= len {
                        bail!("node {} has invalid child index {}", i, child);
                    }
                }
                Ok(Node::Split {
                    feature: columns.resolve(&feature)?,
                    threshold,
                    left,
                    right,
                })
            }
        })
        .collect()
}

/// Mean of regression tree outputs (value ≤ threshold goes left)
#[derive(Debug, Clone)]
pub struct ForestRegressor {
    trees: Vec<Vec<Node>>,
    columns: BoundColumns,
}

impl ForestRegressor {
    fn predict_tree(&self, nodes: &[Node], row: &FeatureRow) -> Result<f64> {
        let mut i = 0;
        loop {
            match &nodes[i] {
                Node::Leaf(value) => return Ok(*value),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = self.columns.input(row, *feature)?;
                    i = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for ForestRegressor {
    fn name(&self) -> &str {
        "forest"
    }

    fn predict(&self, row: &FeatureRow) -> Result<f64> {
        self.columns.check_row(row)?;
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += self.predict_tree(tree, row)?;
        }
        Ok(sum / self.trees.len() as f64)
    }
}
