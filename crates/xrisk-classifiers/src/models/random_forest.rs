//! Bagged ensemble of gbdt regression trees.
//!
//! Each tree is fitted on a bootstrap sample of the rows and a random subset
//! of the features; the ensemble output is the mean tree output. Every tree
//! draws from its own seeded RNG, so the fitted forest depends only on the
//! seed and not on how rayon schedules the work.
use gbdt::decision_tree::DecisionTree;
use rand::seq::index::sample;
use rand::Rng;
use rayon::prelude::*;

use crate::data_handling::Table;
use crate::error::{Result, XriskError};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::utils::{all_indices, finite_design_matrix, fit_tree, to_data_vec};
use crate::stats::{unit_rng, validate_labels};

/// Hyper-parameters of a forest.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ForestParams {
    pub num_trees: usize,
    pub max_depth: u32,
    pub min_leaf_size: usize,
    pub feature_fraction: f64,
    pub sample_fraction: f64,
}

impl Default for ForestParams {
    fn default() -> Self {
        ForestParams {
            num_trees: 100,
            max_depth: 8,
            min_leaf_size: 5,
            feature_fraction: 0.6,
            sample_fraction: 1.0,
        }
    }
}

struct ForestTree {
    tree: DecisionTree,
    /// Design-matrix columns this tree was fitted on.
    columns: Vec<usize>,
}

pub struct ForestClassifier {
    trees: Vec<ForestTree>,
    features: Vec<String>,
    params: ForestParams,
    seed: u64,
}

impl ForestClassifier {
    pub fn fit<S: AsRef<str>>(
        table: &Table,
        labels: &[i32],
        features: &[S],
        params: ForestParams,
        seed: u64,
    ) -> Result<Self> {
        validate_labels(labels, table.nrows())?;
        if params.num_trees == 0 {
            return Err(XriskError::InvalidInput("a forest needs at least one tree".to_string()));
        }
        if !(params.feature_fraction > 0.0 && params.feature_fraction <= 1.0)
            || params.sample_fraction <= 0.0
        {
            return Err(XriskError::InvalidInput(format!(
                "invalid sampling fractions: features {}, rows {}",
                params.feature_fraction, params.sample_fraction
            )));
        }

        let x = finite_design_matrix(table, features)?;
        let (n_rows, n_features) = (x.nrows(), x.ncols());
        if n_rows == 0 || n_features == 0 {
            return Err(XriskError::InvalidInput(format!(
                "cannot fit a forest on a {}x{} table",
                n_rows, n_features
            )));
        }
        let n_tree_features = ((n_features as f64 * params.feature_fraction).round() as usize).clamp(1, n_features);
        let n_tree_rows = ((n_rows as f64 * params.sample_fraction).round() as usize).max(1);

        let trees = (0..params.num_trees)
            .into_par_iter()
            .map(|t| -> Result<ForestTree> {
                let mut rng = unit_rng(seed, t as u64);
                let mut columns = sample(&mut rng, n_features, n_tree_features).into_vec();
                columns.sort_unstable();
                let rows: Vec<usize> = (0..n_tree_rows).map(|_| rng.gen_range(0..n_rows)).collect();

                let data = to_data_vec(&x, &rows, &columns, Some(labels));
                let tree = fit_tree(&data, columns.len(), params.max_depth, params.min_leaf_size)?;
                Ok(ForestTree { tree, columns })
            })
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "Fitted random forest: {} trees, {} of {} features per tree, {} rows per tree, max_depth={}",
            trees.len(),
            n_tree_features,
            n_features,
            n_tree_rows,
            params.max_depth
        );

        Ok(ForestClassifier {
            trees,
            features: features.iter().map(|f| f.as_ref().to_string()).collect(),
            params,
            seed,
        })
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

impl ClassifierModel for ForestClassifier {
    fn predict_proba(&self, table: &Table) -> Result<Vec<f64>> {
        let x = finite_design_matrix(table, &self.features)?;
        let rows = all_indices(x.nrows());

        // Collected in tree order and summed sequentially so the result does
        // not depend on thread scheduling.
        let per_tree: Vec<Vec<f32>> = self
            .trees
            .par_iter()
            .map(|t| t.tree.predict(&to_data_vec(&x, &rows, &t.columns, None)))
            .collect();

        let mut sums = vec![0.0f64; x.nrows()];
        for predictions in &per_tree {
            for (sum, &p) in sums.iter_mut().zip(predictions.iter()) {
                *sum += p as f64;
            }
        }
        let n_trees = self.trees.len() as f64;
        Ok(sums.into_iter().map(|s| (s / n_trees).clamp(0.0, 1.0)).collect())
    }

    fn features(&self) -> &[String] {
        &self.features
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}
