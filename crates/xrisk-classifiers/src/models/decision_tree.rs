use gbdt::decision_tree::DecisionTree;

use crate::data_handling::Table;
use crate::error::Result;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::utils::{all_indices, finite_design_matrix, fit_tree, to_data_vec};
use crate::stats::validate_labels;

/// Single regression tree on 0/1 labels, fitted with gbdt.
pub struct TreeClassifier {
    tree: DecisionTree,
    features: Vec<String>,
    max_depth: u32,
    min_leaf_size: usize,
}

impl TreeClassifier {
    pub fn fit<S: AsRef<str>>(
        table: &Table,
        labels: &[i32],
        features: &[S],
        max_depth: u32,
        min_leaf_size: usize,
    ) -> Result<Self> {
        validate_labels(labels, table.nrows())?;
        let x = finite_design_matrix(table, features)?;
        let columns = all_indices(x.ncols());
        let data = to_data_vec(&x, &all_indices(x.nrows()), &columns, Some(labels));
        let tree = fit_tree(&data, x.ncols(), max_depth, min_leaf_size)?;

        log::debug!(
            "Fitted decision tree on {} rows (max_depth={}, min_leaf_size={})",
            x.nrows(),
            max_depth,
            min_leaf_size
        );

        Ok(TreeClassifier {
            tree,
            features: features.iter().map(|f| f.as_ref().to_string()).collect(),
            max_depth,
            min_leaf_size,
        })
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn min_leaf_size(&self) -> usize {
        self.min_leaf_size
    }
}

impl ClassifierModel for TreeClassifier {
    fn predict_proba(&self, table: &Table) -> Result<Vec<f64>> {
        let x = finite_design_matrix(table, &self.features)?;
        let data = to_data_vec(&x, &all_indices(x.nrows()), &all_indices(x.ncols()), None);
        Ok(self
            .tree
            .predict(&data)
            .into_iter()
            .map(|p| (p as f64).clamp(0.0, 1.0))
            .collect())
    }

    fn features(&self) -> &[String] {
        &self.features
    }

    fn name(&self) -> &str {
        "decision_tree"
    }
}
