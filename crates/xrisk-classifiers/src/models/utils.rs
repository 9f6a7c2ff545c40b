//! Conversions between table design matrices and gbdt training data.
use gbdt::config::Loss;
use gbdt::decision_tree::{Data, DataVec, DecisionTree, TrainingCache};
use ndarray::Array2;

use crate::data_handling::Table;
use crate::error::{Result, XriskError};

/// Design matrix of `features` for the tree learners. Missing values are
/// rejected: gbdt cannot order NaN when it sorts feature values.
pub(crate) fn finite_design_matrix<S: AsRef<str>>(table: &Table, features: &[S]) -> Result<Array2<f32>> {
    let x = table.design_matrix(features)?;
    if let Some(((row, col), _)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(XriskError::InvalidInput(format!(
            "missing value in column '{}' at row {}",
            features[col].as_ref(),
            row
        )));
    }
    Ok(x)
}

/// Build gbdt rows from selected rows and columns of `x`. Rows without a
/// label (prediction input) get a zero label, as gbdt expects one.
pub(crate) fn to_data_vec(x: &Array2<f32>, rows: &[usize], columns: &[usize], labels: Option<&[i32]>) -> DataVec {
    let mut data = DataVec::with_capacity(rows.len());
    for &row in rows {
        let feature: Vec<f32> = columns.iter().map(|&c| x[[row, c]]).collect();
        let label = labels.map_or(0.0, |l| l[row] as f32);
        data.push(Data::new_training_data(feature, 1.0, label, None));
    }
    data
}

/// Fit one squared-error regression tree on 0/1 labels: each leaf holds the
/// share of positives among its training rows.
pub(crate) fn fit_tree(data: &DataVec, feature_size: usize, max_depth: u32, min_leaf_size: usize) -> Result<DecisionTree> {
    if data.is_empty() {
        return Err(XriskError::InvalidInput("cannot fit a tree on zero rows".to_string()));
    }
    let mut tree = DecisionTree::new();
    tree.set_feature_size(feature_size);
    tree.set_max_depth(max_depth);
    tree.set_min_leaf_size(min_leaf_size);
    tree.set_loss(Loss::SquaredError);

    let mut cache = TrainingCache::get_cache(feature_size, data, 2);
    tree.fit(data, &mut cache);
    Ok(tree)
}

pub(crate) fn all_indices(n: usize) -> Vec<usize> {
    (0..n).collect()
}
