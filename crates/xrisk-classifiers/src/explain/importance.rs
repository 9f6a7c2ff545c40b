//! Permutation variable importance.
use rand::seq::SliceRandom;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data_handling::Table;
use crate::error::{Result, XriskError};
use crate::models::{ClassifierModel, WrappedModel};
use crate::stats::{auc, cross_entropy, mean_std, unit_rng, validate_labels};

/// Loss whose increase under permutation measures importance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossFunction {
    #[default]
    OneMinusAuc,
    CrossEntropy,
}

impl LossFunction {
    pub fn loss(&self, scores: &[f64], labels: &[i32]) -> f64 {
        match self {
            LossFunction::OneMinusAuc => 1.0 - auc(scores, labels),
            LossFunction::CrossEntropy => cross_entropy(scores, labels),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportanceOptions {
    pub n_repeats: usize,
    pub loss: LossFunction,
    pub seed: u64,
}

impl Default for ImportanceOptions {
    fn default() -> Self {
        ImportanceOptions {
            n_repeats: 10,
            loss: LossFunction::OneMinusAuc,
            seed: 1313,
        }
    }
}

/// Loss increase distribution for one variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableImportance {
    pub variable: String,
    pub mean_increase: f64,
    pub std_increase: f64,
    /// Increase per permutation repeat.
    pub increases: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportanceReport {
    pub label: String,
    pub loss: LossFunction,
    pub baseline_loss: f64,
    pub n_repeats: usize,
    /// Sorted by descending mean increase.
    pub variables: Vec<VariableImportance>,
}

impl ImportanceReport {
    pub fn get(&self, variable: &str) -> Option<&VariableImportance> {
        self.variables.iter().find(|v| v.variable == variable)
    }

    pub fn top_k(&self, k: usize) -> Vec<&VariableImportance> {
        self.variables.iter().take(k).collect()
    }
}

/// Permutation importance with the default loss (1 - AUC) and seed.
pub fn variable_importance<M: ClassifierModel>(
    model: &WrappedModel<M>,
    table: &Table,
    labels: &[i32],
    n_repeats: usize,
) -> Result<ImportanceReport> {
    let options = ImportanceOptions {
        n_repeats,
        ..ImportanceOptions::default()
    };
    variable_importance_with(model, table, labels, &options)
}

/// Permutation importance: for every feature and repeat, shuffle that
/// feature's column (rows stay aligned otherwise) and record how much the
/// loss grows over the unpermuted baseline.
///
/// Rows are first put in a canonical order derived from their content, so
/// the report does not depend on the order of rows in `table`.
pub fn variable_importance_with<M: ClassifierModel>(
    model: &WrappedModel<M>,
    table: &Table,
    labels: &[i32],
    options: &ImportanceOptions,
) -> Result<ImportanceReport> {
    validate_labels(labels, table.nrows())?;
    if options.n_repeats == 0 {
        return Err(XriskError::InvalidInput("n_repeats must be at least 1".to_string()));
    }
    if table.is_empty() {
        return Err(XriskError::InvalidInput("cannot permute an empty table".to_string()));
    }

    let features = model.features().to_vec();
    let data = table.select_columns(&features)?;
    let order = canonical_order(&data, labels, &features)?;
    let data = data.select_rows(&order);
    let labels: Vec<i32> = order.iter().map(|&i| labels[i]).collect();

    let baseline_loss = options.loss.loss(&model.predict(&data)?, &labels);
    log::info!(
        "[{}] permutation importance: {} features x {} repeats, baseline {:?} = {:.4}",
        model.label(),
        features.len(),
        options.n_repeats,
        options.loss,
        baseline_loss
    );

    let n_rows = data.nrows();
    let units: Vec<(usize, usize)> = (0..options.n_repeats)
        .flat_map(|r| (0..features.len()).map(move |f| (r, f)))
        .collect();

    let increases: Vec<f64> = units
        .par_iter()
        .map(|&(repeat, f)| -> Result<f64> {
            let mut rng = unit_rng(options.seed, (repeat * features.len() + f) as u64);
            let mut perm: Vec<usize> = (0..n_rows).collect();
            perm.shuffle(&mut rng);
            let permuted = data.with_column_permuted(&features[f], &perm)?;
            let loss = options.loss.loss(&model.predict(&permuted)?, &labels);
            Ok(loss - baseline_loss)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut variables: Vec<VariableImportance> = features
        .iter()
        .enumerate()
        .map(|(f, name)| {
            let per_repeat: Vec<f64> = units
                .iter()
                .zip(increases.iter())
                .filter(|((_, uf), _)| *uf == f)
                .map(|(_, &inc)| inc)
                .collect();
            let (mean, std) = mean_std(&per_repeat);
            VariableImportance {
                variable: name.clone(),
                mean_increase: mean,
                std_increase: std,
                increases: per_repeat,
            }
        })
        .collect();
    variables.sort_by(|a, b| b.mean_increase.total_cmp(&a.mean_increase));

    Ok(ImportanceReport {
        label: model.label().to_string(),
        loss: options.loss,
        baseline_loss,
        n_repeats: options.n_repeats,
        variables,
    })
}

/// Row indices sorted by (encoded feature values, label). Identical rows are
/// interchangeable, so any tie order gives the same permuted tables.
fn canonical_order(data: &Table, labels: &[i32], features: &[String]) -> Result<Vec<usize>> {
    let x = data.design_matrix(features)?;
    let mut order: Vec<usize> = (0..data.nrows()).collect();
    order.sort_by(|&a, &b| {
        x.row(a)
            .iter()
            .zip(x.row(b).iter())
            .map(|(va, vb)| va.total_cmp(vb))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| labels[a].cmp(&labels[b]))
    });
    Ok(order)
}
