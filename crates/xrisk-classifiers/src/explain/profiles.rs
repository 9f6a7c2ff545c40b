//! Response profiles: partial dependence (global) and ceteris paribus
//! (local), both built from individual conditional expectation curves.
use std::collections::BTreeMap;

use itertools_num::linspace;
use ndarray::{Array2, ArrayView1, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data_handling::{ColumnData, Table, Value};
use crate::error::{Result, XriskError};
use crate::models::{ClassifierModel, WrappedModel};

const KMEANS_MAX_ITER: usize = 100;

/// One response curve over a value grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub label: String,
    pub variable: String,
    /// Group level or cluster name, `None` for a plain average.
    pub group: Option<String>,
    pub grid: Vec<Value>,
    pub predictions: Vec<f64>,
    /// Number of rows averaged into the curve.
    pub n_members: usize,
    /// For a clustered profile, the cluster's representative centered curve
    /// (mean of its members' curves, each shifted to zero mean).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centered: Option<Vec<f64>>,
}

impl Profile {
    pub fn points(&self) -> impl Iterator<Item = (&Value, f64)> + '_ {
        self.grid.iter().zip(self.predictions.iter().copied())
    }
}

/// Per-row prediction curves: `curves[row][grid_index]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceCurves {
    pub label: String,
    pub variable: String,
    pub grid: Vec<Value>,
    pub curves: Vec<Vec<f64>>,
}

impl IceCurves {
    fn mean_of(&self, rows: &[usize]) -> Vec<f64> {
        let mut mean = vec![0.0; self.grid.len()];
        for &r in rows {
            for (m, v) in mean.iter_mut().zip(self.curves[r].iter()) {
                *m += v;
            }
        }
        let n = rows.len().max(1) as f64;
        mean.iter_mut().for_each(|m| *m /= n);
        mean
    }

    fn profile(&self, group: Option<String>, rows: &[usize]) -> Profile {
        Profile {
            label: self.label.clone(),
            variable: self.variable.clone(),
            group,
            grid: self.grid.clone(),
            predictions: self.mean_of(rows),
            n_members: rows.len(),
            centered: None,
        }
    }
}

/// How per-row curves are aggregated by `model_profile`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileOptions {
    /// One curve per level of this column.
    pub group_by: Option<String>,
    /// Cluster the centered per-row curves into `k` representatives.
    pub k: Option<usize>,
}

fn check_profile_inputs<M: ClassifierModel>(model: &WrappedModel<M>, variable: &str, grid: &[Value]) -> Result<()> {
    if grid.is_empty() {
        return Err(XriskError::InvalidInput(format!("empty grid for '{}'", variable)));
    }
    if !model.features().iter().any(|f| f == variable) {
        return Err(XriskError::MissingColumn(format!(
            "'{}' is not an input of model '{}'",
            variable,
            model.label()
        )));
    }
    Ok(())
}

/// Predictions for every background row with `variable` swept over `grid`.
pub fn individual_profiles<M: ClassifierModel>(
    model: &WrappedModel<M>,
    variable: &str,
    grid: &[Value],
    background: &Table,
) -> Result<IceCurves> {
    check_profile_inputs(model, variable, grid)?;
    let data = background.select_columns(model.features())?;
    if data.is_empty() {
        return Err(XriskError::InvalidInput("empty background table".to_string()));
    }

    let per_value: Vec<Vec<f64>> = grid
        .par_iter()
        .map(|value| model.predict(&data.with_value(variable, value)?))
        .collect::<Result<Vec<_>>>()?;

    let curves = (0..data.nrows())
        .map(|row| per_value.iter().map(|preds| preds[row]).collect())
        .collect();
    Ok(IceCurves {
        label: model.label().to_string(),
        variable: variable.to_string(),
        grid: grid.to_vec(),
        curves,
    })
}

/// Average prediction over `background` at each grid value, in grid order.
pub fn partial_dependence<M: ClassifierModel>(
    model: &WrappedModel<M>,
    variable: &str,
    grid: &[Value],
    background: &Table,
) -> Result<Profile> {
    let ice = individual_profiles(model, variable, grid, background)?;
    log::info!(
        "[{}] partial dependence of '{}' over {} grid values",
        model.label(),
        variable,
        grid.len()
    );
    let rows: Vec<usize> = (0..ice.curves.len()).collect();
    Ok(ice.profile(None, &rows))
}

/// One partial dependence curve per distinct value of `group_by`, ordered by
/// the value's text. Rows with a missing group value form an "NA" group.
pub fn partial_dependence_grouped<M: ClassifierModel>(
    model: &WrappedModel<M>,
    variable: &str,
    grid: &[Value],
    background: &Table,
    group_by: &str,
) -> Result<Vec<Profile>> {
    let groups = background.column(group_by)?;
    let ice = individual_profiles(model, variable, grid, background)?;

    let mut members: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for row in 0..background.nrows() {
        members.entry(groups.data.value(row).to_string()).or_default().push(row);
    }
    log::info!(
        "[{}] partial dependence of '{}' grouped by '{}' ({} groups)",
        model.label(),
        variable,
        group_by,
        members.len()
    );
    Ok(members
        .into_iter()
        .map(|(level, rows)| ice.profile(Some(level), &rows))
        .collect())
}

/// Partial dependence split into `k` clusters of similarly shaped per-row
/// curves. Curves are centered on their own mean before k-means, so rows
/// cluster by shape and not by level. Each profile carries both the mean of
/// its members' raw curves (`predictions`, on the probability scale) and the
/// representative centered curve (`centered`). Empty clusters are dropped.
pub fn partial_dependence_clustered<M: ClassifierModel>(
    model: &WrappedModel<M>,
    variable: &str,
    grid: &[Value],
    background: &Table,
    k: usize,
) -> Result<Vec<Profile>> {
    if k == 0 || k > background.nrows() {
        return Err(XriskError::InvalidInput(format!(
            "cannot form {} clusters from {} rows",
            k,
            background.nrows()
        )));
    }
    let ice = individual_profiles(model, variable, grid, background)?;

    let n_grid = ice.grid.len();
    let mut centered = Array2::<f64>::zeros((ice.curves.len(), n_grid));
    for (r, curve) in ice.curves.iter().enumerate() {
        let mean = curve.iter().sum::<f64>() / n_grid as f64;
        for (g, v) in curve.iter().enumerate() {
            centered[[r, g]] = v - mean;
        }
    }
    let assignment = kmeans(&centered, k);

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); k];
    for (row, &c) in assignment.iter().enumerate() {
        members[c].push(row);
    }
    log::info!(
        "[{}] clustered partial dependence of '{}' into {} groups, sizes {:?}",
        model.label(),
        variable,
        k,
        members.iter().map(|m| m.len()).collect::<Vec<_>>()
    );
    Ok(members
        .iter()
        .enumerate()
        .filter(|(_, rows)| !rows.is_empty())
        .map(|(c, rows)| {
            let mut profile = ice.profile(Some(format!("cluster {}", c + 1)), rows);
            let mut representative = vec![0.0; n_grid];
            for &r in rows {
                for (m, v) in representative.iter_mut().zip(centered.row(r).iter()) {
                    *m += v;
                }
            }
            representative.iter_mut().for_each(|m| *m /= rows.len() as f64);
            profile.centered = Some(representative);
            profile
        })
        .collect())
}

/// Dispatch to the plain, grouped or clustered partial dependence.
/// `group_by` wins when both options are set.
pub fn model_profile<M: ClassifierModel>(
    model: &WrappedModel<M>,
    variable: &str,
    grid: &[Value],
    background: &Table,
    options: &ProfileOptions,
) -> Result<Vec<Profile>> {
    match (&options.group_by, options.k) {
        (Some(group_by), _) => partial_dependence_grouped(model, variable, grid, background, group_by),
        (None, Some(k)) => partial_dependence_clustered(model, variable, grid, background, k),
        (None, None) => Ok(vec![partial_dependence(model, variable, grid, background)?]),
    }
}

/// Predictions for one instance with `variable` swept over `grid` and every
/// other feature held at the instance's values.
pub fn ceteris_paribus_profile<M: ClassifierModel>(
    model: &WrappedModel<M>,
    instance_row: &Table,
    variable: &str,
    grid: &[Value],
) -> Result<Profile> {
    if instance_row.nrows() != 1 {
        return Err(XriskError::InvalidInput(format!(
            "expected a single instance row, got {} rows",
            instance_row.nrows()
        )));
    }
    model.ensure_schema(instance_row)?;
    let ice = individual_profiles(model, variable, grid, instance_row)?;
    log::debug!("[{}] ceteris paribus profile of '{}'", model.label(), variable);
    Ok(ice.profile(None, &[0]))
}

/// Grid for `variable`: `n_points` evenly spaced values between its min and
/// max, or its sorted distinct values when there are fewer of them. Factors
/// use every level in level order.
pub fn default_grid(table: &Table, variable: &str, n_points: usize) -> Result<Vec<Value>> {
    match &table.column(variable)?.data {
        ColumnData::Numeric(values) => {
            let mut distinct: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
            if distinct.is_empty() {
                return Err(XriskError::InvalidInput(format!("'{}' has no observed values", variable)));
            }
            distinct.sort_by(f64::total_cmp);
            distinct.dedup();
            if distinct.len() <= n_points {
                return Ok(distinct.into_iter().map(Value::Number).collect());
            }
            let (min, max) = (distinct[0], distinct[distinct.len() - 1]);
            Ok(linspace(min, max, n_points).map(Value::Number).collect())
        }
        ColumnData::Factor { levels, .. } => Ok(levels.iter().map(|l| Value::Level(l.clone())).collect()),
        ColumnData::Text(_) => Err(XriskError::schema(variable, "cannot build a grid for a text column")),
    }
}

fn euclidean_sq(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Deterministic Lloyd k-means. Initial centroids are the rows at evenly
/// spaced ranks when rows are ordered by their overall change (last minus
/// first value); a cluster that loses all rows keeps its old centroid.
fn kmeans(x: &Array2<f64>, k: usize) -> Vec<usize> {
    let n = x.nrows();
    let last = x.ncols() - 1;
    let mut by_trend: Vec<usize> = (0..n).collect();
    by_trend.sort_by(|&a, &b| (x[[a, last]] - x[[a, 0]]).total_cmp(&(x[[b, last]] - x[[b, 0]])));

    let mut centroids = Array2::<f64>::zeros((k, x.ncols()));
    for c in 0..k {
        let pick = if k == 1 { n / 2 } else { c * (n - 1) / (k - 1) };
        centroids.row_mut(c).assign(&x.row(by_trend[pick]));
    }

    let mut assignment = vec![usize::MAX; n];
    for _iter in 0..KMEANS_MAX_ITER {
        let mut changed = 0;
        for (i, row) in x.axis_iter(Axis(0)).enumerate() {
            let nearest = (0..k)
                .min_by(|&a, &b| {
                    euclidean_sq(&row, &centroids.row(a)).total_cmp(&euclidean_sq(&row, &centroids.row(b)))
                })
                .unwrap_or(0);
            if assignment[i] != nearest {
                assignment[i] = nearest;
                changed += 1;
            }
        }
        if changed == 0 {
            break;
        }
        for c in 0..k {
            let rows: Vec<usize> = (0..n).filter(|&i| assignment[i] == c).collect();
            if rows.is_empty() {
                continue;
            }
            let mean = x.select(Axis(0), &rows).mean_axis(Axis(0));
            if let Some(mean) = mean {
                centroids.row_mut(c).assign(&mean);
            }
        }
    }
    assignment
}
