//! Monte Carlo Shapley attribution of a single prediction.
//!
//! Each sampled ordering starts from the whole background table and switches
//! features to the instance's values one at a time, in ordering sequence.
//! The change of the mean background prediction at each step is credited to
//! the feature just switched. Per ordering these changes telescope from the
//! background mean to the instance prediction, so the contributions always
//! sum to `prediction - baseline`; sampling error only affects how the gap is
//! split between features.
use rand::seq::SliceRandom;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data_handling::{Table, Value};
use crate::error::{Result, XriskError};
use crate::models::{ClassifierModel, WrappedModel};
use crate::stats::unit_rng;

/// Orderings handled by one parallel work unit.
const ORDERINGS_PER_CHUNK: usize = 16;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapleyOptions {
    pub n_samples: usize,
    pub seed: u64,
}

impl Default for ShapleyOptions {
    fn default() -> Self {
        ShapleyOptions {
            n_samples: 25,
            seed: 1313,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureAttribution {
    pub variable: String,
    /// The instance's value of the feature.
    pub value: Value,
    pub contribution: f64,
    /// Spread of the contribution across sampled orderings.
    pub std_dev: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionReport {
    pub label: String,
    /// Mean prediction over the background table.
    pub baseline: f64,
    pub prediction: f64,
    pub n_samples: usize,
    /// In model feature order.
    pub contributions: Vec<FeatureAttribution>,
}

impl AttributionReport {
    pub fn total_contribution(&self) -> f64 {
        self.contributions.iter().map(|c| c.contribution).sum()
    }

    pub fn sorted_by_magnitude(&self) -> Vec<&FeatureAttribution> {
        let mut sorted: Vec<&FeatureAttribution> = self.contributions.iter().collect();
        sorted.sort_by(|a, b| b.contribution.abs().total_cmp(&a.contribution.abs()));
        sorted
    }
}

pub fn shapley_attribution<M: ClassifierModel>(
    model: &WrappedModel<M>,
    instance_row: &Table,
    background: &Table,
    n_samples: usize,
) -> Result<AttributionReport> {
    let options = ShapleyOptions {
        n_samples,
        ..ShapleyOptions::default()
    };
    shapley_attribution_with(model, instance_row, background, &options)
}

pub fn shapley_attribution_with<M: ClassifierModel>(
    model: &WrappedModel<M>,
    instance_row: &Table,
    background: &Table,
    options: &ShapleyOptions,
) -> Result<AttributionReport> {
    if instance_row.nrows() != 1 {
        return Err(XriskError::InvalidInput(format!(
            "expected a single instance row, got {} rows",
            instance_row.nrows()
        )));
    }
    if options.n_samples == 0 {
        return Err(XriskError::InvalidInput("n_samples must be at least 1".to_string()));
    }
    model.ensure_schema(instance_row)?;
    model.ensure_schema(background)?;

    let features = model.features().to_vec();
    let instance = instance_row.select_columns(&features)?;
    let data = background.select_columns(&features)?;
    if data.is_empty() {
        return Err(XriskError::InvalidInput("empty background table".to_string()));
    }
    let values: Vec<Value> = features
        .iter()
        .map(|f| instance.value(0, f))
        .collect::<Result<Vec<_>>>()?;

    let baseline = mean(&model.predict(&data)?);
    let prediction = model.predict(&instance)?[0];
    log::info!(
        "[{}] Shapley attribution over {} orderings, {} background rows: prediction {:.4}, baseline {:.4}",
        model.label(),
        options.n_samples,
        data.nrows(),
        prediction,
        baseline
    );

    let n_chunks = (options.n_samples + ORDERINGS_PER_CHUNK - 1) / ORDERINGS_PER_CHUNK;
    let partials: Vec<(Vec<f64>, Vec<f64>)> = (0..n_chunks)
        .into_par_iter()
        .map(|chunk| -> Result<(Vec<f64>, Vec<f64>)> {
            let mut rng = unit_rng(options.seed, chunk as u64);
            let mut sums = vec![0.0; features.len()];
            let mut squares = vec![0.0; features.len()];
            let first = chunk * ORDERINGS_PER_CHUNK;
            let last = (first + ORDERINGS_PER_CHUNK).min(options.n_samples);

            let mut ordering: Vec<usize> = (0..features.len()).collect();
            for _ in first..last {
                ordering.shuffle(&mut rng);
                let mut current = data.clone();
                let mut previous = baseline;
                for &f in &ordering {
                    current.set_value(&features[f], &values[f])?;
                    let now = mean(&model.predict(&current)?);
                    let delta = now - previous;
                    sums[f] += delta;
                    squares[f] += delta * delta;
                    previous = now;
                }
            }
            Ok((sums, squares))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut sums = vec![0.0; features.len()];
    let mut squares = vec![0.0; features.len()];
    for (chunk_sums, chunk_squares) in &partials {
        for f in 0..features.len() {
            sums[f] += chunk_sums[f];
            squares[f] += chunk_squares[f];
        }
    }

    let n = options.n_samples as f64;
    let contributions = features
        .iter()
        .enumerate()
        .map(|(f, name)| {
            let contribution = sums[f] / n;
            FeatureAttribution {
                variable: name.clone(),
                value: values[f].clone(),
                contribution,
                std_dev: (squares[f] / n - contribution * contribution).max(0.0).sqrt(),
            }
        })
        .collect();

    Ok(AttributionReport {
        label: model.label().to_string(),
        baseline,
        prediction,
        n_samples: options.n_samples,
        contributions,
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
