//! Random search over forest hyper-parameters, scored by stratified k-fold
//! cross-validated AUC.
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data_handling::Table;
use crate::error::{Result, XriskError};
use crate::models::{ClassifierModel, ForestClassifier, ForestParams};
use crate::stats::{auc, unit_rng, validate_labels};

/// Inclusive bounds for each searched forest parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    pub num_trees: (usize, usize),
    pub max_depth: (u32, u32),
    pub min_leaf_size: (usize, usize),
    pub feature_fraction: (f64, f64),
}

impl Default for SearchSpace {
    fn default() -> Self {
        SearchSpace {
            num_trees: (50, 300),
            max_depth: (2, 10),
            min_leaf_size: (1, 50),
            feature_fraction: (0.2, 1.0),
        }
    }
}

impl SearchSpace {
    fn validate(&self) -> Result<()> {
        let (lo, hi) = self.feature_fraction;
        let ok = self.num_trees.0 >= 1
            && self.num_trees.0 <= self.num_trees.1
            && self.max_depth.0 <= self.max_depth.1
            && self.min_leaf_size.0 <= self.min_leaf_size.1
            && lo > 0.0
            && lo <= hi
            && hi <= 1.0;
        if ok {
            Ok(())
        } else {
            Err(XriskError::InvalidInput(format!("invalid search space {:?}", self)))
        }
    }

    /// Draw one forest configuration; rows are always bootstrapped at full size.
    pub fn sample(&self, rng: &mut impl Rng) -> ForestParams {
        ForestParams {
            num_trees: rng.gen_range(self.num_trees.0..=self.num_trees.1),
            max_depth: rng.gen_range(self.max_depth.0..=self.max_depth.1),
            min_leaf_size: rng.gen_range(self.min_leaf_size.0..=self.min_leaf_size.1),
            feature_fraction: rng.gen_range(self.feature_fraction.0..=self.feature_fraction.1),
            sample_fraction: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    /// Number of sampled configurations.
    pub n_evals: usize,
    pub n_folds: usize,
    pub seed: u64,
    pub search_space: SearchSpace,
}

impl Default for TuningConfig {
    fn default() -> Self {
        TuningConfig {
            n_evals: 10,
            n_folds: 5,
            seed: 1313,
            search_space: SearchSpace::default(),
        }
    }
}

/// One evaluated configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialRecord {
    pub index: usize,
    pub params: ForestParams,
    /// Mean AUC over the folds where it is defined.
    pub cv_auc: f64,
    pub fold_aucs: Vec<f64>,
}

pub struct TunedModel {
    /// Best configuration refitted on the whole table.
    pub model: ForestClassifier,
    pub best: TrialRecord,
    pub trials: Vec<TrialRecord>,
}

/// Test-row indices of `n_folds` folds with (as far as possible) the same
/// share of positives in each.
pub fn stratified_folds(labels: &[i32], n_folds: usize, seed: u64) -> Result<Vec<Vec<usize>>> {
    if n_folds < 2 || n_folds > labels.len() {
        return Err(XriskError::InvalidInput(format!(
            "cannot split {} rows into {} folds",
            labels.len(),
            n_folds
        )));
    }
    let mut rng = unit_rng(seed, 0);
    let mut folds = vec![Vec::new(); n_folds];
    let mut next = 0;
    for class in [0, 1] {
        let mut rows: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == class).collect();
        rows.shuffle(&mut rng);
        for row in rows {
            folds[next % n_folds].push(row);
            next += 1;
        }
    }
    folds.iter_mut().for_each(|f| f.sort_unstable());
    Ok(folds)
}

/// Mean and per-fold AUC of a forest with `params`. Folds whose test rows
/// hold a single class give NaN and are left out of the mean.
pub fn cross_validated_auc<S: AsRef<str>>(
    table: &Table,
    labels: &[i32],
    features: &[S],
    params: ForestParams,
    n_folds: usize,
    seed: u64,
) -> Result<(f64, Vec<f64>)> {
    validate_labels(labels, table.nrows())?;
    let folds = stratified_folds(labels, n_folds, seed)?;

    let mut fold_aucs = Vec::with_capacity(n_folds);
    for test in &folds {
        let train: Vec<usize> = (0..table.nrows()).filter(|i| test.binary_search(i).is_err()).collect();
        let train_labels: Vec<i32> = train.iter().map(|&i| labels[i]).collect();
        let test_labels: Vec<i32> = test.iter().map(|&i| labels[i]).collect();

        let forest = ForestClassifier::fit(&table.select_rows(&train), &train_labels, features, params, seed)?;
        let scores = forest.predict_proba(&table.select_rows(test))?;
        fold_aucs.push(auc(&scores, &test_labels));
    }

    let defined: Vec<f64> = fold_aucs.iter().copied().filter(|a| !a.is_nan()).collect();
    let mean = if defined.is_empty() {
        f64::NAN
    } else {
        defined.iter().sum::<f64>() / defined.len() as f64
    };
    Ok((mean, fold_aucs))
}

/// Sample `config.n_evals` forest configurations, keep the one with the best
/// cross-validated AUC and refit it on the whole table.
pub fn random_search<S: AsRef<str>>(
    config: &TuningConfig,
    table: &Table,
    labels: &[i32],
    features: &[S],
) -> Result<TunedModel> {
    config.search_space.validate()?;
    if config.n_evals == 0 {
        return Err(XriskError::InvalidInput("n_evals must be at least 1".to_string()));
    }
    log::info!(
        "Random search: {} evaluations, {}-fold CV on {} rows",
        config.n_evals,
        config.n_folds,
        table.nrows()
    );

    let mut trials = Vec::with_capacity(config.n_evals);
    for index in 0..config.n_evals {
        let mut rng = unit_rng(config.seed, index as u64);
        let params = config.search_space.sample(&mut rng);
        let (cv_auc, fold_aucs) =
            cross_validated_auc(table, labels, features, params, config.n_folds, config.seed)?;
        log::info!(
            "Trial {}: trees={} depth={} leaf={} features={:.2} -> CV AUC {:.4}",
            index,
            params.num_trees,
            params.max_depth,
            params.min_leaf_size,
            params.feature_fraction,
            cv_auc
        );
        trials.push(TrialRecord {
            index,
            params,
            cv_auc,
            fold_aucs,
        });
    }

    let best = trials
        .iter()
        .filter(|t| !t.cv_auc.is_nan())
        .max_by(|a, b| a.cv_auc.total_cmp(&b.cv_auc))
        .cloned()
        .ok_or_else(|| XriskError::InvalidInput("no trial produced a defined cross-validated AUC".to_string()))?;
    log::info!("Best trial {} with CV AUC {:.4}; refitting on all rows", best.index, best.cv_auc);

    let model = ForestClassifier::fit(table, labels, features, best.params, config.seed)?;
    Ok(TunedModel { model, best, trials })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_handling::Column;

    #[test]
    fn folds_partition_rows_and_keep_both_classes() {
        let labels: Vec<i32> = (0..20).map(|i| i32::from(i % 4 == 0)).collect();
        let folds = stratified_folds(&labels, 5, 3).unwrap();
        let mut all: Vec<usize> = folds.iter().flatten().copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..20).collect::<Vec<_>>());
        for fold in &folds {
            assert_eq!(fold.len(), 4);
            assert_eq!(fold.iter().filter(|&&i| labels[i] == 1).count(), 1);
        }
    }

    #[test]
    fn one_fold_is_invalid() {
        assert!(stratified_folds(&[0, 1, 0], 1, 0).is_err());
    }

    #[test]
    fn search_samples_inside_bounds() {
        let space = SearchSpace {
            num_trees: (3, 5),
            max_depth: (2, 2),
            min_leaf_size: (1, 4),
            feature_fraction: (0.5, 1.0),
        };
        let mut rng = unit_rng(9, 0);
        for _ in 0..50 {
            let p = space.sample(&mut rng);
            assert!((3..=5).contains(&p.num_trees));
            assert_eq!(p.max_depth, 2);
            assert!((0.5..=1.0).contains(&p.feature_fraction));
        }
    }

    #[test]
    fn random_search_refits_the_best_trial() {
        let ages: Vec<f64> = (0..40).map(|i| 20.0 + 2.0 * i as f64).collect();
        let labels: Vec<i32> = ages.iter().map(|&a| i32::from(a >= 60.0)).collect();
        let table = Table::new(vec![Column::numeric("Age", ages)]).unwrap();
        let config = TuningConfig {
            n_evals: 3,
            n_folds: 4,
            seed: 5,
            search_space: SearchSpace {
                num_trees: (3, 6),
                max_depth: (1, 3),
                min_leaf_size: (1, 3),
                feature_fraction: (1.0, 1.0),
            },
        };
        let tuned = random_search(&config, &table, &labels, &["Age"]).unwrap();
        assert_eq!(tuned.trials.len(), 3);
        assert!(tuned.trials.iter().all(|t| t.cv_auc <= tuned.best.cv_auc));
        assert_eq!(tuned.model.params(), &tuned.best.params);
    }
}
