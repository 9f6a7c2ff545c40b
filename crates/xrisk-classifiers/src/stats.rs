//! Rank statistics and small numeric helpers shared by evaluation,
//! explanation and tuning.
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::error::{Result, XriskError};

/// Check that `labels` has one entry per score and only holds 0 or 1.
pub fn validate_labels(labels: &[i32], n_rows: usize) -> Result<()> {
    if labels.len() != n_rows {
        return Err(XriskError::InvalidInput(format!(
            "{} labels for {} rows",
            labels.len(),
            n_rows
        )));
    }
    if let Some((row, bad)) = labels.iter().enumerate().find(|(_, &l)| l != 0 && l != 1) {
        return Err(XriskError::InvalidInput(format!(
            "label {} at row {} is neither 0 nor 1",
            bad, row
        )));
    }
    Ok(())
}

/// Average (mid) ranks of `scores`, 1-based; tied scores share the mean of
/// the ranks they span.
pub fn midranks(scores: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0; scores.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // ranks start..end (0-based) share their mean, 1-based
        let shared = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = shared;
        }
        start = end;
    }
    ranks
}

/// Area under the ROC curve via the Mann-Whitney rank sum, ties counted as
/// one half. NaN when either class is absent.
///
/// `labels` must already be validated (0/1, same length as `scores`).
pub fn auc(scores: &[f64], labels: &[i32]) -> f64 {
    let n_pos = labels.iter().filter(|&&l| l == 1).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return f64::NAN;
    }
    let ranks = midranks(scores);
    let rank_sum: f64 = ranks
        .iter()
        .zip(labels.iter())
        .filter(|(_, &l)| l == 1)
        .map(|(r, _)| *r)
        .sum();
    let n_pos_f = n_pos as f64;
    (rank_sum - n_pos_f * (n_pos_f + 1.0) / 2.0) / (n_pos_f * n_neg as f64)
}

/// Binary cross-entropy of probabilities against 0/1 labels.
pub fn cross_entropy(scores: &[f64], labels: &[i32]) -> f64 {
    const EPS: f64 = 1e-15;
    if scores.is_empty() {
        return f64::NAN;
    }
    let total: f64 = scores
        .iter()
        .zip(labels.iter())
        .map(|(&p, &y)| {
            let p = p.clamp(EPS, 1.0 - EPS);
            if y == 1 {
                -p.ln()
            } else {
                -(1.0 - p).ln()
            }
        })
        .sum();
    total / scores.len() as f64
}

/// Counts of a cutoff-based classification. A row is predicted positive when
/// its score is at least the cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_: usize,
}

impl ConfusionMatrix {
    pub fn from_scores(scores: &[f64], labels: &[i32], cutoff: f64) -> Self {
        let mut cm = ConfusionMatrix {
            tp: 0,
            fp: 0,
            tn: 0,
            fn_: 0,
        };
        for (&s, &y) in scores.iter().zip(labels.iter()) {
            match (s >= cutoff, y == 1) {
                (true, true) => cm.tp += 1,
                (true, false) => cm.fp += 1,
                (false, false) => cm.tn += 1,
                (false, true) => cm.fn_ += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_
    }

    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    /// Harmonic mean of precision and recall; NaN when either is undefined
    /// or both are zero.
    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p.is_nan() || r.is_nan() || p + r == 0.0 {
            f64::NAN
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        f64::NAN
    } else {
        num as f64 / den as f64
    }
}

/// Mean and (sample) standard deviation; the spread is 0 for one value.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    let mean = values.iter().mean();
    let std = if values.len() > 1 { values.iter().std_dev() } else { 0.0 };
    (mean, std)
}

/// Independent RNG for unit `unit` of a seeded computation, so that work
/// split across threads draws the same numbers as a sequential run.
pub fn unit_rng(seed: u64, unit: u64) -> StdRng {
    StdRng::seed_from_u64(seed ^ unit.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}
