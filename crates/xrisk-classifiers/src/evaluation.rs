//! Model performance: AUC, cutoff metrics, ROC and lift curves.
//!
//! All functions are read-only over their inputs. Degenerate outcomes (one
//! class missing, no predicted positives) show up as NaN fields, not errors.
use serde::{Deserialize, Serialize};

use crate::data_handling::Table;
use crate::error::{Result, XriskError};
use crate::models::{ClassifierModel, WrappedModel};
use crate::stats::{auc, validate_labels, ConfusionMatrix};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    pub fpr: f64,
    pub tpr: f64,
    /// Scores at or above this value are called positive at this point.
    pub threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiftPoint {
    /// Share of the population with the highest scores.
    pub fraction: f64,
    /// Positive rate in that share over the overall positive rate.
    pub lift: f64,
}

/// Performance of one model on one labelled table at one cutoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub label: String,
    pub cutoff: f64,
    pub n_rows: usize,
    pub auc: f64,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub confusion: ConfusionMatrix,
    pub roc: Vec<RocPoint>,
    pub lift: Vec<LiftPoint>,
}

fn scores_for<M: ClassifierModel>(model: &WrappedModel<M>, table: &Table, labels: &[i32]) -> Result<Vec<f64>> {
    validate_labels(labels, table.nrows())?;
    model.predict(table)
}

/// Evaluate `model` on `table` against `labels` at `cutoff`.
pub fn evaluate<M: ClassifierModel>(
    model: &WrappedModel<M>,
    table: &Table,
    labels: &[i32],
    cutoff: f64,
) -> Result<PerformanceReport> {
    if !cutoff.is_finite() {
        return Err(XriskError::InvalidInput(format!("cutoff must be finite, got {}", cutoff)));
    }
    let scores = scores_for(model, table, labels)?;
    let report = performance_from_scores(model.label(), &scores, labels, cutoff);
    log::info!(
        "[{}] AUC={:.4} precision={:.4} recall={:.4} F1={:.4} at cutoff {}",
        report.label,
        report.auc,
        report.precision,
        report.recall,
        report.f1,
        cutoff
    );
    Ok(report)
}

/// Evaluate several models on the same table; reports keep input order.
pub fn compare<M: ClassifierModel>(
    models: &[&WrappedModel<M>],
    table: &Table,
    labels: &[i32],
    cutoff: f64,
) -> Result<Vec<PerformanceReport>> {
    models.iter().map(|m| evaluate(m, table, labels, cutoff)).collect()
}

/// Build a report from already computed scores. `labels` must be 0/1 and
/// as long as `scores`.
pub fn performance_from_scores(label: &str, scores: &[f64], labels: &[i32], cutoff: f64) -> PerformanceReport {
    let confusion = ConfusionMatrix::from_scores(scores, labels, cutoff);
    PerformanceReport {
        label: label.to_string(),
        cutoff,
        n_rows: scores.len(),
        auc: auc(scores, labels),
        accuracy: confusion.accuracy(),
        precision: confusion.precision(),
        recall: confusion.recall(),
        f1: confusion.f1(),
        confusion,
        roc: roc_from_scores(scores, labels),
        lift: lift_from_scores(scores, labels),
    }
}

/// ROC curve of `model` on `table`.
pub fn roc_curve<M: ClassifierModel>(model: &WrappedModel<M>, table: &Table, labels: &[i32]) -> Result<Vec<RocPoint>> {
    let scores = scores_for(model, table, labels)?;
    Ok(roc_from_scores(&scores, labels))
}

/// Lift curve of `model` on `table`.
pub fn lift_curve<M: ClassifierModel>(model: &WrappedModel<M>, table: &Table, labels: &[i32]) -> Result<Vec<LiftPoint>> {
    let scores = scores_for(model, table, labels)?;
    Ok(lift_from_scores(&scores, labels))
}

/// Row indices by descending score, with the boundaries (exclusive ends) of
/// groups of tied scores.
fn descending_groups(scores: &[f64]) -> (Vec<usize>, Vec<usize>) {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    let mut ends = Vec::new();
    for i in 0..order.len() {
        if i + 1 == order.len() || scores[order[i + 1]] != scores[order[i]] {
            ends.push(i + 1);
        }
    }
    (order, ends)
}

/// ROC points from (0, 0) to (1, 1), one per distinct score threshold.
///
/// With one class absent only the two end points are returned.
pub fn roc_from_scores(scores: &[f64], labels: &[i32]) -> Vec<RocPoint> {
    let n_pos = labels.iter().filter(|&&l| l == 1).count();
    let n_neg = labels.len() - n_pos;
    let start = RocPoint {
        fpr: 0.0,
        tpr: 0.0,
        threshold: f64::INFINITY,
    };
    let end = RocPoint {
        fpr: 1.0,
        tpr: 1.0,
        threshold: f64::NEG_INFINITY,
    };
    if n_pos == 0 || n_neg == 0 {
        log::warn!("ROC curve requested with {} positives and {} negatives", n_pos, n_neg);
        return vec![start, end];
    }

    let (order, ends) = descending_groups(scores);
    let mut points = vec![start];
    let (mut tp, mut fp) = (0usize, 0usize);
    let mut from = 0;
    for &to in &ends {
        for &idx in &order[from..to] {
            if labels[idx] == 1 {
                tp += 1;
            } else {
                fp += 1;
            }
        }
        points.push(RocPoint {
            fpr: fp as f64 / n_neg as f64,
            tpr: tp as f64 / n_pos as f64,
            threshold: scores[order[to - 1]],
        });
        from = to;
    }
    points
}

/// Cumulative lift by descending score, one point per distinct score.
pub fn lift_from_scores(scores: &[f64], labels: &[i32]) -> Vec<LiftPoint> {
    let n = labels.len();
    let n_pos = labels.iter().filter(|&&l| l == 1).count();
    if n == 0 {
        return Vec::new();
    }
    let base_rate = n_pos as f64 / n as f64;

    let (order, ends) = descending_groups(scores);
    let mut points = Vec::with_capacity(ends.len());
    let mut positives = 0usize;
    let mut from = 0;
    for &to in &ends {
        positives += order[from..to].iter().filter(|&&idx| labels[idx] == 1).count();
        let rate = positives as f64 / to as f64;
        points.push(LiftPoint {
            fraction: to as f64 / n as f64,
            lift: if base_rate > 0.0 { rate / base_rate } else { f64::NAN },
        });
        from = to;
    }
    points
}
