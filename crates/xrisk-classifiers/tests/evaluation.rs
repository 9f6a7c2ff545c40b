//! Integration tests for the model adapters and the evaluator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use xrisk_classifiers::data_handling::{Column, Table};
use xrisk_classifiers::evaluation::{evaluate, performance_from_scores, roc_from_scores};
use xrisk_classifiers::models::{CdcRisk, ClassifierModel, FnModel, Model, WrappedModel};
use xrisk_classifiers::stats::{auc, ConfusionMatrix};

/// Share of (positive, negative) pairs where the positive scores higher,
/// ties counted as one half.
fn pairwise_auc(scores: &[f64], labels: &[i32]) -> f64 {
    let mut wins = 0.0;
    let mut pairs = 0.0;
    for (i, &yi) in labels.iter().enumerate() {
        for (j, &yj) in labels.iter().enumerate() {
            if yi == 1 && yj == 0 {
                pairs += 1.0;
                if scores[i] > scores[j] {
                    wins += 1.0;
                } else if scores[i] == scores[j] {
                    wins += 0.5;
                }
            }
        }
    }
    wins / pairs
}

// ---------------------------------------------------------------------------
// CDC heuristic
// ---------------------------------------------------------------------------

#[test]
fn cdc_risk_three_ages() {
    let table = Table::new(vec![Column::numeric("Age", vec![25.0, 45.0, 85.0])]).unwrap();
    let risk = CdcRisk::default().predict_proba(&table).unwrap();
    let expected = [0.00045, 0.0039, 0.237];
    for (got, want) in risk.iter().zip(expected.iter()) {
        assert!((got - want).abs() < 1e-12, "got {}, want {}", got, want);
    }
}

#[test]
fn cdc_bins_are_right_closed() {
    assert_eq!(CdcRisk::relative_risk(29.5), 15.0);
    assert_eq!(CdcRisk::relative_risk(29.6), 45.0);
    assert_eq!(CdcRisk::relative_risk(3.0), 2.0);
    assert_eq!(CdcRisk::relative_risk(100.0), 7900.0);
}

#[test]
fn cdc_without_age_is_missing_column() {
    let table = Table::new(vec![Column::numeric("Weight", vec![70.0])]).unwrap();
    let err = CdcRisk::default().predict_proba(&table).unwrap_err();
    assert!(matches!(err, xrisk_classifiers::XriskError::MissingColumn(_)));
}

// ---------------------------------------------------------------------------
// AUC and ROC
// ---------------------------------------------------------------------------

#[test]
fn auc_matches_pairwise_reference() {
    let mut rng = StdRng::seed_from_u64(11);
    for trial in 0..20 {
        let n = 10 + trial * 7;
        // coarse scores so that ties occur
        let scores: Vec<f64> = (0..n).map(|_| (rng.gen_range(0..20) as f64) / 20.0).collect();
        let mut labels: Vec<i32> = (0..n).map(|_| i32::from(rng.gen_bool(0.3))).collect();
        labels[0] = 1;
        labels[1] = 0;
        let fast = auc(&scores, &labels);
        let slow = pairwise_auc(&scores, &labels);
        assert!((fast - slow).abs() < 1e-12, "trial {}: {} vs {}", trial, fast, slow);
    }
}

#[test]
fn roc_is_monotone_with_fixed_end_points() {
    let mut rng = StdRng::seed_from_u64(5);
    let scores: Vec<f64> = (0..200).map(|_| (rng.gen_range(0..50) as f64) / 50.0).collect();
    let labels: Vec<i32> = scores.iter().map(|&s| i32::from(rng.gen_bool(s))).collect();

    let roc = roc_from_scores(&scores, &labels);
    assert_eq!((roc[0].fpr, roc[0].tpr), (0.0, 0.0));
    let last = roc.last().unwrap();
    assert!((last.fpr - 1.0).abs() < 1e-12 && (last.tpr - 1.0).abs() < 1e-12);
    for pair in roc.windows(2) {
        assert!(pair[1].fpr >= pair[0].fpr);
        assert!(pair[1].tpr >= pair[0].tpr);
        assert!(pair[1].threshold <= pair[0].threshold);
    }
}

#[test]
fn single_class_auc_is_nan_not_an_error() {
    let report = performance_from_scores("m", &[0.2, 0.4, 0.9], &[0, 0, 0], 0.5);
    assert!(report.auc.is_nan());
    assert!(report.recall.is_nan());
    assert_eq!(report.confusion.fp, 1);
}

// ---------------------------------------------------------------------------
// Cutoff metrics
// ---------------------------------------------------------------------------

#[test]
fn metrics_at_cutoff_match_manual_confusion_matrix() {
    // at cutoff 0.1: TP = 3, FP = 2, TN = 4, FN = 1
    let scores = [0.5, 0.3, 0.1, 0.05, 0.2, 0.15, 0.09, 0.02, 0.01, 0.0];
    let labels = [1, 1, 1, 1, 0, 0, 0, 0, 0, 0];
    let table = Table::new(vec![Column::numeric("score", scores.to_vec())]).unwrap();
    let model = FnModel::new("identity", &["score"], |t: &Table| Ok(t.numeric("score")?.to_vec()));
    let wrapped = WrappedModel::new(model, &table, labels.to_vec(), "identity").unwrap();

    let report = evaluate(&wrapped, &table, &labels, 0.1).unwrap();
    assert_eq!(
        report.confusion,
        ConfusionMatrix {
            tp: 3,
            fp: 2,
            tn: 4,
            fn_: 1
        }
    );
    let precision = 3.0 / 5.0;
    let recall = 3.0 / 4.0;
    assert!((report.precision - precision).abs() < 1e-12);
    assert!((report.recall - recall).abs() < 1e-12);
    assert!((report.f1 - 2.0 * precision * recall / (precision + recall)).abs() < 1e-12);
    assert!((report.accuracy - 0.7).abs() < 1e-12);
}

#[test]
fn labels_outside_binary_are_invalid_input() {
    let table = Table::new(vec![Column::numeric("Age", vec![30.0, 80.0])]).unwrap();
    let wrapped = WrappedModel::new(Model::from(CdcRisk::default()), &table, vec![0, 1], "CDC").unwrap();
    let err = evaluate(&wrapped, &table, &[0, 2], 0.1).unwrap_err();
    assert!(matches!(err, xrisk_classifiers::XriskError::InvalidInput(_)));
}

#[test]
fn non_finite_cutoff_is_invalid_input() {
    let table = Table::new(vec![Column::numeric("Age", vec![30.0, 80.0])]).unwrap();
    let wrapped = WrappedModel::new(CdcRisk::default(), &table, vec![0, 1], "CDC").unwrap();
    assert!(evaluate(&wrapped, &table, &[0, 1], f64::NAN).is_err());
}
