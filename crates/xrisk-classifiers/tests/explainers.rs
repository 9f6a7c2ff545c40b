//! Integration tests for permutation importance, response profiles and
//! Shapley attribution.

use xrisk_classifiers::data_handling::{Column, Table, Value};
use xrisk_classifiers::explain::{
    ceteris_paribus_profile, default_grid, partial_dependence, partial_dependence_clustered,
    shapley_attribution_with, variable_importance, ShapleyOptions,
};
use xrisk_classifiers::models::{ClassifierModel, FnModel, ForestClassifier, ForestParams, WrappedModel};
use xrisk_classifiers::Result;

fn cohort(n: usize) -> (Table, Vec<i32>) {
    let ages: Vec<f64> = (0..n).map(|i| (20 + (i * 13) % 70) as f64).collect();
    let genders: Vec<&str> = (0..n).map(|i| if i % 2 == 0 { "Female" } else { "Male" }).collect();
    let cardio: Vec<&str> = (0..n).map(|i| if i % 5 == 0 { "Yes" } else { "No" }).collect();
    let labels: Vec<i32> = (0..n)
        .map(|i| i32::from(ages[i] >= 70.0 || (cardio[i] == "Yes" && ages[i] >= 50.0)))
        .collect();
    let table = Table::new(vec![
        Column::factor_from_values("Gender", &genders),
        Column::numeric("Age", ages),
        Column::factor_from_values("Cardiovascular.Diseases", &cardio),
    ])
    .unwrap();
    (table, labels)
}

fn linear_risk(t: &Table) -> Result<Vec<f64>> {
    let age = t.numeric("Age")?;
    let diabetes = t.numeric("Diabetes")?;
    Ok(age.iter().zip(diabetes).map(|(a, d)| 0.005 * a + 0.3 * d).collect())
}

fn interacting_risk(t: &Table) -> Result<Vec<f64>> {
    let (x1, x2, x3) = (t.numeric("x1")?, t.numeric("x2")?, t.numeric("x3")?);
    Ok((0..t.nrows()).map(|i| 0.1 + 0.2 * x1[i] * x2[i] + 0.1 * x3[i]).collect())
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Exact Shapley values: average the telescoping differences of the mean
/// prediction over every ordering of the features.
fn exact_shapley<M: ClassifierModel>(model: &WrappedModel<M>, instance: &Table, background: &Table) -> Vec<f64> {
    let features = model.features().to_vec();
    let mut orderings: Vec<Vec<usize>> = vec![vec![]];
    for _ in 0..features.len() {
        let mut extended = Vec::new();
        for prefix in &orderings {
            for f in 0..features.len() {
                if !prefix.contains(&f) {
                    let mut next = prefix.clone();
                    next.push(f);
                    extended.push(next);
                }
            }
        }
        orderings = extended;
    }
    assert_eq!(orderings.len(), 6);

    let mut totals = vec![0.0; features.len()];
    for ordering in &orderings {
        let mut current = background.clone();
        let mut previous = mean(&model.predict(&current).unwrap());
        for &f in ordering {
            let value = instance.value(0, &features[f]).unwrap();
            current.set_value(&features[f], &value).unwrap();
            let now = mean(&model.predict(&current).unwrap());
            totals[f] += now - previous;
            previous = now;
        }
    }
    totals.iter().map(|t| t / orderings.len() as f64).collect()
}

fn interacting_setup() -> (WrappedModel<impl ClassifierModel>, Table, Table) {
    let background = Table::new(vec![
        Column::numeric("x1", vec![0.0, 1.0, 0.0, 0.0, 1.0, 0.0]),
        Column::numeric("x2", vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]),
        Column::numeric("x3", vec![0.0, 1.0, 0.0, 1.0, 0.0, 0.0]),
    ])
    .unwrap();
    let instance = Table::new(vec![
        Column::numeric("x1", vec![1.0]),
        Column::numeric("x2", vec![1.0]),
        Column::numeric("x3", vec![1.0]),
    ])
    .unwrap();
    let model = FnModel::new("interacting", &["x1", "x2", "x3"], interacting_risk);
    let wrapped = WrappedModel::new(model, &background, vec![0, 1, 0, 1, 0, 1], "interacting").unwrap();
    (wrapped, background, instance)
}

// ---------------------------------------------------------------------------
// Permutation importance
// ---------------------------------------------------------------------------

#[test]
fn importance_does_not_depend_on_row_order() {
    let (table, labels) = cohort(60);
    let features = ["Gender", "Age", "Cardiovascular.Diseases"];
    let params = ForestParams {
        num_trees: 10,
        max_depth: 4,
        min_leaf_size: 3,
        ..ForestParams::default()
    };
    let forest = ForestClassifier::fit(&table, &labels, &features, params, 7).unwrap();
    let wrapped = WrappedModel::new(forest, &table, labels.clone(), "forest").unwrap();

    let reversed: Vec<usize> = (0..table.nrows()).rev().collect();
    let shuffled: Vec<usize> = (0..table.nrows()).map(|i| (i * 7) % 60).collect();

    let reference = variable_importance(&wrapped, &table, &labels, 3).unwrap();
    for order in [reversed, shuffled] {
        let rows = table.select_rows(&order);
        let row_labels: Vec<i32> = order.iter().map(|&i| labels[i]).collect();
        let report = variable_importance(&wrapped, &rows, &row_labels, 3).unwrap();

        assert_eq!(report.baseline_loss, reference.baseline_loss);
        for variable in &reference.variables {
            let other = report.get(&variable.variable).unwrap();
            assert_eq!(other.increases, variable.increases, "{}", variable.variable);
        }
    }
}

#[test]
fn age_dominates_importance_for_age_driven_outcome() {
    let (table, labels) = cohort(60);
    let features = ["Gender", "Age", "Cardiovascular.Diseases"];
    let forest = ForestClassifier::fit(&table, &labels, &features, ForestParams::default(), 3).unwrap();
    let wrapped = WrappedModel::new(forest, &table, labels.clone(), "forest").unwrap();

    let report = variable_importance(&wrapped, &table, &labels, 5).unwrap();
    assert_eq!(report.variables[0].variable, "Age");
    assert!(report.variables[0].mean_increase > 0.0);
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

#[test]
fn partial_dependence_is_background_mean() {
    let background = Table::new(vec![
        Column::numeric("Age", vec![30.0, 50.0, 70.0, 90.0]),
        Column::numeric("Diabetes", vec![0.0, 1.0, 1.0, 0.0]),
    ])
    .unwrap();
    let model = FnModel::new("linear", &["Age", "Diabetes"], linear_risk);
    let wrapped = WrappedModel::new(model, &background, vec![0, 0, 1, 1], "linear").unwrap();

    let grid = default_grid(&background, "Age", 3).unwrap();
    assert_eq!(grid, vec![Value::from(30.0), Value::from(60.0), Value::from(90.0)]);

    let profile = partial_dependence(&wrapped, "Age", &grid, &background).unwrap();
    assert_eq!(profile.n_members, 4);
    for (value, prediction) in profile.points() {
        let age = value.as_number().unwrap();
        assert!((prediction - (0.005 * age + 0.3 * 0.5)).abs() < 1e-12);
    }
}

#[test]
fn ceteris_paribus_at_own_value_is_the_prediction() {
    let (table, labels) = cohort(40);
    let features = ["Gender", "Age", "Cardiovascular.Diseases"];
    let forest = ForestClassifier::fit(&table, &labels, &features, ForestParams::default(), 11).unwrap();
    let wrapped = WrappedModel::new(forest, &table, labels, "forest").unwrap();

    let instance = table.row(3).unwrap();
    let own_age = instance.value(0, "Age").unwrap();
    let mut grid = default_grid(&table, "Age", 5).unwrap();
    grid.push(own_age.clone());

    let profile = ceteris_paribus_profile(&wrapped, &instance, "Age", &grid).unwrap();
    let prediction = wrapped.predict(&instance).unwrap()[0];
    let (_, at_own) = profile.points().find(|(v, _)| **v == own_age).unwrap();
    assert_eq!(at_own, prediction);
}

#[test]
fn clustered_profiles_average_back_to_partial_dependence() {
    let (table, labels) = cohort(50);
    let features = ["Gender", "Age", "Cardiovascular.Diseases"];
    let forest = ForestClassifier::fit(&table, &labels, &features, ForestParams::default(), 5).unwrap();
    let wrapped = WrappedModel::new(forest, &table, labels, "forest").unwrap();
    let grid = default_grid(&table, "Age", 6).unwrap();

    let overall = partial_dependence(&wrapped, "Age", &grid, &table).unwrap();
    let clusters = partial_dependence_clustered(&wrapped, "Age", &grid, &table, 3).unwrap();
    assert!(!clusters.is_empty() && clusters.len() <= 3);
    assert_eq!(clusters.iter().map(|c| c.n_members).sum::<usize>(), 50);

    for g in 0..grid.len() {
        let weighted: f64 = clusters
            .iter()
            .map(|c| c.predictions[g] * c.n_members as f64)
            .sum::<f64>()
            / 50.0;
        assert!((weighted - overall.predictions[g]).abs() < 1e-9);
    }

    // the centered representative is the raw member mean shifted to zero mean
    for cluster in &clusters {
        let centered = cluster.centered.as_ref().unwrap();
        assert_eq!(centered.len(), grid.len());
        let level = mean(&cluster.predictions);
        for (c, p) in centered.iter().zip(cluster.predictions.iter()) {
            assert!((c - (p - level)).abs() < 1e-9);
        }
    }
    assert!(overall.centered.is_none());
}

// ---------------------------------------------------------------------------
// Shapley attribution
// ---------------------------------------------------------------------------

#[test]
fn shapley_contributions_sum_to_prediction_gap() {
    let (wrapped, background, instance) = interacting_setup();
    for n_samples in [1, 7, 40] {
        let options = ShapleyOptions {
            n_samples,
            seed: 99,
        };
        let report = shapley_attribution_with(&wrapped, &instance, &background, &options).unwrap();
        let gap = report.prediction - report.baseline;
        assert!((report.total_contribution() - gap).abs() < 1e-12, "{} samples", n_samples);
    }
}

#[test]
fn shapley_estimate_converges_to_exact_values() {
    let (wrapped, background, instance) = interacting_setup();
    let exact = exact_shapley(&wrapped, &instance, &background);

    let max_error = |n_samples: usize, seed: u64| -> f64 {
        let options = ShapleyOptions { n_samples, seed };
        let report = shapley_attribution_with(&wrapped, &instance, &background, &options).unwrap();
        report
            .contributions
            .iter()
            .zip(exact.iter())
            .map(|(c, e)| (c.contribution - e).abs())
            .fold(0.0, f64::max)
    };

    let seeds = [1u64, 2, 3, 4, 5];
    let coarse = seeds.iter().map(|&s| max_error(100, s)).sum::<f64>() / seeds.len() as f64;
    let fine = seeds.iter().map(|&s| max_error(10_000, s)).sum::<f64>() / seeds.len() as f64;
    assert!(fine < coarse, "fine {} coarse {}", fine, coarse);
    assert!(fine < 0.005, "fine {}", fine);
}

#[test]
fn shapley_is_reproducible_for_a_seed() {
    let (wrapped, background, instance) = interacting_setup();
    let options = ShapleyOptions {
        n_samples: 30,
        seed: 4,
    };
    let a = shapley_attribution_with(&wrapped, &instance, &background, &options).unwrap();
    let b = shapley_attribution_with(&wrapped, &instance, &background, &options).unwrap();
    let contributions = |r: &xrisk_classifiers::explain::AttributionReport| -> Vec<f64> {
        r.contributions.iter().map(|c| c.contribution).collect()
    };
    assert_eq!(contributions(&a), contributions(&b));
}
