//! Small synthetic cohorts in the layout of the COVID spring/summer files.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub const HEADER: &str = "Gender;Age;Cardiovascular.Diseases;Diabetes;Neurological.Diseases;Kidney.Diseases;Cancer;Hospitalization;Fever;Cough;Weakness;Death";

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

/// `n` rows; ages cycle over 20..=89 with stride `stride` (coprime to 70).
/// Death when age >= 70, or age >= 50 with a cardiovascular disease.
pub fn cohort_csv(n: usize, stride: usize) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for i in 0..n {
        let age = 20 + (i * stride) % 70;
        let cardio = i % 5 == 0;
        let death = age >= 70 || (cardio && age >= 50);
        out.push_str(&format!(
            "{};{};{};{};{};{};{};{};{};{};{};{}\n",
            if i % 2 == 0 { "Male" } else { "Female" },
            age,
            yes_no(cardio),
            yes_no(i % 6 == 0),
            yes_no(i % 7 == 0),
            yes_no(i % 11 == 0),
            yes_no(i % 13 == 0),
            yes_no(death || i % 3 == 0),
            yes_no(i % 4 == 0),
            yes_no(i % 9 == 0),
            yes_no(i % 8 == 0),
            yes_no(death),
        ));
    }
    out
}

/// Write a training and a validation cohort into `dir`.
pub fn write_cohorts(dir: &Path) -> (PathBuf, PathBuf) {
    let train = dir.join("covid_spring.csv");
    let validation = dir.join("covid_summer.csv");
    std::fs::write(&train, cohort_csv(90, 13)).unwrap();
    std::fs::write(&validation, cohort_csv(70, 17)).unwrap();
    (train, validation)
}

/// A quick configuration: small forests, two tuning trials, few repeats.
pub fn quick_config_json(train: &Path, validation: &Path, output_dir: &Path, cutoff: Option<f64>) -> String {
    let cutoff = cutoff.map_or("null".to_string(), |c| c.to_string());
    format!(
        r#"{{
  "train_data": "{train}",
  "validation_data": "{validation}",
  "cutoff": {cutoff},
  "output_dir": "{output}",
  "models": [
    {{"label": "CDC", "seed": 1, "model": "cdc_risk", "base_risk": 0.00003}},
    {{"label": "tree", "seed": 1, "model": "decision_tree", "max_depth": 3, "min_leaf_size": 5}},
    {{"label": "forest", "seed": 1, "model": "random_forest", "num_trees": 8, "max_depth": 4,
      "min_leaf_size": 3, "feature_fraction": 0.7, "sample_fraction": 1.0}}
  ],
  "tuning": {{
    "n_evals": 2,
    "n_folds": 3,
    "seed": 2,
    "search_space": {{"num_trees": [3, 5], "max_depth": [2, 4], "min_leaf_size": [2, 6], "feature_fraction": [0.5, 1.0]}}
  }},
  "explain": {{
    "n_repeats": 2,
    "n_samples": 4,
    "grid_points": 5,
    "profile_variables": ["Age", "Gender"],
    "background_size": 30,
    "instance": {{"Age": 76, "Gender": "Male", "Cardiovascular.Diseases": "Yes"}}
  }}
}}"#,
        train = train.display(),
        validation = validation.display(),
        cutoff = cutoff,
        output = output_dir.display(),
    )
}

/// `cohort_csv` with the age of data row `row` replaced by `NA`.
pub fn cohort_csv_with_missing_age(n: usize, stride: usize, row: usize) -> String {
    cohort_csv(n, stride)
        .lines()
        .enumerate()
        .map(|(i, line)| {
            if i == row + 1 {
                let mut fields: Vec<&str> = line.split(';').collect();
                fields[1] = "NA";
                fields.join(";")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
        + "\n"
}
