//! The whole analysis, top to bottom: load, select features, fit, evaluate,
//! explain.
use anyhow::{Context, Result};
use serde::Serialize;

use xrisk_classifiers::data_handling::{describe, Table};
use xrisk_classifiers::evaluation::{compare, PerformanceReport};
use xrisk_classifiers::explain::{
    ceteris_paribus_profile, default_grid, model_profile, shapley_attribution_with, variable_importance_with,
    AttributionReport, ImportanceOptions, ImportanceReport, Profile, ProfileOptions, ShapleyOptions,
};
use xrisk_classifiers::feature_selection::FeatureSubset;
use xrisk_classifiers::io::{read_table_with_options, ReadOptions};
use xrisk_classifiers::models::factory::build_model;
use xrisk_classifiers::models::{Model, WrappedModel};
use xrisk_classifiers::tuning::{random_search, TrialRecord};

use crate::pipeline::input::PipelineConfig;
use crate::util::parse_delimiter;

/// Everything the pipeline computes, ready to be written out.
#[derive(Debug, Serialize)]
pub struct PipelineOutcome {
    pub performance: Vec<PerformanceReport>,
    pub importance: Vec<ImportanceReport>,
    pub partial_dependence: Vec<Profile>,
    pub ceteris_paribus: Vec<Profile>,
    pub attributions: Vec<AttributionReport>,
    pub tuning_trials: Option<Vec<TrialRecord>>,
}

struct Cohorts {
    train: Table,
    train_labels: Vec<i32>,
    validation: Table,
    validation_labels: Vec<i32>,
}

fn load_cohorts(config: &PipelineConfig) -> Result<Cohorts> {
    let options = ReadOptions {
        delimiter: parse_delimiter(&config.delimiter)?,
        ..ReadOptions::default()
    };
    let train = read_table_with_options(&config.train_data, &options)
        .with_context(|| format!("Failed to load training data {}", config.train_data))?;
    let validation = read_table_with_options(&config.validation_data, &options)
        .with_context(|| format!("Failed to load validation data {}", config.validation_data))?;
    log::info!(
        "Loaded training cohort ({} rows) and validation cohort ({} rows)",
        train.nrows(),
        validation.nrows()
    );
    log::info!("Training cohort:\n{}", describe(&train, Some(config.outcome.as_str()))?);

    let subset = FeatureSubset::new(&config.features, Some(config.outcome.as_str())).excluding(&config.excluded)?;
    let train = subset.apply(&train)?;
    let validation = subset
        .apply(&validation)?
        .conform_to(&train)
        .context("Validation cohort does not match the training cohort")?;

    let train_labels = train.binary_labels(&config.outcome, &config.positive_level)?;
    let validation_labels = validation.binary_labels(&config.outcome, &config.positive_level)?;
    Ok(Cohorts {
        train,
        train_labels,
        validation,
        validation_labels,
    })
}

/// Evenly spaced rows of `table`, at most `size` of them.
fn background_rows(table: &Table, size: Option<usize>) -> Table {
    match size {
        Some(size) if size > 0 && size < table.nrows() => {
            let indices: Vec<usize> = (0..size).map(|i| i * table.nrows() / size).collect();
            table.select_rows(&indices)
        }
        _ => table.clone(),
    }
}

fn fit_models(config: &PipelineConfig, cohorts: &Cohorts) -> Result<(Vec<WrappedModel>, Option<Vec<TrialRecord>>)> {
    let mut models = Vec::with_capacity(config.models.len() + 1);
    for named in &config.models {
        let model = build_model(&named.config, &cohorts.train, &cohorts.train_labels, &config.features)
            .with_context(|| format!("Failed to fit model '{}'", named.label))?;
        models.push(WrappedModel::new(
            model,
            &cohorts.train,
            cohorts.train_labels.clone(),
            &named.label,
        )?);
    }

    let trials = match &config.tuning {
        Some(tuning) => {
            let tuned = random_search(tuning, &cohorts.train, &cohorts.train_labels, &config.features)
                .context("Hyper-parameter search failed")?;
            models.push(WrappedModel::new(
                Model::Forest(tuned.model),
                &cohorts.train,
                cohorts.train_labels.clone(),
                "tuned forest",
            )?);
            Some(tuned.trials)
        }
        None => None,
    };
    Ok((models, trials))
}

pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineOutcome> {
    let cutoff = config
        .cutoff
        .ok_or_else(|| anyhow::anyhow!("No cutoff given: set \"cutoff\" in the config or pass --cutoff"))?;
    let cohorts = load_cohorts(config)?;
    let (models, tuning_trials) = fit_models(config, &cohorts)?;

    let refs: Vec<&WrappedModel> = models.iter().collect();
    let performance = compare(&refs, &cohorts.validation, &cohorts.validation_labels, cutoff)?;

    let explain = &config.explain;
    let importance_options = ImportanceOptions {
        n_repeats: explain.n_repeats,
        loss: explain.loss,
        seed: explain.seed,
    };
    let importance = models
        .iter()
        .map(|m| variable_importance_with(m, &cohorts.validation, &cohorts.validation_labels, &importance_options))
        .collect::<xrisk_classifiers::Result<Vec<_>>>()?;

    let background = background_rows(&cohorts.train, explain.background_size);
    let profile_options = ProfileOptions {
        group_by: explain.group_by.clone(),
        k: explain.k,
    };
    let mut instance = cohorts
        .validation
        .row(explain.instance_row)
        .context("Invalid instance_row")?;
    for (column, value) in &explain.instance {
        instance
            .set_value(column, value)
            .with_context(|| format!("Cannot set instance value {} = {}", column, value))?;
    }

    let mut partial_dependence = Vec::new();
    let mut ceteris_paribus = Vec::new();
    let mut attributions = Vec::with_capacity(models.len());
    let shapley_options = ShapleyOptions {
        n_samples: explain.n_samples,
        seed: explain.seed,
    };
    for model in &models {
        for variable in &explain.profile_variables {
            // the CDC heuristic only reads Age
            if !model.features().contains(variable) {
                log::debug!("Skipping profile of '{}' for '{}'", variable, model.label());
                continue;
            }
            let grid = default_grid(&cohorts.train, variable, explain.grid_points)?;
            partial_dependence.extend(model_profile(model, variable, &grid, &background, &profile_options)?);
            ceteris_paribus.push(ceteris_paribus_profile(model, &instance, variable, &grid)?);
        }
        attributions.push(shapley_attribution_with(model, &instance, &background, &shapley_options)?);
    }

    Ok(PipelineOutcome {
        performance,
        importance,
        partial_dependence,
        ceteris_paribus,
        attributions,
        tuning_trials,
    })
}
