use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

use xrisk_classifiers::config::{ModelConfig, ModelType};
use xrisk_classifiers::data_handling::Value;
use xrisk_classifiers::explain::LossFunction;
use xrisk_classifiers::tuning::TuningConfig;

use crate::util::validate_delimited_file;

/// A model to fit, with the label it is reported under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedModel {
    pub label: String,
    #[serde(flatten)]
    pub config: ModelConfig,
}

/// Parameters of the explanation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainConfig {
    pub n_repeats: usize,
    pub loss: LossFunction,
    pub n_samples: usize,
    /// Grid size for numeric profile variables.
    pub grid_points: usize,
    pub profile_variables: Vec<String>,
    pub group_by: Option<String>,
    pub k: Option<usize>,
    /// Background rows used by profiles and Shapley attribution, taken
    /// evenly spaced from the training table. `None` uses every row.
    pub background_size: Option<usize>,
    /// Row of the validation table to explain locally.
    pub instance_row: usize,
    /// Values overriding the selected row, e.g. `{"Age": 76}`.
    pub instance: BTreeMap<String, Value>,
    pub seed: u64,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        ExplainConfig {
            n_repeats: 10,
            loss: LossFunction::OneMinusAuc,
            n_samples: 25,
            grid_points: 20,
            profile_variables: vec!["Age".to_string()],
            group_by: None,
            k: None,
            background_size: Some(500),
            instance_row: 0,
            instance: BTreeMap::new(),
            seed: 1313,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub train_data: String,
    pub validation_data: String,
    pub delimiter: String,
    pub features: Vec<String>,
    /// Columns known only after the outcome; never used as features.
    pub excluded: Vec<String>,
    pub outcome: String,
    pub positive_level: String,
    /// Score at or above which a row is called positive. Has no default:
    /// it must come from the config file or `--cutoff`.
    pub cutoff: Option<f64>,
    pub models: Vec<NamedModel>,
    /// Random search for a tuned forest; `None` skips tuning.
    pub tuning: Option<TuningConfig>,
    pub explain: ExplainConfig,
    pub output_dir: String,
    pub report: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let seed = 1313;
        PipelineConfig {
            train_data: String::new(),
            validation_data: String::new(),
            delimiter: ";".to_string(),
            features: [
                "Gender",
                "Age",
                "Cardiovascular.Diseases",
                "Diabetes",
                "Neurological.Diseases",
                "Kidney.Diseases",
                "Cancer",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            excluded: ["Hospitalization", "Fever", "Cough", "Weakness"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            outcome: "Death".to_string(),
            positive_level: "Yes".to_string(),
            cutoff: None,
            models: vec![
                NamedModel {
                    label: "CDC".to_string(),
                    config: ModelConfig::new(seed, ModelType::CdcRisk { base_risk: 0.00003 }),
                },
                NamedModel {
                    label: "tree".to_string(),
                    config: ModelConfig::new(
                        seed,
                        ModelType::DecisionTree {
                            max_depth: 4,
                            min_leaf_size: 20,
                        },
                    ),
                },
                NamedModel {
                    label: "forest".to_string(),
                    config: ModelConfig::new(seed, ModelType::default()),
                },
            ],
            tuning: Some(TuningConfig::default()),
            explain: ExplainConfig::default(),
            output_dir: "xrisk_output".to_string(),
            report: true,
        }
    }
}

impl PipelineConfig {
    /// Read the JSON config at `config_path` and apply command line overrides.
    pub fn from_arguments(config_path: &Path, matches: &ArgMatches) -> Result<Self> {
        let mut config = load_pipeline_config(config_path)?;

        if let Some(train_data) = matches.get_one::<String>("train_data") {
            config.train_data = train_data.clone();
        }
        if let Some(validation_data) = matches.get_one::<String>("validation_data") {
            config.validation_data = validation_data.clone();
        }
        if let Some(cutoff) = matches.get_one::<f64>("cutoff") {
            config.cutoff = Some(*cutoff);
        }
        if let Some(output_dir) = matches.get_one::<String>("output_dir") {
            config.output_dir = output_dir.clone();
        }
        if matches.get_flag("no_report") {
            config.report = false;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check input files and the cutoff before any work is done.
    pub fn validate(&self) -> Result<()> {
        validate_delimited_file(&self.train_data)?;
        validate_delimited_file(&self.validation_data)?;
        match self.cutoff {
            Some(c) if c.is_finite() => {}
            Some(c) => anyhow::bail!("Cutoff must be a finite number, got {}", c),
            None => anyhow::bail!("No cutoff given: set \"cutoff\" in the config or pass --cutoff"),
        }
        if self.models.is_empty() && self.tuning.is_none() {
            anyhow::bail!("Nothing to do: no models configured and tuning disabled");
        }
        Ok(())
    }
}

/// Load a pipeline configuration from a JSON file; absent keys take their
/// defaults.
pub fn load_pipeline_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig> {
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: PipelineConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}
