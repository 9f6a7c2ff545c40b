use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Central configuration for the models in the crate.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Seed for every random choice made while fitting.
    pub seed: u64,

    #[serde(flatten)]
    pub model_type: ModelType,
}

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelType {
    /// Published relative risk by age group times a base risk.
    CdcRisk { base_risk: f64 },
    DecisionTree {
        max_depth: u32,
        min_leaf_size: usize,
    },
    RandomForest {
        num_trees: usize,
        max_depth: u32,
        min_leaf_size: usize,
        /// Share of features each tree sees.
        feature_fraction: f64,
        /// Bootstrap sample size as a share of the training rows.
        sample_fraction: f64,
    },
}

impl ModelType {
    pub fn name(&self) -> &'static str {
        match self {
            ModelType::CdcRisk { .. } => "cdc_risk",
            ModelType::DecisionTree { .. } => "decision_tree",
            ModelType::RandomForest { .. } => "random_forest",
        }
    }
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::RandomForest {
            num_trees: 100,
            max_depth: 8,
            min_leaf_size: 5,
            feature_fraction: 0.6,
            sample_fraction: 1.0,
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "cdc_risk" | "cdc" => Ok(ModelType::CdcRisk { base_risk: 0.00003 }),
            "decision_tree" | "tree" => Ok(ModelType::DecisionTree {
                max_depth: 4,
                min_leaf_size: 20,
            }),
            "random_forest" | "forest" => Ok(ModelType::default()),
            _ => Err(format!(
                "Unknown model type: {}. Expected one of cdc_risk, decision_tree, random_forest",
                s
            )),
        }
    }
}

impl ModelConfig {
    pub fn new(seed: u64, model_type: ModelType) -> Self {
        Self { seed, model_type }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            seed: 1313,
            model_type: ModelType::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names() {
        assert_eq!("tree".parse::<ModelType>().unwrap().name(), "decision_tree");
        assert_eq!("CDC-Risk".parse::<ModelType>().unwrap().name(), "cdc_risk");
        assert!("svm".parse::<ModelType>().is_err());
    }

    #[test]
    fn flattened_json_round_trip() {
        let json = r#"{"seed": 7, "model": "decision_tree", "max_depth": 3, "min_leaf_size": 10}"#;
        let config: ModelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(
            config.model_type,
            ModelType::DecisionTree {
                max_depth: 3,
                min_leaf_size: 10
            }
        );
    }
}
