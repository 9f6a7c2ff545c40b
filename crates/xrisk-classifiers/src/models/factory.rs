use crate::config::{ModelConfig, ModelType};
use crate::data_handling::Table;
use crate::error::Result;
use crate::models::{CdcRisk, ForestClassifier, ForestParams, Model, TreeClassifier};

/// Fit the model described by `config` on `table`/`labels`.
///
/// `features` is ignored by the CDC heuristic, which only reads `Age`.
pub fn build_model<S: AsRef<str>>(
    config: &ModelConfig,
    table: &Table,
    labels: &[i32],
    features: &[S],
) -> Result<Model> {
    log::info!("Fitting {} model on {} rows", config.model_type.name(), table.nrows());
    let model = match &config.model_type {
        ModelType::CdcRisk { base_risk } => Model::CdcRisk(CdcRisk::new(*base_risk)),
        ModelType::DecisionTree {
            max_depth,
            min_leaf_size,
        } => Model::Tree(TreeClassifier::fit(table, labels, features, *max_depth, *min_leaf_size)?),
        ModelType::RandomForest {
            num_trees,
            max_depth,
            min_leaf_size,
            feature_fraction,
            sample_fraction,
        } => {
            let params = ForestParams {
                num_trees: *num_trees,
                max_depth: *max_depth,
                min_leaf_size: *min_leaf_size,
                feature_fraction: *feature_fraction,
                sample_fraction: *sample_fraction,
            };
            Model::Forest(ForestClassifier::fit(table, labels, features, params, config.seed)?)
        }
    };
    Ok(model)
}
