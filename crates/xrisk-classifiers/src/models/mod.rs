//! Model adapters behind the shared `ClassifierModel` contract.
pub mod cdc_risk;
pub mod classifier_trait;
pub mod decision_tree;
pub mod factory;
pub mod random_forest;
pub(crate) mod utils;
pub mod wrapped;

pub use cdc_risk::CdcRisk;
pub use classifier_trait::{ClassifierModel, FnModel};
pub use decision_tree::TreeClassifier;
pub use random_forest::{ForestClassifier, ForestParams};
pub use wrapped::WrappedModel;

use crate::data_handling::Table;
use crate::error::Result;

/// The fixed set of model kinds. Each variant keeps its native call
/// convention; dispatch is a plain match.
pub enum Model {
    CdcRisk(CdcRisk),
    Tree(TreeClassifier),
    Forest(ForestClassifier),
}

impl ClassifierModel for Model {
    fn predict_proba(&self, table: &Table) -> Result<Vec<f64>> {
        match self {
            Model::CdcRisk(m) => m.predict_proba(table),
            Model::Tree(m) => m.predict_proba(table),
            Model::Forest(m) => m.predict_proba(table),
        }
    }

    fn features(&self) -> &[String] {
        match self {
            Model::CdcRisk(m) => m.features(),
            Model::Tree(m) => m.features(),
            Model::Forest(m) => m.features(),
        }
    }

    fn name(&self) -> &str {
        match self {
            Model::CdcRisk(m) => m.name(),
            Model::Tree(m) => m.name(),
            Model::Forest(m) => m.name(),
        }
    }
}

impl From<CdcRisk> for Model {
    fn from(m: CdcRisk) -> Self {
        Model::CdcRisk(m)
    }
}

impl From<TreeClassifier> for Model {
    fn from(m: TreeClassifier) -> Self {
        Model::Tree(m)
    }
}

impl From<ForestClassifier> for Model {
    fn from(m: ForestClassifier) -> Self {
        Model::Forest(m)
    }
}
