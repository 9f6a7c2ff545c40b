use crate::data_handling::Table;
use crate::error::Result;

/// The one prediction contract shared by every model in the crate.
///
/// `predict_proba` reads the columns listed by `features` from `table` and
/// returns one probability of the positive class per row, in `[0, 1]`.
/// Implementations must be deterministic for a fixed model and input; models
/// with internal randomness fix it at fit time.
pub trait ClassifierModel: Send + Sync {
    fn predict_proba(&self, table: &Table) -> Result<Vec<f64>>;

    /// Input columns, in the order the model consumes them.
    fn features(&self) -> &[String];

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}

/// Adapter turning a plain prediction function into a `ClassifierModel`.
pub struct FnModel<F>
where
    F: Fn(&Table) -> Result<Vec<f64>> + Send + Sync,
{
    predict_fn: F,
    features: Vec<String>,
    name: String,
}

impl<F> FnModel<F>
where
    F: Fn(&Table) -> Result<Vec<f64>> + Send + Sync,
{
    pub fn new<S: AsRef<str>>(name: &str, features: &[S], predict_fn: F) -> Self {
        FnModel {
            predict_fn,
            features: features.iter().map(|f| f.as_ref().to_string()).collect(),
            name: name.to_string(),
        }
    }
}

impl<F> ClassifierModel for FnModel<F>
where
    F: Fn(&Table) -> Result<Vec<f64>> + Send + Sync,
{
    fn predict_proba(&self, table: &Table) -> Result<Vec<f64>> {
        (self.predict_fn)(table)
    }

    fn features(&self) -> &[String] {
        &self.features
    }

    fn name(&self) -> &str {
        &self.name
    }
}
