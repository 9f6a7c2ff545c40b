//! A fitted model packaged with its reference data, labels and a display
//! label. This is what the evaluator and the explainers consume.
use crate::data_handling::{Schema, Table};
use crate::error::{Result, XriskError};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::Model;
use crate::stats::validate_labels;

pub struct WrappedModel<M: ClassifierModel = Model> {
    model: M,
    /// Reference rows, projected onto the model features.
    data: Table,
    labels: Vec<i32>,
    label: String,
}

impl<M: ClassifierModel> WrappedModel<M> {
    /// Wrap `model` with reference `data` (any superset of its features) and
    /// 0/1 `labels`, one per row.
    pub fn new(model: M, data: &Table, labels: Vec<i32>, label: &str) -> Result<Self> {
        validate_labels(&labels, data.nrows())?;
        let data = data.select_columns(model.features())?;
        log::debug!(
            "Wrapped model '{}' ({}) with {} reference rows and features {:?}",
            label,
            model.name(),
            data.nrows(),
            model.features()
        );
        Ok(WrappedModel {
            model,
            data,
            labels,
            label: label.to_string(),
        })
    }

    /// Probabilities of the positive class, one per row of `table`.
    ///
    /// Fails if the model breaks its contract (wrong length, values outside
    /// `[0, 1]`).
    pub fn predict(&self, table: &Table) -> Result<Vec<f64>> {
        let predictions = self.model.predict_proba(table)?;
        if predictions.len() != table.nrows() {
            return Err(XriskError::Model(format!(
                "'{}' returned {} predictions for {} rows",
                self.label,
                predictions.len(),
                table.nrows()
            )));
        }
        if let Some(bad) = predictions.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(XriskError::Model(format!(
                "'{}' returned {} which is not a probability",
                self.label, bad
            )));
        }
        Ok(predictions)
    }

    /// Mean prediction over the reference rows.
    pub fn mean_reference_prediction(&self) -> Result<f64> {
        let predictions = self.predict(&self.data)?;
        Ok(predictions.iter().sum::<f64>() / predictions.len().max(1) as f64)
    }

    /// Check that `table` carries the model features with the reference
    /// types and factor levels.
    pub fn ensure_schema(&self, table: &Table) -> Result<()> {
        let reference: Schema = self.data.schema();
        reference.ensure_compatible(&table.schema(), self.features())
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn data(&self) -> &Table {
        &self.data
    }

    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn features(&self) -> &[String] {
        self.model.features()
    }
}
