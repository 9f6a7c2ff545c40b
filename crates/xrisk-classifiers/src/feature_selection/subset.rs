use serde::{Deserialize, Serialize};

use crate::data_handling::Table;
use crate::error::{Result, XriskError};

/// A fixed, ordered list of model input columns.
///
/// Columns that encode information only available after the outcome (for
/// the COVID cohorts: hospitalisation and symptoms) are listed in
/// `excluded` and may never be part of `features`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSubset {
    pub features: Vec<String>,
    pub outcome: Option<String>,
    #[serde(default)]
    pub excluded: Vec<String>,
}

impl FeatureSubset {
    pub fn new<S: AsRef<str>>(features: &[S], outcome: Option<&str>) -> Self {
        FeatureSubset {
            features: features.iter().map(|f| f.as_ref().to_string()).collect(),
            outcome: outcome.map(str::to_string),
            excluded: Vec::new(),
        }
    }

    /// Declare post-outcome columns; fails if any of them is already a feature.
    pub fn excluding<S: AsRef<str>>(mut self, columns: &[S]) -> Result<Self> {
        self.excluded = columns.iter().map(|c| c.as_ref().to_string()).collect();
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(leak) = self.features.iter().find(|f| self.excluded.contains(f)) {
            return Err(XriskError::InvalidInput(format!(
                "feature '{}' is only known after the outcome",
                leak
            )));
        }
        if let Some(outcome) = &self.outcome {
            if self.features.contains(outcome) {
                return Err(XriskError::InvalidInput(format!(
                    "outcome '{}' cannot be a feature",
                    outcome
                )));
            }
        }
        Ok(())
    }

    /// Projection of `table` onto the features followed by the outcome.
    pub fn apply(&self, table: &Table) -> Result<Table> {
        self.validate()?;
        let mut columns: Vec<&str> = self.features.iter().map(String::as_str).collect();
        if let Some(outcome) = &self.outcome {
            columns.push(outcome);
        }
        let projected = table.select_columns(&columns)?;
        log::debug!(
            "Selected {} of {} columns ({} features)",
            projected.ncols(),
            table.ncols(),
            self.features.len()
        );
        Ok(projected)
    }
}

/// Project `table` onto `features` (plus `outcome` when given), in order.
pub fn select_features<S: AsRef<str>>(table: &Table, features: &[S], outcome: Option<&str>) -> Result<Table> {
    FeatureSubset::new(features, outcome).apply(table)
}
