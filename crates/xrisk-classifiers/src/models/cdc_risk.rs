//! Closed-form mortality risk from published relative risks by age group.
use crate::data_handling::Table;
use crate::error::{Result, XriskError};
use crate::models::classifier_trait::ClassifierModel;

/// Right-closed upper bounds of the age groups; the last group is open.
const AGE_BOUNDS: [f64; 8] = [4.5, 17.5, 29.5, 39.5, 49.5, 64.5, 74.5, 84.5];

/// Mortality relative to the 5-17 age group.
const RELATIVE_RISK: [f64; 9] = [2.0, 1.0, 15.0, 45.0, 130.0, 400.0, 1100.0, 2800.0, 7900.0];

#[derive(Debug, Clone)]
pub struct CdcRisk {
    pub base_risk: f64,
    age_column: String,
    features: Vec<String>,
}

impl CdcRisk {
    pub fn new(base_risk: f64) -> Self {
        Self::with_age_column(base_risk, "Age")
    }

    pub fn with_age_column(base_risk: f64, age_column: &str) -> Self {
        CdcRisk {
            base_risk,
            age_column: age_column.to_string(),
            features: vec![age_column.to_string()],
        }
    }

    /// Relative risk multiplier for one age.
    pub fn relative_risk(age: f64) -> f64 {
        let group = AGE_BOUNDS.iter().filter(|&&bound| age > bound).count();
        RELATIVE_RISK[group]
    }
}

impl Default for CdcRisk {
    fn default() -> Self {
        Self::new(0.00003)
    }
}

impl ClassifierModel for CdcRisk {
    fn predict_proba(&self, table: &Table) -> Result<Vec<f64>> {
        table
            .numeric(&self.age_column)?
            .iter()
            .enumerate()
            .map(|(row, &age)| {
                if age.is_nan() {
                    return Err(XriskError::InvalidInput(format!(
                        "missing '{}' at row {}",
                        self.age_column, row
                    )));
                }
                Ok((Self::relative_risk(age) * self.base_risk).clamp(0.0, 1.0))
            })
            .collect()
    }

    fn features(&self) -> &[String] {
        &self.features
    }

    fn name(&self) -> &str {
        "cdc_risk"
    }
}
