//! Feature subsets: the columns known before the outcome is observed.
pub mod subset;

pub use subset::{select_features, FeatureSubset};
