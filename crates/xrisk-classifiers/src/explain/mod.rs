//! Global and local explanations for any `WrappedModel`.
pub mod importance;
pub mod profiles;
pub mod shapley;

pub use importance::{
    variable_importance, variable_importance_with, ImportanceOptions, ImportanceReport, LossFunction,
    VariableImportance,
};
pub use profiles::{
    ceteris_paribus_profile, default_grid, individual_profiles, model_profile, partial_dependence,
    partial_dependence_clustered, partial_dependence_grouped, IceCurves, Profile, ProfileOptions,
};
pub use shapley::{shapley_attribution, shapley_attribution_with, AttributionReport, FeatureAttribution, ShapleyOptions};
