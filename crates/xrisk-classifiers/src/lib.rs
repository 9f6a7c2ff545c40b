//! xrisk-classifiers: evaluate and explain tabular risk classifiers.
//!
//! This crate loads delimited observation tables, narrows them to the
//! features known before the outcome, fits a small family of classifiers
//! (a closed-form relative-risk heuristic, a decision tree, a bagged forest
//! and a randomly searched forest) and puts every one of them behind the same
//! `predict -> probability` contract. On top of that contract it provides
//! performance evaluation (AUC, cutoff metrics, ROC and lift curves), global
//! explanations (permutation importance, partial dependence) and local
//! explanations (Shapley attribution, ceteris-paribus profiles), plus plotly
//! figures and an HTML report for the results.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod evaluation;
pub mod explain;
pub mod feature_selection;
pub mod io;
pub mod models;
pub mod report;
pub mod stats;
pub mod tuning;

pub use error::{Result, XriskError};
