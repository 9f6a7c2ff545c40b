//! Reporting and plotting helpers.
//!
//! `plots` turns evaluation and explanation results into `plotly::Plot`
//! values; `report` collects them with maud markup into one HTML page.
pub mod plots;
pub mod report;

pub use plots::{plot_attribution, plot_importance, plot_lift, plot_profiles, plot_roc};
pub use report::{code_block, performance_table, Report, ReportSection};
