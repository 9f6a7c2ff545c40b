pub mod input;
pub mod output;
pub mod runner;

pub use input::{load_pipeline_config, ExplainConfig, NamedModel, PipelineConfig};
pub use output::{build_report, write_outputs};
pub use runner::{run_pipeline, PipelineOutcome};
