pub mod audit;
pub mod config;
pub mod context;
pub mod cost;
pub mod custom;
pub mod orchestrator;
pub mod progress;
pub mod result;
pub mod standard;

pub use config::PipelineConfig;
pub use context::{PipelineContext, ProcessRequest};
pub use cost::{custom_cost, standard_cost, CostEstimate, CostLine};
pub use custom::CustomPipeline;
pub use orchestrator::Orchestrator;
pub use progress::{Milestone, NoopProgress, ProgressReporter};
pub use result::{ComparisonResult, PipelineResult};
pub use standard::StandardPipeline;
