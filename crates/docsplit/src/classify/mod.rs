//! Generative-model classification of page groups.

pub mod http;
pub mod invoker;
pub mod model;
pub mod prompt;

pub use http::HttpModelRuntime;
pub use invoker::{Classification, ClassificationInvoker, ModelRuntime};
pub use model::{
    InferenceParams, ModelAdapter, ModelFamily, TokenUsage, DEFAULT_MODEL,
};
pub use prompt::build_classification_prompt;
