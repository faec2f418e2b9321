use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::classify::model::{InferenceParams, ModelAdapter, TokenUsage};
use crate::classify::prompt::build_classification_prompt;
use crate::error::PipelineError;

/// Transport to the generative model runtime.
#[async_trait]
pub trait ModelRuntime: Send + Sync {
    /// Sends a request body to the given runtime model id and returns the
    /// decoded response body.
    async fn invoke(&self, runtime_model_id: &str, body: Value) -> Result<Value, PipelineError>;
}

/// Raw model answer for one page group.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub raw_text: String,
    pub usage: TokenUsage,
}

#[derive(Clone)]
pub struct ClassificationInvoker {
    runtime: Arc<dyn ModelRuntime>,
    params: InferenceParams,
}

impl ClassificationInvoker {
    pub fn new(runtime: Arc<dyn ModelRuntime>, params: InferenceParams) -> Self {
        Self { runtime, params }
    }

    /// Fails with `UnsupportedModel` before any network call.
    pub fn adapter(model_id: &str) -> Result<&'static ModelAdapter, PipelineError> {
        ModelAdapter::lookup(model_id)
            .ok_or_else(|| PipelineError::UnsupportedModel(model_id.to_string()))
    }

    pub async fn classify(
        &self,
        model_id: &str,
        structured_context: &str,
    ) -> Result<Classification, PipelineError> {
        let adapter = Self::adapter(model_id)?;
        let prompt = build_classification_prompt(structured_context);
        let request = adapter.build_request(&prompt, self.params);

        debug!(model = model_id, prompt_chars = prompt.len(), "Sending classification prompt");
        let body = self.runtime.invoke(adapter.runtime_id, request).await?;

        let raw_text = adapter.extract_text(&body).ok_or_else(|| {
            PipelineError::upstream("model runtime", "Response did not contain generated text")
        })?;
        let usage = adapter.extract_usage(&body);

        info!(
            model = model_id,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "Classification received"
        );

        Ok(Classification { raw_text, usage })
    }
}
