//! In-process stand-ins for the extraction service and the model runtime.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use docsplit::classify::ModelRuntime;
use docsplit::error::PipelineError;
use docsplit::extraction::{
    ExtractionService, InvocationHandle, InvocationRequest, InvocationState,
};
use docsplit::storage::{ObjectStore, ObjectUri};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationKind {
    Standard,
    Custom,
}

impl InvocationKind {
    /// Only the standard invocation carries an override block.
    fn of(request: &InvocationRequest) -> Self {
        if request.override_configuration.is_some() {
            InvocationKind::Standard
        } else {
            InvocationKind::Custom
        }
    }

    fn of_handle(handle: &InvocationHandle) -> Self {
        if handle.as_str().ends_with("/standard") {
            InvocationKind::Standard
        } else {
            InvocationKind::Custom
        }
    }

    fn handle(self) -> InvocationHandle {
        let suffix = match self {
            InvocationKind::Standard => "standard",
            InvocationKind::Custom => "custom",
        };
        InvocationHandle(format!(
            "arn:aws:bedrock:us-west-2:123456789012:data-automation-invocation/{}",
            suffix
        ))
    }
}

/// One segment the fake service writes for an invocation.
#[derive(Debug, Clone)]
pub enum ScriptedSegment {
    Standard(Value),
    Custom {
        status: &'static str,
        output: Option<Value>,
        page_indices: Vec<u32>,
    },
}

impl ScriptedSegment {
    pub fn matched(output: Value, page_indices: Vec<u32>) -> Self {
        ScriptedSegment::Custom {
            status: "MATCH",
            output: Some(output),
            page_indices,
        }
    }

    pub fn unmatched(page_indices: Vec<u32>) -> Self {
        ScriptedSegment::Custom {
            status: "NO_MATCH",
            output: None,
            page_indices,
        }
    }
}

#[derive(Default)]
struct Script {
    states: VecDeque<InvocationState>,
    segments: Vec<ScriptedSegment>,
}

/// Extraction service that writes scripted output on submit and answers
/// status checks from a script. An exhausted status script reports success.
pub struct ScriptedExtraction {
    store: Arc<dyn ObjectStore>,
    standard: Mutex<Script>,
    custom: Mutex<Script>,
    submitted: Mutex<Vec<InvocationRequest>>,
    status_calls: Mutex<u32>,
}

impl ScriptedExtraction {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            standard: Mutex::new(Script::default()),
            custom: Mutex::new(Script::default()),
            submitted: Mutex::new(Vec::new()),
            status_calls: Mutex::new(0),
        }
    }

    fn script(&self, kind: InvocationKind) -> &Mutex<Script> {
        match kind {
            InvocationKind::Standard => &self.standard,
            InvocationKind::Custom => &self.custom,
        }
    }

    pub fn with_segments(self, kind: InvocationKind, segments: Vec<ScriptedSegment>) -> Self {
        self.script(kind).lock().unwrap().segments = segments;
        self
    }

    pub fn with_states(self, kind: InvocationKind, states: Vec<InvocationState>) -> Self {
        self.script(kind).lock().unwrap().states = states.into();
        self
    }

    pub fn submitted(&self) -> Vec<InvocationRequest> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> u32 {
        *self.status_calls.lock().unwrap()
    }

    async fn put_json(&self, uri: &ObjectUri, value: &Value) -> Result<(), PipelineError> {
        let body = serde_json::to_vec(value).unwrap();
        self.store.put(uri, body, "application/json").await?;
        Ok(())
    }
}

#[async_trait]
impl ExtractionService for ScriptedExtraction {
    async fn submit(&self, request: &InvocationRequest) -> Result<InvocationHandle, PipelineError> {
        let kind = InvocationKind::of(request);
        self.submitted.lock().unwrap().push(request.clone());
        let segments = self.script(kind).lock().unwrap().segments.clone();

        let output = ObjectUri::parse(&request.output_configuration.s3_uri)?;
        let prefix = output.join("job-0");
        let mut manifest_segments = Vec::new();

        for (index, segment) in segments.iter().enumerate() {
            match segment {
                ScriptedSegment::Standard(body) => {
                    let uri = prefix.join(&format!("{}/standard_output/0/result.json", index));
                    self.put_json(&uri, body).await?;
                    manifest_segments.push(json!({ "standard_output_path": uri.to_string() }));
                }
                ScriptedSegment::Custom {
                    status,
                    output,
                    page_indices,
                } => {
                    let mut entry = json!({
                        "custom_output_status": status,
                        "split_document": { "page_indices": page_indices },
                    });
                    if let Some(body) = output {
                        let uri = prefix.join(&format!("{}/custom_output/0/result.json", index));
                        self.put_json(&uri, body).await?;
                        entry["custom_output_path"] = json!(uri.to_string());
                    }
                    manifest_segments.push(entry);
                }
            }
        }

        let manifest = json!({
            "output_metadata": [{ "asset_id": 0, "segment_metadata": manifest_segments }]
        });
        self.put_json(&prefix.join("job_metadata.json"), &manifest)
            .await?;

        Ok(kind.handle())
    }

    async fn status(&self, handle: &InvocationHandle) -> Result<InvocationState, PipelineError> {
        *self.status_calls.lock().unwrap() += 1;
        let next = self
            .script(InvocationKind::of_handle(handle))
            .lock()
            .unwrap()
            .states
            .pop_front();
        Ok(next.unwrap_or(InvocationState::Success))
    }
}

/// Response body in the shape the runtime returns for `runtime_model_id`.
pub fn runtime_body(runtime_model_id: &str, text: &str) -> Value {
    if runtime_model_id.contains("anthropic") {
        json!({
            "content": [{ "type": "text", "text": text }],
            "usage": { "input_tokens": 100, "output_tokens": 50 }
        })
    } else {
        json!({
            "output": { "message": { "role": "assistant", "content": [{ "text": text }] } },
            "usage": { "inputTokens": 100, "outputTokens": 50 }
        })
    }
}

/// Model runtime answering from a queue of replies, in call order.
pub struct FakeModelRuntime {
    replies: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl FakeModelRuntime {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(self, text: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    pub fn fail(self, message: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Err(message.into()));
        self
    }

    /// Prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelRuntime for FakeModelRuntime {
    async fn invoke(&self, runtime_model_id: &str, body: Value) -> Result<Value, PipelineError> {
        let prompt = body
            .pointer("/messages/0/content/0/text")
            .or_else(|| body.pointer("/messages/0/content"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        self.prompts.lock().unwrap().push(prompt);

        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(runtime_body(runtime_model_id, &text)),
            Some(Err(message)) => Err(PipelineError::upstream("model runtime", message)),
            None => Err(PipelineError::upstream("model runtime", "no scripted reply")),
        }
    }
}
