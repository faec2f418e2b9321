//! Per-model request shapes and response readers.

use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::ModelConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceParams {
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for InferenceParams {
    fn default() -> Self {
        Self {
            max_tokens: 1500,
            temperature: 0.1,
        }
    }
}

impl From<&ModelConfig> for InferenceParams {
    fn from(config: &ModelConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

impl Add for TokenUsage {
    type Output = TokenUsage;

    fn add(self, rhs: TokenUsage) -> TokenUsage {
        TokenUsage {
            input_tokens: self.input_tokens.saturating_add(rhs.input_tokens),
            output_tokens: self.output_tokens.saturating_add(rhs.output_tokens),
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: TokenUsage) {
        *self = *self + rhs;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    Nova,
    Claude,
}

/// A supported generative model and how to talk to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelAdapter {
    /// Public id callers select the model by.
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(skip)]
    pub runtime_id: &'static str,
    #[serde(skip)]
    pub family: ModelFamily,
}

pub const MODELS: [ModelAdapter; 4] = [
    ModelAdapter {
        id: "claude-3-7-sonnet",
        name: "Claude 3.7 Sonnet",
        description: "High accuracy, higher cost",
        runtime_id: "us.anthropic.claude-3-7-sonnet-20250219-v1:0",
        family: ModelFamily::Claude,
    },
    ModelAdapter {
        id: "nova-pro",
        name: "Nova Pro",
        description: "Advanced performance with higher accuracy",
        runtime_id: "us.amazon.nova-pro-v1:0",
        family: ModelFamily::Nova,
    },
    ModelAdapter {
        id: "nova-lite",
        name: "Nova Lite",
        description: "Balanced performance and cost",
        runtime_id: "us.amazon.nova-lite-v1:0",
        family: ModelFamily::Nova,
    },
    ModelAdapter {
        id: "nova-micro",
        name: "Nova Micro",
        description: "Fast and cost-effective",
        runtime_id: "us.amazon.nova-micro-v1:0",
        family: ModelFamily::Nova,
    },
];

pub const DEFAULT_MODEL: &str = "nova-lite";

impl ModelAdapter {
    /// Catalog of selectable models.
    pub fn catalog() -> &'static [ModelAdapter] {
        &MODELS
    }

    pub fn lookup(id: &str) -> Option<&'static ModelAdapter> {
        MODELS.iter().find(|m| m.id == id)
    }

    pub fn build_request(&self, prompt: &str, params: InferenceParams) -> Value {
        match self.family {
            ModelFamily::Nova => json!({
                "messages": [{ "role": "user", "content": [{ "text": prompt }] }],
                "inferenceConfig": {
                    "maxTokens": params.max_tokens,
                    "temperature": params.temperature,
                },
            }),
            ModelFamily::Claude => json!({
                "anthropic_version": "bedrock-2023-05-31",
                "max_tokens": params.max_tokens,
                "temperature": params.temperature,
                "messages": [{ "role": "user", "content": prompt }],
            }),
        }
    }

    /// Generated text, or `None` when the body has no text where the family
    /// puts it.
    pub fn extract_text(&self, body: &Value) -> Option<String> {
        let text = match self.family {
            ModelFamily::Nova => body
                .pointer("/output/message/content/0/text")
                .or_else(|| body.pointer("/output/text")),
            ModelFamily::Claude => body.pointer("/content/0/text"),
        };
        text.and_then(Value::as_str).map(str::to_string)
    }

    /// Token counts; missing counters read as zero.
    pub fn extract_usage(&self, body: &Value) -> TokenUsage {
        let (input_key, output_key) = match self.family {
            ModelFamily::Nova => ("inputTokens", "outputTokens"),
            ModelFamily::Claude => ("input_tokens", "output_tokens"),
        };
        let usage = &body["usage"];
        TokenUsage {
            input_tokens: usage[input_key].as_u64().unwrap_or(0),
            output_tokens: usage[output_key].as_u64().unwrap_or(0),
        }
    }
}
