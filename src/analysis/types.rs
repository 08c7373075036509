use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};
use crate::suggestions::SuggestionObject;

/// A block of conversation content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    /// `user` or `model`; absent for system instructions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Ordered text parts.
    pub parts: Vec<Part>,
}

/// A text part inside [`Content`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    /// Part text.
    #[serde(default)]
    pub text: String,
}

impl Content {
    /// Create user content
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part { text: text.into() }],
        }
    }

    /// Create role-less content, as used for system instructions
    pub fn instruction(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part { text: text.into() }],
        }
    }
}

/// Sampling and output settings
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// `application/json` requests JSON mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Completion length cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// Request body for `models/{model}:generateContent`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Conversation turns.
    pub contents: Vec<Content>,
    /// System prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    /// Sampling and output settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// Create a request with the given conversation
    pub fn new(contents: Vec<Content>) -> Self {
        Self {
            contents,
            system_instruction: None,
            generation_config: None,
        }
    }

    /// Set the system instruction
    pub fn with_system_instruction(mut self, text: impl Into<String>) -> Self {
        self.system_instruction = Some(Content::instruction(text));
        self
    }

    /// Ask the model for a JSON document
    pub fn with_json_output(mut self) -> Self {
        self.generation_config
            .get_or_insert_with(GenerationConfig::default)
            .response_mime_type = Some("application/json".to_string());
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.generation_config
            .get_or_insert_with(GenerationConfig::default)
            .temperature = Some(temperature);
        self
    }

    /// Set max output tokens
    pub fn with_max_output_tokens(mut self, max_tokens: u32) -> Self {
        self.generation_config
            .get_or_insert_with(GenerationConfig::default)
            .max_output_tokens = Some(max_tokens);
        self
    }
}

/// Response from `generateContent`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Generated candidates; only the first is read.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Token accounting.
    pub usage_metadata: Option<UsageMetadata>,
    /// Present when the prompt was blocked.
    pub prompt_feedback: Option<PromptFeedback>,
}

/// One generated candidate
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content.
    pub content: Option<Content>,
    /// Why generation stopped.
    pub finish_reason: Option<String>,
}

/// Token usage information
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Tokens in the prompt.
    pub prompt_token_count: Option<u32>,
    /// Tokens in the completion.
    pub candidates_token_count: Option<u32>,
    /// Sum of both.
    pub total_token_count: Option<u32>,
}

/// Safety feedback on the prompt
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Reason the prompt was rejected.
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Extract the analysis object from the response
    pub fn into_suggestion_object(self) -> AnalysisResult<SuggestionObject> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(AnalysisError::InvalidResponse {
                message: format!("prompt blocked: {}", reason),
            });
        }

        let text = self.text().ok_or_else(|| {
            let reason = self
                .candidates
                .first()
                .and_then(|c| c.finish_reason.as_deref())
                .unwrap_or("none");
            AnalysisError::InvalidResponse {
                message: format!("response contained no text (finish reason: {})", reason),
            }
        })?;

        parse_suggestion_object(&text)
    }
}

/// Parse model output into a [`SuggestionObject`], tolerating a Markdown code fence.
pub fn parse_suggestion_object(text: &str) -> AnalysisResult<SuggestionObject> {
    let body = strip_code_fence(text);
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| AnalysisError::InvalidResponse {
            message: format!("Failed to parse analysis JSON: {}", e),
        })?;
    SuggestionObject::try_from(value)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string ("json") up to the first newline
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}

/// Error envelope returned by the provider on non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Error details.
    pub error: ApiErrorDetail,
}

/// Details inside [`ApiErrorBody`]
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    /// Human-readable reason.
    #[serde(default)]
    pub message: String,
}

/// Best-effort human message from an error body
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string())
}
