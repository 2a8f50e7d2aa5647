//! Gemini `generateContent` adapter.
//!
//! Implements [`LlmGateway`] over the Gemini REST API. Tiers map to the
//! configured fast/capable model names, earlier turns become alternating
//! `user`/`model` contents, and attachments are appended to the final user
//! turn as a delimited block.

use crate::config::FileConfig;
use async_trait::async_trait;
use draftsmith_application::ports::llm_gateway::{
    ContextEntry, GatewayError, GenerationRequest, LlmGateway,
};
use draftsmith_domain::{ModelTier, PromptTemplate, Role};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Delay before the first retry; doubled for each further attempt
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Connection settings for [`GeminiGateway`]
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub api_key: String,
    pub fast_model: String,
    pub capable_model: String,
    pub timeout: Duration,
    /// Extra attempts after a transient failure
    pub max_retries: u32,
}

impl GeminiConfig {
    /// Build from file configuration, reading the key from the configured
    /// environment variable.
    pub fn from_file_config(config: &FileConfig) -> Result<Self, GatewayError> {
        let env_name = &config.provider.api_key_env;
        let api_key = std::env::var(env_name)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                GatewayError::AuthenticationError(format!(
                    "{} is not set; export your Gemini API key",
                    env_name
                ))
            })?;

        Ok(Self {
            base_url: config.provider.base_url.trim_end_matches('/').to_string(),
            api_key,
            fast_model: config.models.fast.clone(),
            capable_model: config.models.capable.clone(),
            timeout: Duration::from_secs(config.provider.timeout_secs),
            max_retries: 1,
        })
    }

    fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast_model,
            ModelTier::Capable => &self.capable_model,
        }
    }
}

/// LLM gateway backed by the Gemini REST API
pub struct GeminiGateway {
    client: Client,
    config: GeminiConfig,
}

impl GeminiGateway {
    pub fn new(config: GeminiConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Other(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.config.base_url, model)
    }

    async fn send_once(&self, model: &str, body: &GeminiRequest) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(map_status(status, model, &error_text));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        extract_text(parsed)
    }
}

#[async_trait]
impl LlmGateway for GeminiGateway {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GatewayError> {
        let model = self.config.model_for(request.options.model_tier).to_string();
        let body = build_body(&request);

        let mut attempt = 0;
        loop {
            debug!(
                model = %model,
                attempt,
                search = request.options.search_grounding,
                code_execution = request.options.code_execution,
                "Sending generateContent request"
            );
            match self.send_once(&model, &body).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    let delay = RETRY_BACKOFF * 2u32.pow(attempt);
                    warn!(model = %model, "Transient gateway error, retrying: {}", e);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// ==================== Wire format ====================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum GeminiTool {
    GoogleSearch {},
    CodeExecution {},
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

fn text_content(role: Option<&str>, text: String) -> GeminiContent {
    GeminiContent {
        role: role.map(str::to_string),
        parts: vec![GeminiPart { text: Some(text) }],
    }
}

fn wire_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

/// Request body for a generation request
fn build_body(request: &GenerationRequest) -> GeminiRequest {
    let mut contents: Vec<GeminiContent> = request
        .context
        .iter()
        .map(|ContextEntry { role, content }| {
            text_content(Some(wire_role(*role)), content.clone())
        })
        .collect();

    let mut prompt = request.prompt.clone();
    prompt.push_str(&PromptTemplate::attachment_block(&request.attachments));
    contents.push(text_content(Some("user"), prompt));

    let mut tools = Vec::new();
    if request.options.search_grounding {
        tools.push(GeminiTool::GoogleSearch {});
    }
    if request.options.code_execution {
        tools.push(GeminiTool::CodeExecution {});
    }

    GeminiRequest {
        system_instruction: request
            .system
            .as_ref()
            .map(|system| text_content(None, system.clone())),
        contents,
        tools,
    }
}

/// Concatenated text of the first candidate
fn extract_text(response: GeminiResponse) -> Result<String, GatewayError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(GatewayError::InvalidResponse(format!(
            "prompt rejected: {}",
            reason
        )));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate
            .finish_reason
            .unwrap_or_else(|| "unknown".to_string());
        return Err(GatewayError::InvalidResponse(format!(
            "empty candidate (finish reason: {})",
            reason
        )));
    }
    Ok(text)
}

fn map_transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else if e.is_connect() {
        GatewayError::ConnectionError(e.to_string())
    } else {
        GatewayError::RequestFailed(e.to_string())
    }
}

fn map_status(status: StatusCode, model: &str, body: &str) -> GatewayError {
    let detail = format!("HTTP {}: {}", status.as_u16(), body.trim());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GatewayError::AuthenticationError(detail)
        }
        StatusCode::NOT_FOUND => GatewayError::ModelNotAvailable(model.to_string()),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => GatewayError::Timeout,
        StatusCode::TOO_MANY_REQUESTS => GatewayError::Unavailable(detail),
        s if s.is_server_error() => GatewayError::Unavailable(detail),
        _ => GatewayError::RequestFailed(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftsmith_application::ports::llm_gateway::GenerationOptions;
    use draftsmith_domain::Attachment;
    use serde_json::json;

    #[test]
    fn test_body_with_context_attachments_and_search() {
        let request = GenerationRequest::new(
            "And why?",
            GenerationOptions::new(ModelTier::Capable).with_search(true),
        )
        .with_system("be precise")
        .with_context(vec![
            ContextEntry::new(Role::User, "What is a tide?"),
            ContextEntry::new(Role::Assistant, "A tide is..."),
        ])
        .with_attachments(vec![Attachment::new("notes.txt", "moon")]);

        let body = serde_json::to_value(build_body(&request)).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be precise");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][2]["role"], "user");
        let last = body["contents"][2]["parts"][0]["text"].as_str().unwrap();
        assert!(last.starts_with("And why?"));
        assert!(last.contains("--- notes.txt ---\nmoon"));
        assert_eq!(body["tools"], json!([{ "google_search": {} }]));
    }

    #[test]
    fn test_body_with_search_and_code_execution() {
        let options = GenerationOptions::new(ModelTier::Capable)
            .with_search(true)
            .with_code_execution(true);
        let request = GenerationRequest::new("Sum 1..100", options);
        let body = serde_json::to_value(build_body(&request)).unwrap();
        assert_eq!(
            body["tools"],
            json!([{ "google_search": {} }, { "code_execution": {} }])
        );

        let options = GenerationOptions::new(ModelTier::Capable).with_code_execution(true);
        let request = GenerationRequest::new("Sum 1..100", options);
        let body = serde_json::to_value(build_body(&request)).unwrap();
        assert_eq!(body["tools"], json!([{ "code_execution": {} }]));
    }

    #[test]
    fn test_body_without_search_omits_tools() {
        let request = GenerationRequest::new("hi", GenerationOptions::new(ModelTier::Fast));
        let body = serde_json::to_value(build_body(&request)).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("systemInstruction").is_none());
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Hello " }, { "text": "world" }] },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "Hello world");
    }

    #[test]
    fn test_extract_text_skips_code_parts() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [
                    { "text": "The sum is " },
                    { "executableCode": { "language": "PYTHON", "code": "print(sum(range(101)))" } },
                    { "codeExecutionResult": { "outcome": "OUTCOME_OK", "output": "5050" } },
                    { "text": "5050." }
                ] }
            }]
        }))
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "The sum is 5050.");
    }

    #[test]
    fn test_extract_text_blocked_prompt() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap();
        let err = extract_text(response).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_extract_text_empty_candidate() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{ "finishReason": "MAX_TOKENS" }]
        }))
        .unwrap();
        let err = extract_text(response).unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            map_status(StatusCode::FORBIDDEN, "m", "denied"),
            GatewayError::AuthenticationError(_)
        ));
        assert!(matches!(
            map_status(StatusCode::NOT_FOUND, "gemini-x", ""),
            GatewayError::ModelNotAvailable(ref m) if m == "gemini-x"
        ));
        assert!(map_status(StatusCode::SERVICE_UNAVAILABLE, "m", "").is_transient());
        assert!(map_status(StatusCode::TOO_MANY_REQUESTS, "m", "").is_transient());
        assert!(!map_status(StatusCode::BAD_REQUEST, "m", "").is_transient());
    }

    #[test]
    fn test_model_for_tier() {
        let config = GeminiConfig {
            base_url: "http://localhost".to_string(),
            api_key: "k".to_string(),
            fast_model: "flash".to_string(),
            capable_model: "pro".to_string(),
            timeout: Duration::from_secs(1),
            max_retries: 0,
        };
        assert_eq!(config.model_for(ModelTier::Fast), "flash");
        let gateway = GeminiGateway::new(config).unwrap();
        assert_eq!(
            gateway.endpoint("pro"),
            "http://localhost/models/pro:generateContent"
        );
    }
}
