//! Claude Messages API client.
//!
//! Only the exchange the hub needs is modelled: one user prompt, optionally
//! with tools, answered by a single response.

use crate::{Error, Schema};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_BASE: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

/// Model used when neither the client nor the request names one.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Claude API client.
#[derive(Clone)]
pub struct Claude {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl Claude {
    /// Create a new Claude client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: API_BASE.to_string(),
        }
    }

    /// Create a Claude client from the ANTHROPIC_API_KEY environment variable.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| Error::NoApiKey)?;
        Ok(Self::new(api_key))
    }

    /// Set the default model for this client.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the client at a different API root (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The model used when a request doesn't name one.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a request and return the parsed response.
    pub async fn complete(&self, request: Request) -> Result<Response, Error> {
        let body = self.build_api_request(&request);
        let headers = self.build_headers()?;

        tracing::debug!(model = %body.model, "sending messages request");

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        let response = Response::from(api_response);
        tracing::debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            stop_reason = ?response.stop_reason,
            "messages response"
        );
        Ok(response)
    }

    /// Ask the model to fill in `T` and deserialize its answer.
    ///
    /// The request carries a single tool built from `T`'s schema and forces
    /// the model to call it. The tool input is the structured reply.
    pub async fn extract<T>(&self, request: Request) -> Result<T, Error>
    where
        T: Schema + DeserializeOwned,
    {
        let name = T::schema_name();
        let response = self
            .complete(request.with_forced_tool(Tool::from_schema::<T>()))
            .await?;

        let Some(call) = response.tool_call(name) else {
            return Err(Error::Parse(format!(
                "model did not call `{name}` (stop reason: {:?})",
                response.stop_reason
            )));
        };

        serde_json::from_value(call.input.clone())
            .map_err(|e| Error::Parse(format!("`{name}` input did not match schema: {e}")))
    }

    fn build_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }

    fn build_api_request<'a>(&'a self, request: &'a Request) -> ApiRequest<'a> {
        ApiRequest {
            model: request.model.as_deref().unwrap_or(&self.model),
            max_tokens: request.max_tokens,
            messages: [ApiMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            tools: (!request.tools.is_empty()).then_some(request.tools.as_slice()),
            tool_choice: request.forced_tool.as_deref().map(ApiToolChoice::forced),
        }
    }
}

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(120))
        .connect_timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

// ============================================================================
// Public types
// ============================================================================

/// A single-prompt request.
#[derive(Debug, Clone)]
pub struct Request {
    pub model: Option<String>,
    pub max_tokens: usize,
    pub prompt: String,
    pub temperature: Option<f32>,
    pub tools: Vec<Tool>,
    /// Name of a tool the model must call.
    pub forced_tool: Option<String>,
}

impl Request {
    /// Create a request carrying one user prompt.
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            model: None,
            max_tokens: 4096,
            prompt: text.into(),
            temperature: None,
            tools: Vec::new(),
            forced_tool: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Offer `tool` and require the model to call it.
    pub fn with_forced_tool(mut self, tool: Tool) -> Self {
        self.forced_tool = Some(tool.name.clone());
        self.tools.push(tool);
        self
    }
}

/// A tool definition.
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

impl Tool {
    /// Build a tool whose input is `T`.
    pub fn from_schema<T: Schema>() -> Self {
        Self {
            name: T::schema_name().to_string(),
            description: T::schema_description().to_string(),
            input_schema: T::json_schema(),
        }
    }
}

/// A tool call made by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

/// A response from Claude. Content other than tool calls is dropped.
#[derive(Debug, Clone)]
pub struct Response {
    pub id: String,
    pub model: String,
    pub tool_calls: Vec<ToolCall>,
    pub stop_reason: StopReason,
    pub usage: Usage,
}

impl Response {
    /// The first call to the named tool, if any.
    pub fn tool_call(&self, name: &str) -> Option<&ToolCall> {
        self.tool_calls.iter().find(|call| call.name == name)
    }
}

impl From<ApiResponse> for Response {
    fn from(api: ApiResponse) -> Self {
        let tool_calls = api
            .content
            .into_iter()
            .filter_map(|block| match block {
                ApiContent::ToolUse { id, name, input } => Some(ToolCall { id, name, input }),
                ApiContent::Other => None,
            })
            .collect();

        let stop_reason = match api.stop_reason.as_deref() {
            Some("max_tokens") => StopReason::MaxTokens,
            Some("stop_sequence") => StopReason::StopSequence,
            Some("tool_use") => StopReason::ToolUse,
            _ => StopReason::EndTurn,
        };

        Self {
            id: api.id,
            model: api.model,
            tool_calls,
            stop_reason,
            usage: Usage {
                input_tokens: api.usage.input_tokens,
                output_tokens: api.usage.output_tokens,
            },
        }
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ToolUse,
}

/// Token usage information.
#[derive(Debug, Clone)]
pub struct Usage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    messages: [ApiMessage<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [Tool]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ApiToolChoice<'a>>,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ApiToolChoice<'a> {
    r#type: &'static str,
    name: &'a str,
}

impl<'a> ApiToolChoice<'a> {
    fn forced(name: &'a str) -> Self {
        Self {
            r#type: "tool",
            name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    id: String,
    model: String,
    content: Vec<ApiContent>,
    #[serde(default)]
    stop_reason: Option<String>,
    usage: ApiUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContent {
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: usize,
    output_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Record a reading
    #[derive(crate::Schema, Deserialize)]
    #[schema(name = "record")]
    #[allow(dead_code)]
    struct Reading {
        value: u32,
    }

    #[test]
    fn test_client_creation() {
        let client = Claude::new("test-key");
        assert_eq!(client.model, DEFAULT_MODEL);
        assert_eq!(client.base_url, API_BASE);
    }

    #[test]
    fn test_client_with_model_and_base_url() {
        let client = Claude::new("test-key")
            .with_model("claude-3-opus")
            .with_base_url("http://localhost:9999/v1/");
        assert_eq!(client.model(), "claude-3-opus");
        assert_eq!(client.base_url, "http://localhost:9999/v1");
    }

    #[test]
    fn test_request_builder() {
        let request = Request::prompt("Hello")
            .with_max_tokens(1000)
            .with_temperature(0.7)
            .with_forced_tool(Tool::from_schema::<Reading>());

        assert_eq!(request.max_tokens, 1000);
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.prompt, "Hello");
        assert_eq!(request.forced_tool.as_deref(), Some("record"));
        assert_eq!(request.tools.len(), 1);
    }

    #[test]
    fn test_forced_tool_serialization() {
        let client = Claude::new("test-key");
        let request = Request::prompt("Hi").with_forced_tool(Tool::from_schema::<Reading>());
        let body = serde_json::to_value(client.build_api_request(&request)).unwrap();

        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Hi");
        assert_eq!(body["tools"][0]["name"], "record");
        assert_eq!(body["tools"][0]["description"], "Record a reading");
        assert_eq!(body["tool_choice"]["type"], "tool");
        assert_eq!(body["tool_choice"]["name"], "record");
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_plain_request_omits_tools() {
        let client = Claude::new("test-key");
        let request = Request::prompt("Hi").with_model("claude-test");
        let body = serde_json::to_value(client.build_api_request(&request)).unwrap();

        assert_eq!(body["model"], "claude-test");
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn test_response_keeps_only_tool_calls() {
        let raw = serde_json::json!({
            "id": "msg_1",
            "model": "m",
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "Here you go"},
                {"type": "tool_use", "id": "t1", "name": "record", "input": {"a": 1}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 3, "output_tokens": 4}
        });
        let api: ApiResponse = serde_json::from_value(raw).unwrap();
        let response = Response::from(api);

        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.stop_reason, StopReason::ToolUse);
        assert_eq!(response.tool_call("record").unwrap().input["a"], 1);
        assert!(response.tool_call("other").is_none());
    }
}
