//! Chat-model client implementations
//!
//! Provides the Gemini and Groq implementations of
//! [`docent_core::ChatClient`] with support for both synchronous and
//! streaming responses. Callers depend only on the role/text message
//! contract; vendor request shapes stay inside this module.

use std::time::Duration;

use async_trait::async_trait;
use docent_core::{
    ChatClient, ChatMessage, ChatProvider, DocentError, LlmConfig, Result, Role,
};
use futures::stream::{BoxStream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

fn http_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_default()
}

// ============================================================================
// Gemini Client
// ============================================================================

/// Gemini chat API client
pub struct GeminiChat {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

impl GeminiChat {
    /// Create a new Gemini chat client
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: http_client(timeout_secs),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens,
            temperature,
        }
    }

    /// Create from config
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .gemini_api_key
            .as_ref()
            .ok_or_else(|| DocentError::Config("Gemini API key required".to_string()))?;

        Ok(Self::new(
            api_key.clone(),
            config.chat_model.clone(),
            config.max_tokens,
            config.temperature,
            config.timeout_secs,
        ))
    }

    fn build_request(&self, messages: &[ChatMessage]) -> GeminiRequest {
        // Gemini takes the system instruction out of band; everything else
        // becomes user-role content in order.
        let system_text: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        let contents = messages
            .iter()
            .filter(|m| m.role == Role::Human)
            .map(|m| GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                }],
            })
            .collect();

        GeminiRequest {
            system_instruction: if system_text.is_empty() {
                None
            } else {
                Some(GeminiContent {
                    role: None,
                    parts: vec![GeminiPart {
                        text: system_text.join("\n"),
                    }],
                })
            },
            contents,
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_tokens,
            },
        }
    }
}

fn gemini_text(response: GeminiResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().map(|p| p.text).collect();
    Some(text)
}

#[async_trait]
impl ChatClient for GeminiChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = self.build_request(messages);

        let response = self
            .client
            .post(format!(
                "{GEMINI_API_BASE}/models/{}:generateContent",
                self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DocentError::ChatService {
                status: "transport".to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DocentError::ChatService {
                status: status.to_string(),
                message,
            });
        }

        let result: GeminiResponse =
            response.json().await.map_err(|e| DocentError::ChatService {
                status: "invalid response".to_string(),
                message: e.to_string(),
            })?;

        gemini_text(result).ok_or_else(|| DocentError::ChatService {
            status: "invalid response".to_string(),
            message: "no candidates returned".to_string(),
        })
    }

    async fn complete_stream(
        &self,
        messages: &[ChatMessage],
    ) -> Result<BoxStream<'static, Result<String>>> {
        let request = self.build_request(messages);

        let response = self
            .client
            .post(format!(
                "{GEMINI_API_BASE}/models/{}:streamGenerateContent?alt=sse",
                self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DocentError::ChatService {
                status: "transport".to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DocentError::ChatService {
                status: status.to_string(),
                message,
            });
        }

        let stream = response.bytes_stream();

        let mapped_stream = stream.filter_map(|result| async move {
            match result {
                Ok(bytes) => {
                    let text = String::from_utf8_lossy(&bytes);
                    // Parse SSE format: data: {...}
                    let mut content = String::new();
                    for line in text.lines() {
                        if let Some(data) = line.strip_prefix("data: ") {
                            if let Ok(parsed) = serde_json::from_str::<GeminiResponse>(data) {
                                if let Some(fragment) = gemini_text(parsed) {
                                    content.push_str(&fragment);
                                }
                            }
                        }
                    }
                    if content.is_empty() {
                        None
                    } else {
                        Some(Ok(content))
                    }
                }
                Err(e) => Some(Err(DocentError::ChatService {
                    status: "stream".to_string(),
                    message: e.to_string(),
                })),
            }
        });

        Ok(Box::pin(mapped_stream))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

// ============================================================================
// Groq Client
// ============================================================================

/// Groq chat API client (OpenAI-compatible wire format)
pub struct GroqChat {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<GroqMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct GroqMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqMessage,
}

#[derive(Debug, Deserialize)]
struct GroqStreamChoice {
    delta: GroqDelta,
}

#[derive(Debug, Deserialize)]
struct GroqDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqStreamResponse {
    choices: Vec<GroqStreamChoice>,
}

fn groq_role(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::Human => "user",
    }
}

impl GroqChat {
    /// Create a new Groq chat client
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: http_client(timeout_secs),
            api_key: api_key.into(),
            base_url: GROQ_API_BASE.to_string(),
            model: model.into(),
            max_tokens,
            temperature,
        }
    }

    /// Create from config
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .groq_api_key
            .as_ref()
            .ok_or_else(|| DocentError::Config("Groq API key required".to_string()))?;

        Ok(Self::new(
            api_key.clone(),
            config.chat_model.clone(),
            config.max_tokens,
            config.temperature,
            config.timeout_secs,
        ))
    }

    fn build_request(&self, messages: &[ChatMessage], stream: bool) -> GroqRequest {
        GroqRequest {
            model: self.model.clone(),
            messages: messages
                .iter()
                .map(|m| GroqMessage {
                    role: groq_role(m.role).to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: stream.then_some(true),
        }
    }
}

#[async_trait]
impl ChatClient for GroqChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = self.build_request(messages, false);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| DocentError::ChatService {
                status: "transport".to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DocentError::ChatService {
                status: status.to_string(),
                message,
            });
        }

        let result: GroqResponse =
            response.json().await.map_err(|e| DocentError::ChatService {
                status: "invalid response".to_string(),
                message: e.to_string(),
            })?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| DocentError::ChatService {
                status: "invalid response".to_string(),
                message: "no choices returned".to_string(),
            })
    }

    async fn complete_stream(
        &self,
        messages: &[ChatMessage],
    ) -> Result<BoxStream<'static, Result<String>>> {
        let request = self.build_request(messages, true);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| DocentError::ChatService {
                status: "transport".to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DocentError::ChatService {
                status: status.to_string(),
                message,
            });
        }

        let stream = response.bytes_stream();

        let mapped_stream = stream.filter_map(|result| async move {
            match result {
                Ok(bytes) => {
                    let text = String::from_utf8_lossy(&bytes);
                    // Parse SSE format: data: {...}
                    let mut content = String::new();
                    for line in text.lines() {
                        if let Some(data) = line.strip_prefix("data: ") {
                            if data == "[DONE]" {
                                continue;
                            }
                            if let Ok(parsed) = serde_json::from_str::<GroqStreamResponse>(data) {
                                if let Some(choice) = parsed.choices.first() {
                                    if let Some(c) = &choice.delta.content {
                                        content.push_str(c);
                                    }
                                }
                            }
                        }
                    }
                    if content.is_empty() {
                        None
                    } else {
                        Some(Ok(content))
                    }
                }
                Err(e) => Some(Err(DocentError::ChatService {
                    status: "stream".to_string(),
                    message: e.to_string(),
                })),
            }
        });

        Ok(Box::pin(mapped_stream))
    }

    fn name(&self) -> &str {
        "groq"
    }
}

// ============================================================================
// Factory function
// ============================================================================

/// Create a chat client from config
pub fn create_chat_client(config: &LlmConfig) -> Result<Box<dyn ChatClient>> {
    match config.provider {
        ChatProvider::Gemini => Ok(Box::new(GeminiChat::from_config(config)?)),
        ChatProvider::Groq => Ok(Box::new(GroqChat::from_config(config)?)),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_request_separates_system_instruction() {
        let client = GeminiChat::new("key", "gemini-2.0-flash", 1024, 0.1, 60);
        let messages = [
            ChatMessage::system("ground rules"),
            ChatMessage::human("what is the refund window?"),
        ];

        let request = client.build_request(&messages);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json["systemInstruction"]["parts"][0]["text"],
            "ground rules"
        );
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(
            json["contents"][0]["parts"][0]["text"],
            "what is the refund window?"
        );
    }

    #[test]
    fn test_groq_role_mapping() {
        assert_eq!(groq_role(Role::System), "system");
        assert_eq!(groq_role(Role::Human), "user");
    }

    #[test]
    fn test_groq_request_shape() {
        let client = GroqChat::new("key", "llama-3.3-70b-versatile", 1024, 0.2, 60);
        let messages = [
            ChatMessage::system("ground rules"),
            ChatMessage::human("hello"),
        ];

        let request = client.build_request(&messages, true);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["stream"], true);
    }

    #[test]
    fn test_missing_keys_rejected() {
        let config = LlmConfig::default();
        assert!(GeminiChat::from_config(&config).is_err());
        assert!(GroqChat::from_config(&config).is_err());
    }
}
