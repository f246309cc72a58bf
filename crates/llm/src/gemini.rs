//! Google Gemini `generateContent` client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use switchboard_common::{Provider, Result, SwitchboardError};

use crate::client::{
    http_error_message, LlmClient, LlmRequest, LlmResponse, Role, TokenUsage,
    TRANSPORT_FAILURE_PREFIX,
};

const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4096;
const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GeminiUsage>,
    #[serde(rename = "modelVersion")]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiUsage {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u32,
}

pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(base_url: Option<String>, model: String, api_key: String) -> Self {
        let base_url = base_url
            .unwrap_or_else(|| Provider::Gemini.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            base_url,
            model,
            api_key,
            http_client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// The system instruction is folded into the first user turn.
    fn build_contents(request: &LlmRequest) -> Vec<GeminiContent> {
        let mut contents: Vec<GeminiContent> = request
            .messages
            .iter()
            .map(|msg| GeminiContent {
                role: match msg.role {
                    Role::Assistant => "model".to_string(),
                    Role::User | Role::System => "user".to_string(),
                },
                parts: vec![GeminiPart {
                    text: msg.content.clone(),
                }],
            })
            .collect();

        if let Some(system) = request.system_prompt.as_deref().filter(|s| !s.is_empty()) {
            match contents.iter_mut().find(|c| c.role == "user") {
                Some(first_user) => {
                    if let Some(part) = first_user.parts.first_mut() {
                        part.text = format!("{system}\n\n{}", part.text);
                    }
                }
                None => contents.insert(
                    0,
                    GeminiContent {
                        role: "user".to_string(),
                        parts: vec![GeminiPart {
                            text: system.to_string(),
                        }],
                    },
                ),
            }
        }

        contents
    }

    fn build_request_body(&self, request: &LlmRequest) -> GeminiRequest {
        GeminiRequest {
            contents: Self::build_contents(request),
            generation_config: GeminiGenerationConfig {
                temperature: request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                max_output_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
            },
        }
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let body = self.build_request_body(&request);

        let response = self
            .http_client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                // reqwest includes the URL in its message; keep the key out of logs
                let msg = e.without_url().to_string();
                SwitchboardError::provider(
                    Provider::Gemini,
                    format!("{TRANSPORT_FAILURE_PREFIX}: {msg}"),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let body_text = response.text().await.unwrap_or_default();
            return Err(SwitchboardError::provider(
                Provider::Gemini,
                http_error_message(status, &headers, &body_text),
            ));
        }

        let parsed: GeminiResponse = response.json().await.map_err(|e| {
            SwitchboardError::provider(
                Provider::Gemini,
                format!("failed to parse response: {}", e.without_url()),
            )
        })?;

        let candidate = parsed.candidates.into_iter().next();
        let finish_reason = candidate.as_ref().and_then(|c| c.finish_reason.clone());
        let content = candidate
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: parsed.model_version.unwrap_or_else(|| self.model.clone()),
            usage: parsed.usage_metadata.map(|u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
            }),
            finish_reason,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatMessage;

    fn client() -> GeminiClient {
        GeminiClient::new(None, "gemini-pro".to_string(), "g-key".to_string())
    }

    #[test]
    fn endpoint_names_model() {
        assert_eq!(
            client().endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent"
        );
    }

    #[test]
    fn system_prompt_is_prepended_to_prompt() {
        let request = LlmRequest {
            system_prompt: Some("You are an analytical thinker.".to_string()),
            messages: vec![ChatMessage::user("Compare A and B")],
            temperature: None,
            max_tokens: None,
        };

        let json = serde_json::to_value(client().build_request_body(&request)).unwrap();
        let contents = json["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(
            contents[0]["parts"][0]["text"],
            "You are an analytical thinker.\n\nCompare A and B"
        );
    }

    #[test]
    fn generation_config_defaults() {
        let request = LlmRequest {
            messages: vec![ChatMessage::user("hi")],
            ..Default::default()
        };

        let json = serde_json::to_value(client().build_request_body(&request)).unwrap();
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 4096);
        let temp = json["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temp - 0.7).abs() < 0.001);
    }

    #[test]
    fn prompt_without_system_is_untouched() {
        let request = LlmRequest {
            messages: vec![ChatMessage::user("plain")],
            ..Default::default()
        };

        let json = serde_json::to_value(client().build_request_body(&request)).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "plain");
    }

    #[test]
    fn response_parsing_tolerates_missing_fields() {
        let parsed: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"ok"}]},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        assert!(parsed.usage_metadata.is_none());
    }
}
