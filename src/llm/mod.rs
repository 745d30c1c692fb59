// OpenAI chat-completions client.
//
// Two call shapes: a structured decision call with an enforced JSON schema
// and an inline chart image, and a plain text call used for reflections.

use crate::models::Decision;
use crate::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const OPENAI_API_BASE: &str = "https://api.openai.com";
const MODEL: &str = "gpt-4o-2024-08-06";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(OPENAI_API_BASE, api_key)
    }

    pub fn with_base_url(base_url: &str, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Schema constraining the model to exactly {decision, reason, percentage}
    fn decision_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "json_schema",
            "json_schema": {
                "name": "BitcoinInvestmentDecision",
                "strict": true,
                "schema": {
                    "type": "object",
                    "properties": {
                        "decision": {"type": "string", "enum": ["buy", "sell", "hold"]},
                        "reason": {"type": "string"},
                        "percentage": {"type": "integer"}
                    },
                    "required": ["decision", "reason", "percentage"],
                    "additionalProperties": false
                }
            }
        })
    }

    /// Structured decision call: system instructions, serialized market
    /// context, and the chart screenshot as an inline data URI.
    ///
    /// A response that does not decode into `Decision` is a hard error for
    /// the cycle; no partial decision is returned.
    pub async fn decide(
        &self,
        system_prompt: &str,
        user_text: &str,
        chart_image_base64: &str,
    ) -> Result<Decision> {
        let request = ChatRequest {
            model: MODEL.to_string(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: MessageContent::Text(system_prompt.to_string()),
                },
                Message {
                    role: "user".to_string(),
                    content: MessageContent::Parts(vec![
                        ContentPart::Text {
                            text: user_text.to_string(),
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: format!("data:image/png;base64,{}", chart_image_base64),
                            },
                        },
                    ]),
                },
            ],
            response_format: Some(Self::decision_schema()),
        };

        let content = self.send(&request).await?;
        let decision: Decision = serde_json::from_str(strip_code_fences(&content))
            .map_err(|e| format!("decision parse error: {} (text: {})", e, content))?;
        Ok(decision)
    }

    /// Plain text completion, used for reflection generation
    pub async fn complete_text(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: MODEL.to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: MessageContent::Text(prompt.to_string()),
            }],
            response_format: None,
        };

        self.send(&request).await
    }

    async fn send(&self, request: &ChatRequest) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("OpenAI API error {}: {}", status, body).into());
        }

        let body: ChatResponse = response.json().await?;
        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or("OpenAI response contained no choices")?;
        Ok(choice.message.content)
    }
}

/// Strip markdown code fences some model responses wrap around JSON
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(inner) = trimmed.strip_prefix("```") {
        let inner = inner.strip_prefix("json").unwrap_or(inner);
        return inner.trim_end_matches("```").trim();
    }
    trimmed
}
