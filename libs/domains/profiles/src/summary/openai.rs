use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::SummaryGenerator;
use super::prompt::{SYSTEM_MESSAGE, summary_prompt};
use crate::error::{ProfileError, ProfileResult};
use crate::models::Profile;
use crate::openai::OpenAIConfig;

const MAX_TOKENS: u32 = 200;
const TEMPERATURE: f32 = 0.7;

/// Chat-completion backed summary generator
pub struct OpenAISummaryGenerator {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAISummaryGenerator {
    pub fn new(config: OpenAIConfig) -> ProfileResult<Self> {
        Ok(Self {
            client: config.http_client()?,
            config,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

fn summary_error(err: reqwest::Error) -> ProfileError {
    ProfileError::Summary(err.to_string())
}

#[async_trait]
impl SummaryGenerator for OpenAISummaryGenerator {
    async fn summarize(&self, profile: &Profile) -> ProfileResult<String> {
        let prompt = summary_prompt(profile);
        let request = ChatRequest {
            model: &self.config.summary_model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_MESSAGE,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(self.config.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(summary_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProfileError::Summary(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let chat: ChatResponse = response.json().await.map_err(summary_error)?;
        let choice = chat
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProfileError::Summary("No completion returned".to_string()))?;

        Ok(choice
            .message
            .content
            .map(|c| c.trim().to_string())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai::stub::{self, Captured};
    use serde_json::json;

    fn profile() -> Profile {
        Profile::from_value(json!({
            "id": "p-1",
            "name": "Ada",
            "school": "Cambridge",
            "location": "London",
            "experience": "Analytical engines",
            "interests": ["math"],
            "looking_for": "a co-founder",
            "support": ""
        }))
        .unwrap()
    }

    async fn generator_for(status: u16, body: &'static str) -> (OpenAISummaryGenerator, Captured) {
        let (base_url, captured) = stub::spawn("chat/completions", status, body).await;
        let generator =
            OpenAISummaryGenerator::new(OpenAIConfig::new("sk-test").with_base_url(base_url))
                .unwrap();
        (generator, captured)
    }

    fn expect_summary_error(result: ProfileResult<String>) -> String {
        match result {
            Err(ProfileError::Summary(message)) => message,
            other => panic!("expected summary error, got {:?}", other),
        }
    }

    #[test]
    fn test_request_wire_format() {
        let request = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_MESSAGE,
                },
                ChatMessage {
                    role: "user",
                    content: "prompt",
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "gpt-3.5-turbo");
        assert_eq!(value["max_tokens"], 200);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1], json!({"role": "user", "content": "prompt"}));
        assert!((value["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_response_with_null_content() {
        let body = json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": null}}]
        });
        let parsed: ChatResponse = serde_json::from_value(body).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[tokio::test]
    async fn test_summarize_trims_completion() {
        let (generator, captured) = generator_for(
            200,
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"  Ada builds engines.\n"}}]}"#,
        )
        .await;

        assert_eq!(
            generator.summarize(&profile()).await.unwrap(),
            "Ada builds engines."
        );

        let captured = captured.lock().unwrap().clone();
        assert_eq!(captured[0].0.as_deref(), Some("Bearer sk-test"));
        let body = &captured[0].1;
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["messages"][0]["content"], SYSTEM_MESSAGE);
        assert!(
            body["messages"][1]["content"]
                .as_str()
                .unwrap()
                .contains("- Name: Ada")
        );
    }

    #[tokio::test]
    async fn test_null_content_is_empty_summary() {
        let (generator, _) = generator_for(
            200,
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":null}}]}"#,
        )
        .await;

        assert_eq!(generator.summarize(&profile()).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_error_status_is_summary_error() {
        let (generator, _) =
            generator_for(429, r#"{"error":{"message":"Rate limit reached"}}"#).await;

        let message = expect_summary_error(generator.summarize(&profile()).await);
        assert!(message.contains("429"), "{}", message);
    }

    #[tokio::test]
    async fn test_no_choices_is_summary_error() {
        let (generator, _) = generator_for(200, r#"{"choices":[]}"#).await;

        let message = expect_summary_error(generator.summarize(&profile()).await);
        assert!(message.contains("No completion"), "{}", message);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_summary_error() {
        let generator =
            OpenAISummaryGenerator::new(OpenAIConfig::new("k").with_base_url(stub::UNREACHABLE))
                .unwrap();
        expect_summary_error(generator.summarize(&profile()).await);
    }
}
