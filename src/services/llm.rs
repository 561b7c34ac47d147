use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::config::Config;

/// Sampling temperature for every completion call.
pub const TEMPERATURE: f32 = 0.0;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("no API key configured for the completion service")]
    MissingApiKey,
    #[error("request to completion service failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("completion service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed completion response: {0}")]
    Malformed(String),
}

/// Text in, text out.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: Option<String>,
}

/// Client for an OpenAI-compatible `/completions` endpoint.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
}

impl OpenAiClient {
    pub fn new(config: &Config) -> Result<Self, CompletionError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(OpenAiClient {
            client: builder.build()?,
            api_url: format!("{}/completions", config.api_base),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl CompletionService for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let api_key = self.api_key.as_ref().ok_or(CompletionError::MissingApiKey)?;

        let response = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .bearer_auth(api_key)
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "temperature": TEMPERATURE,
                "max_tokens": self.max_tokens,
            }))
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;
        if !status.is_success() {
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body: response_text,
            });
        }

        let parsed: CompletionResponse = serde_json::from_str(&response_text)
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.text)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn config_for(server: &mockito::Server, api_key: Option<&str>) -> Config {
        Config {
            api_base: server.url(),
            api_key: api_key.map(str::to_string),
            model: "test-model".to_string(),
            max_tokens: 32,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "test-model",
                "prompt": "Texas Penal Code Title 3",
                "temperature": 0.0,
                "max_tokens": 32,
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": [{"text": "\n\nTitle 3 covers homicide.", "index": 0}]}"#)
            .create_async()
            .await;

        let client = OpenAiClient::new(&config_for(&server, Some("sk-test"))).unwrap();
        let text = client.complete("Texas Penal Code Title 3").await.unwrap();

        assert_eq!(text, "\n\nTitle 3 covers homicide.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_no_choices_yields_empty_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/completions")
            .with_status(200)
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let client = OpenAiClient::new(&config_for(&server, Some("sk-test"))).unwrap();
        assert_eq!(client.complete("anything").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/completions")
            .with_status(401)
            .with_body(r#"{"error": {"message": "Incorrect API key provided"}}"#)
            .create_async()
            .await;

        let client = OpenAiClient::new(&config_for(&server, Some("sk-bad"))).unwrap();
        let err = client.complete("anything").await.unwrap_err();
        assert!(matches!(err, CompletionError::Status { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/completions")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let client = OpenAiClient::new(&config_for(&server, Some("sk-test"))).unwrap();
        let err = client.complete("anything").await.unwrap_err();
        assert!(matches!(err, CompletionError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_missing_api_key_sends_nothing() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/completions")
            .expect(0)
            .create_async()
            .await;

        let client = OpenAiClient::new(&config_for(&server, None)).unwrap();
        let err = client.complete("anything").await.unwrap_err();
        assert!(matches!(err, CompletionError::MissingApiKey));
        mock.assert_async().await;
    }
}

#[cfg(test)]
pub(crate) mod stub {
    use super::{CompletionError, CompletionService};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies in order and records every prompt it receives.
    #[derive(Default)]
    pub(crate) struct StubCompletion {
        replies: Mutex<VecDeque<Result<String, CompletionError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl StubCompletion {
        pub(crate) fn replying(replies: &[&str]) -> Self {
            let stub = StubCompletion::default();
            for reply in replies {
                stub.push(Ok(reply.to_string()));
            }
            stub
        }

        pub(crate) fn push(&self, reply: Result<String, CompletionError>) {
            self.replies.lock().unwrap().push_back(reply);
        }

        pub(crate) fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionService for StubCompletion {
        async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(CompletionError::Malformed("no reply queued".to_string())))
        }
    }
}
