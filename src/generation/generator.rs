//! Text-generation boundary and the Ollama HTTP implementation

use crate::config::LlmConfig;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generator unavailable: {0}")]
    Unavailable(String),

    #[error("Cannot reach generator: {0}")]
    Unreachable(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Generator returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Generator returned an empty response")]
    EmptyResponse,

    #[error("Generation timed out after {0:?}")]
    TimedOut(Duration),
}

/// A text-generation model.
///
/// Each call is independent: implementations keep no memory of earlier
/// prompts. Calls may block for a long time.
pub trait AnswerGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    fn model_name(&self) -> &str;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Generator backed by a local Ollama server
pub struct OllamaGenerator {
    client: Client,
    url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl OllamaGenerator {
    pub fn new(config: &LlmConfig) -> Result<Self, GenerationError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Unavailable(format!("HTTP client: {}", e)))?;

        tracing::info!(
            "Using Ollama generator {} at {}",
            config.model,
            config.endpoint
        );

        Ok(Self {
            client,
            url: format!("{}/api/generate", config.endpoint.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout,
        })
    }
}

impl AnswerGenerator for OllamaGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::TimedOut(self.timeout)
                } else if e.is_connect() {
                    GenerationError::Unreachable(format!("{}: {}", self.url, e))
                } else {
                    GenerationError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| GenerationError::Request(format!("invalid response body: {}", e)))?;

        let answer = parsed.response.trim().to_string();
        if answer.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(answer)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: &str) -> LlmConfig {
        LlmConfig {
            endpoint: endpoint.to_string(),
            timeout_secs: 1,
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_url_normalized() {
        let generator = OllamaGenerator::new(&config("http://localhost:11434/")).unwrap();
        assert_eq!(generator.url, "http://localhost:11434/api/generate");
        assert_eq!(generator.model_name(), LlmConfig::default().model);
    }

    #[test]
    fn test_request_body_shape() {
        let request = GenerateRequest {
            model: "qwen2.5:0.5b",
            prompt: "Q?",
            stream: false,
            options: GenerateOptions {
                temperature: 0.0,
                num_predict: 256,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 256);
    }

    #[test]
    fn test_unreachable_server_is_an_error() {
        // Port 9 (discard) is closed on test machines
        let generator = OllamaGenerator::new(&config("http://127.0.0.1:9")).unwrap();
        let err = generator.generate("hello").unwrap_err();
        assert!(!matches!(err, GenerationError::Unavailable(_)));

        let err = crate::error::DocQaError::from(err);
        assert_eq!(err.kind(), crate::error::ErrorKind::GenerationFailed);
    }
}
