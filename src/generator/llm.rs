use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::GeneratorError;
use crate::generator::{CandidateQuestion, GenerateRequest, QuestionGenerator};

/// Question generator backed by a local LLM server
#[derive(Debug)]
pub struct LlmGenerator {
    /// Base URL of the LLM API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Model name to generate with
    model: String,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
    /// Sampling temperature for generation
    temperature: f32,
}

/// Completion request for the LLM API
#[derive(Debug, Serialize, Deserialize)]
struct CompletionRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Format to return a response in
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<CompletionOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Generation options for the LLM API
#[derive(Debug, Serialize, Deserialize)]
struct CompletionOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Random seed for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Completion response from the LLM API
#[derive(Debug, Serialize, Deserialize)]
struct CompletionResponse {
    /// Model name
    #[serde(default)]
    model: String,
    /// Generated text
    response: String,
    /// Whether the generation is complete
    #[serde(default)]
    done: bool,
}

impl LlmGenerator {
    /// Create a new generator client for the given host and port
    pub fn new(host: impl Into<String>, port: u16, model: impl Into<String>) -> Self {
        Self::new_with_config(host, port, model, 3, 1000, 0.7)
    }

    /// Create a new generator client with retry configuration
    pub fn new_with_config(
        host: impl Into<String>,
        port: u16,
        model: impl Into<String>,
        max_retries: u32,
        backoff_base_ms: u64,
        temperature: f32,
    ) -> Self {
        let host = host.into();

        // Construct a proper URL with scheme and port
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            let url_parts: Vec<&str> = host.split("://").collect();
            if url_parts.len() == 2 {
                let scheme = url_parts[0];
                let host_part = url_parts[1];

                // Check if host_part already contains a port
                if host_part.contains(':') {
                    host
                } else {
                    format!("{}://{}:{}", scheme, host_part, port)
                }
            } else {
                // Malformed URL, fallback to safe default
                format!("http://localhost:{}", port)
            }
        } else {
            // No scheme, add http:// and port
            format!("http://{}:{}", host, port)
        };

        Self {
            base_url,
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
            model: model.into(),
            max_retries,
            backoff_base_ms,
            temperature,
        }
    }

    /// Create a new generator client from a complete URL
    pub fn from_url(url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: url.into(),
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
            model: model.into(),
            max_retries: 3,
            backoff_base_ms: 1000,
            temperature: 0.7,
        }
    }

    /// Build the system prompt describing the expected JSON output
    fn build_system_prompt(request: &GenerateRequest) -> String {
        let mut system = String::from(
            "You write multiple-choice quiz questions for an email course. \
             Respond with a JSON array only. Each element must have the fields: \
             \"question\" (string), \"options\" (array of 2 to 6 strings), \
             \"correct_index\" (integer), \"type\" (\"application\" or \"critical-thinking\"), \
             \"difficulty\" (\"easy\", \"medium\" or \"hard\"). \
             Questions must make the learner apply or reason about the lesson, \
             never repeat a stated fact.",
        );

        system.push_str(&format!(
            " Write every question and every option in the lesson's language ({}).",
            request.language_tag
        ));

        system
    }

    /// Build the user prompt carrying the lesson context
    fn build_prompt(request: &GenerateRequest) -> String {
        let mut prompt = format!(
            "Lesson (day {}): {}\n\n{}\n\nWrite {} new quiz question(s).",
            request.day_number, request.lesson_title, request.lesson_content, request.count
        );

        if let Some(preferred) = request.preferred_type {
            prompt.push_str(&format!(" Prefer the \"{}\" type.", preferred));
        }

        if !request.existing_questions.is_empty() {
            prompt.push_str("\n\nDo not repeat or rephrase any of these existing questions:\n");
            for text in &request.existing_questions {
                prompt.push_str(&format!("- {}\n", text));
            }
        }

        prompt
    }

    /// Post a completion request with retry logic
    async fn post_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, GeneratorError> {
        let url = format!("{}/api/generate", self.base_url);

        let mut attempt = 0;
        let mut last_error: Option<GeneratorError> = None;

        while attempt <= self.max_retries {
            let response_result = self.client.post(&url).json(request).send().await;

            match response_result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let payload =
                            response.json::<CompletionResponse>().await.map_err(|e| {
                                GeneratorError::ParseError(format!(
                                    "Failed to decode completion response: {}",
                                    e
                                ))
                            })?;
                        return Ok(payload);
                    } else if status.is_server_error() {
                        // Server error - can retry
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Failed to get error response text".to_string());
                        error!(
                            "Generator API error ({}): {} - attempt {}/{}",
                            status,
                            error_text,
                            attempt + 1,
                            self.max_retries + 1
                        );
                        last_error = Some(GeneratorError::ApiError {
                            status_code: status.as_u16(),
                            message: error_text,
                        });
                    } else {
                        // Client error - don't retry
                        let status_code = status.as_u16();
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Failed to get error response text".to_string());
                        error!("Generator API error ({}): {}", status, error_text);
                        return Err(match status_code {
                            401 | 403 => GeneratorError::AuthenticationError(error_text),
                            429 => GeneratorError::RateLimitExceeded(error_text),
                            _ => GeneratorError::ApiError {
                                status_code,
                                message: error_text,
                            },
                        });
                    }
                }
                Err(e) => {
                    // Network error - can retry
                    last_error = Some(GeneratorError::ConnectionError(format!(
                        "Failed to send request to generator API: {}",
                        e
                    )));
                    error!(
                        "Generator network error: {} - attempt {}/{}",
                        e,
                        attempt + 1,
                        self.max_retries + 1
                    );
                }
            }

            attempt += 1;

            // If we have more retries left, wait with exponential backoff
            if attempt <= self.max_retries {
                let backoff_ms = self.backoff_base_ms * (1u64 << (attempt - 1));
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }

        // If we get here, all retries failed
        Err(last_error.unwrap_or_else(|| {
            GeneratorError::RequestFailed(format!(
                "Generation request failed after {} attempts",
                self.max_retries + 1
            ))
        }))
    }

    /// Parse the model output into candidate questions
    ///
    /// Models wrap the payload in code fences or prose more often than not,
    /// so this takes the outermost JSON array it can find and keeps every
    /// element that decodes. Elements that do not decode are dropped rather
    /// than failing the batch.
    fn parse_candidates(raw: &str) -> Result<Vec<CandidateQuestion>, GeneratorError> {
        let start = raw.find('[');
        let end = raw.rfind(']');

        let array_text = match (start, end) {
            (Some(start), Some(end)) if start < end => &raw[start..=end],
            _ => {
                return Err(GeneratorError::ParseError(format!(
                    "No JSON array in generator output (first 200 chars): {}",
                    raw.chars().take(200).collect::<String>()
                )));
            }
        };

        let values: Vec<serde_json::Value> = serde_json::from_str(array_text).map_err(|e| {
            GeneratorError::ParseError(format!("Generator output is not a JSON array: {}", e))
        })?;

        let total = values.len();
        let candidates: Vec<CandidateQuestion> = values
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value.clone()) {
                Ok(candidate) => Some(candidate),
                Err(e) => {
                    debug!("Dropping malformed candidate ({}): {}", e, value);
                    None
                }
            })
            .collect();

        if candidates.is_empty() {
            return Err(GeneratorError::ParseError(format!(
                "None of {} generated element(s) had the expected fields",
                total
            )));
        }

        Ok(candidates)
    }
}

#[async_trait]
impl QuestionGenerator for LlmGenerator {
    async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<Vec<CandidateQuestion>, GeneratorError> {
        debug!(
            "Requesting {} candidate(s) for lesson {} (day {})",
            request.count, request.lesson_id, request.day_number
        );

        let completion = CompletionRequest {
            model: self.model.clone(),
            prompt: Self::build_prompt(request),
            system: Some(Self::build_system_prompt(request)),
            format: Some("json".to_string()),
            options: Some(CompletionOptions {
                temperature: Some(self.temperature),
                seed: request.seed,
                num_predict: None,
            }),
            stream: Some(false),
        };

        let response = self.post_completion(&completion).await?;
        Self::parse_candidates(&response.response)
    }

    async fn test_connection(&self) -> Result<(), GeneratorError> {
        let url = format!("{}/api/version", self.base_url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            GeneratorError::ConnectionError(format!("Failed to reach generator API: {}", e))
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(GeneratorError::ApiError {
                status_code: status.as_u16(),
                message: format!("Version check failed with status {}", status),
            })
        }
    }

    fn name(&self) -> &str {
        "llm"
    }
}
