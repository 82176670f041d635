//! Explanation generation
//!
//! The Solver already owns the answer; an `Explainer` only phrases the
//! reasoning behind it. Providers:
//! - OpenAI-compatible chat completions (`LlmExplainer`)
//! - Deterministic template (`MockExplainer`)

use super::classifier::ProblemCategory;
use crate::config::{ExplainerConfig, ExplainerProvider};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything an explainer gets to see for one turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationRequest {
    /// The user's question, verbatim
    pub question: String,

    /// Category the classifier chose
    pub category: ProblemCategory,

    /// Text of the computed result or diagnostic
    pub computed_result: String,

    /// Recent turns, one per line, oldest first
    pub context: String,
}

/// Trait for explanation generation
#[async_trait]
pub trait Explainer: Send + Sync {
    /// Produce an explanation for an already computed answer
    async fn explain(&self, request: &ExplanationRequest) -> Result<String>;

    /// Provider name, for readiness reporting
    fn provider(&self) -> &str;
}

/// OpenAI-compatible chat completions client
pub struct LlmExplainer {
    config: ExplainerConfig,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

const SYSTEM_PROMPT: &str = "You are an expert math tutor for secondary school students. \
    You explain worked solutions step by step in plain language.";

impl LlmExplainer {
    /// Create a new client; fails without an API key
    pub fn new(config: ExplainerConfig) -> Result<Self> {
        let api_key = config
            .api_key()
            .ok_or_else(|| AppError::Configuration {
                message: "explainer.api_key is required for the openai provider".to_string(),
            })?
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    /// Build the user prompt for one request
    fn build_prompt(&self, request: &ExplanationRequest) -> String {
        let context = if request.context.is_empty() {
            "(no earlier messages)"
        } else {
            request.context.as_str()
        };

        format!(
            "Recent conversation:\n{}\n---\n\
            Rules:\n\
            - The answer below was computed exactly. Explain how to reach it; do not recompute or change it.\n\
            - If the question is a follow-up such as \"I don't understand\", explain the previous answer in a new way.\n\
            - Give every step once, with the reason for it.\n\
            - Write polynomials highest power first and fractions in lowest terms.\n\
            {}\n\n\
            Question: {}\n\
            Computed answer: {}\n\n\
            Explanation:",
            context,
            method_hint(request.category),
            request.question,
            request.computed_result
        )
    }

    async fn call_llm(&self, prompt: String) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::ExplanationTimeout {
                        timeout_ms: self.config.timeout().as_millis() as u64,
                    }
                } else {
                    AppError::ExplanationError {
                        message: format!("Request failed: {}", e),
                    }
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExplanationError {
                message: format!("API error {}: {}", status, body),
            });
        }

        let chat_response: ChatResponse =
            response.json().await.map_err(|e| AppError::ExplanationError {
                message: format!("Failed to parse response: {}", e),
            })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| AppError::ExplanationError {
                message: "Empty response from model".to_string(),
            })
    }
}

#[async_trait]
impl Explainer for LlmExplainer {
    async fn explain(&self, request: &ExplanationRequest) -> Result<String> {
        let prompt = self.build_prompt(request);
        self.call_llm(prompt).await
    }

    fn provider(&self) -> &str {
        ExplainerProvider::OpenAi.as_str()
    }
}

/// Method-specific guidance for the prompt
fn method_hint(category: ProblemCategory) -> &'static str {
    match category {
        ProblemCategory::Equation => {
            "- Isolate x one inverse operation at a time, and check the solution by substitution."
        }
        ProblemCategory::Factorization => {
            "- Take out any common factor first, then find factor pairs; check by expanding back."
        }
        ProblemCategory::Expansion => {
            "- Multiply every term in one bracket by every term in the other, then collect like terms."
        }
        ProblemCategory::Calculus => "- Apply the power rule term by term; use the quotient rule for fractions.",
        ProblemCategory::Geometry => {
            "- State the formula, substitute the measurements, and keep the units (squared for area, cubed for volume)."
        }
        ProblemCategory::Statistics => {
            "- Show the data in order and say which of mean, median or mode is being found."
        }
        ProblemCategory::Probability => {
            "- Count favourable and total outcomes; multiply for successive events and simplify the fraction."
        }
        ProblemCategory::Sequences => {
            "- Decide whether the sequence is arithmetic or geometric and state the nth term formula."
        }
        ProblemCategory::LinearAlgebra | ProblemCategory::Unknown => {
            "- If no answer could be computed, say so and describe the method the student could use."
        }
    }
}

/// Deterministic explainer for tests and offline development
#[derive(Debug, Clone, Default)]
pub struct MockExplainer;

impl MockExplainer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Explainer for MockExplainer {
    async fn explain(&self, request: &ExplanationRequest) -> Result<String> {
        Ok(format!(
            "This is a {} problem. Working through \"{}\" step by step gives: {}",
            request.category.as_str().replace('_', " "),
            request.question.trim(),
            request.computed_result
        ))
    }

    fn provider(&self) -> &str {
        ExplainerProvider::Mock.as_str()
    }
}

/// Create an explainer from configuration
pub fn create_explainer(config: &ExplainerConfig) -> Result<Arc<dyn Explainer>> {
    match config.provider {
        ExplainerProvider::OpenAi if config.api_key().is_some() => {
            info!(model = %config.model, endpoint = %config.endpoint, "Using LLM explainer");
            Ok(Arc::new(LlmExplainer::new(config.clone())?))
        }
        ExplainerProvider::OpenAi => {
            warn!("No explainer API key configured, falling back to mock explanations");
            Ok(Arc::new(MockExplainer::new()))
        }
        ExplainerProvider::Mock => {
            info!("Using mock explainer");
            Ok(Arc::new(MockExplainer::new()))
        }
    }
}
