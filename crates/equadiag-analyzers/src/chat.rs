//! OpenAI-compatible chat-completion analyzer.

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use equadiag_core::model::{AnalysisResult, Question};
use equadiag_core::traits::{
    build_analysis_prompt, strip_json_fence, SolutionAnalyzer, ANALYSIS_SYSTEM_PROMPT,
};

use crate::error::ServiceError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const MAX_TOKENS: u32 = 2048;

/// Asks a chat model to analyze the solution and parses its JSON reply.
pub struct ChatAnalyzer {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl ChatAnalyzer {
    pub fn new(api_key: &str, base_url: Option<String>, model: &str) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ServiceError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: model.to_string(),
            client,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[async_trait]
impl SolutionAnalyzer for ChatAnalyzer {
    fn name(&self) -> &str {
        "chat"
    }

    #[instrument(skip(self, question, solution), fields(question = %question.id, model = %self.model))]
    async fn analyze(&self, question: &Question, solution: &str) -> anyhow::Result<AnalysisResult> {
        let start = Instant::now();

        let body = ChatRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: ANALYSIS_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_analysis_prompt(question, solution),
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(e, DEFAULT_TIMEOUT_SECS))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::from_status(status, body).into());
        }

        let api_response: ChatResponse = response.json().await.map_err(|e| {
            ServiceError::MalformedResponse(format!("failed to parse response: {e}"))
        })?;

        let content = api_response
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| ServiceError::MalformedResponse("no choices in response".into()))?;

        let result: AnalysisResult = serde_json::from_str(&strip_json_fence(content))
            .map_err(|e| ServiceError::MalformedResponse(format!("invalid analysis JSON: {e}")))?;

        tracing::debug!(
            model = api_response.model.as_deref().unwrap_or(&self.model),
            latency_ms = start.elapsed().as_millis() as u64,
            correct = result.is_correct,
            "chat analysis received"
        );
        Ok(result)
    }
}
