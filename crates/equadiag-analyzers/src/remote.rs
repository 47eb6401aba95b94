//! Remote analysis service client.
//!
//! The service answers every call with an envelope
//! `{"response": "<fenced json>", "model": "..."}`; the fenced payload is
//! stripped and parsed here.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use equadiag_core::model::{AnalysisResult, Question};
use equadiag_core::traits::{strip_json_fence, SolutionAnalyzer};

use crate::error::ServiceError;

/// Response envelope shared by every service endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceEnvelope {
    pub response: String,
    #[serde(default)]
    pub model: Option<String>,
}

impl ServiceEnvelope {
    /// Strip the markdown fence from `response` and parse what is inside.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, ServiceError> {
        let json = strip_json_fence(&self.response);
        serde_json::from_str(&json)
            .map_err(|e| ServiceError::MalformedResponse(format!("invalid payload JSON: {e}")))
    }
}

/// HTTP client for the analysis backend.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    base_url: String,
    timeout_secs: Option<u64>,
    client: reqwest::Client,
}

impl ServiceClient {
    /// Requests never time out unless `timeout_secs` is set.
    pub fn new(base_url: &str, timeout_secs: Option<u64>) -> Result<Self, ServiceError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ServiceError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON body to `path` and decode the envelope.
    pub async fn post_envelope<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ServiceEnvelope, ServiceError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(e, self.timeout_secs.unwrap_or_default()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::from_status(status, body));
        }

        response
            .json()
            .await
            .map_err(|e| ServiceError::MalformedResponse(format!("invalid envelope: {e}")))
    }
}

/// Analyzer that delegates to the remote analysis service.
pub struct RemoteAnalyzer {
    client: ServiceClient,
}

impl RemoteAnalyzer {
    pub fn new(base_url: &str, timeout_secs: Option<u64>) -> Result<Self, ServiceError> {
        Ok(Self {
            client: ServiceClient::new(base_url, timeout_secs)?,
        })
    }
}

#[async_trait]
impl SolutionAnalyzer for RemoteAnalyzer {
    fn name(&self) -> &str {
        "remote"
    }

    #[instrument(skip(self, question, solution), fields(question = %question.id, base_url = %self.client.base_url()))]
    async fn analyze(&self, question: &Question, solution: &str) -> anyhow::Result<AnalysisResult> {
        let start = Instant::now();

        let mut body = HashMap::new();
        body.insert(question.question.as_str(), solution);

        let envelope = self.client.post_envelope("/api/analysis/", &body).await?;
        let result = parse_analysis_payload(&envelope, &question.question)?;

        tracing::debug!(
            model = envelope.model.as_deref().unwrap_or("unknown"),
            latency_ms = start.elapsed().as_millis() as u64,
            "remote analysis received"
        );
        Ok(result)
    }
}

/// Parse an analysis payload that is either a bare [`AnalysisResult`] or a
/// map from question text to [`AnalysisResult`].
pub fn parse_analysis_payload(
    envelope: &ServiceEnvelope,
    question_text: &str,
) -> Result<AnalysisResult, ServiceError> {
    let value: serde_json::Value = envelope.payload()?;

    if value.get("isCorrect").is_some() {
        return serde_json::from_value(value)
            .map_err(|e| ServiceError::MalformedResponse(format!("invalid analysis: {e}")));
    }

    let mut by_question: HashMap<String, AnalysisResult> = serde_json::from_value(value)
        .map_err(|e| ServiceError::MalformedResponse(format!("invalid analysis map: {e}")))?;

    if let Some(result) = by_question.remove(question_text) {
        return Ok(result);
    }
    if by_question.len() == 1 {
        if let Some(result) = by_question.into_values().next() {
            return Ok(result);
        }
    }
    Err(ServiceError::MalformedResponse(format!(
        "no analysis for question: {question_text}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use equadiag_core::catalog::builtin;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fenced(json: serde_json::Value) -> String {
        format!("```json\n{json}\n```")
    }

    fn envelope(response: String) -> ServiceEnvelope {
        ServiceEnvelope {
            response,
            model: None,
        }
    }

    #[tokio::test]
    async fn successful_analysis() {
        let server = MockServer::start().await;
        let q1 = builtin().question("q1").unwrap();

        let payload = serde_json::json!({
            "isCorrect": true,
            "correctAnswers": ["2"],
            "stepsCorrect": true,
            "errors": [],
            "feedback": "Très bien",
            "strengths": ["Étapes claires"],
            "areasToImprove": []
        });

        Mock::given(method("POST"))
            .and(path("/api/analysis/"))
            .and(body_json(serde_json::json!({ q1.question.clone(): "x = 2" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": fenced(payload),
                "model": "gemini-2.5-flash"
            })))
            .mount(&server)
            .await;

        let analyzer = RemoteAnalyzer::new(&server.uri(), None).unwrap();
        let result = analyzer.analyze(q1, "x = 2").await.unwrap();
        assert!(result.is_correct);
        assert_eq!(result.feedback, "Très bien");
        assert_eq!(result.strengths, vec!["Étapes claires"]);
    }

    #[tokio::test]
    async fn keyed_payload_is_unwrapped() {
        let server = MockServer::start().await;
        let q2 = builtin().question("q2").unwrap();

        let payload = serde_json::json!({
            q2.question.clone(): { "isCorrect": false, "feedback": "Revois la division" }
        });

        Mock::given(method("POST"))
            .and(path("/api/analysis/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "response": fenced(payload) })),
            )
            .mount(&server)
            .await;

        let analyzer = RemoteAnalyzer::new(&server.uri(), Some(5)).unwrap();
        let result = analyzer.analyze(q2, "x = 10").await.unwrap();
        assert!(!result.is_correct);
        assert_eq!(result.feedback, "Revois la division");
    }

    #[tokio::test]
    async fn server_error_surfaces_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/analysis/"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({ "error": "Gemini Client failed to initialize." })),
            )
            .mount(&server)
            .await;

        let analyzer = RemoteAnalyzer::new(&server.uri(), None).unwrap();
        let err = analyzer
            .analyze(builtin().question("q1").unwrap(), "x = 2")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("Gemini Client failed"));
    }

    #[tokio::test]
    async fn malformed_fenced_json_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/analysis/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "response": "```json\n{not json\n```" })),
            )
            .mount(&server)
            .await;

        let analyzer = RemoteAnalyzer::new(&server.uri(), None).unwrap();
        let err = analyzer
            .analyze(builtin().question("q1").unwrap(), "x = 2")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("malformed response"));
    }

    #[tokio::test]
    async fn unreachable_service_is_a_network_error() {
        let analyzer = RemoteAnalyzer::new("http://127.0.0.1:1", None).unwrap();
        let err = analyzer
            .analyze(builtin().question("q1").unwrap(), "x = 2")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ServiceError>(),
            Some(ServiceError::NetworkError(_))
        ));
    }

    #[test]
    fn keyed_payload_for_other_question_is_rejected() {
        let payload = serde_json::json!({
            "a": { "isCorrect": true },
            "b": { "isCorrect": false }
        });
        let err = parse_analysis_payload(&envelope(fenced(payload)), "c").unwrap_err();
        assert!(err.to_string().contains("no analysis for question"));
    }

    #[test]
    fn unfenced_payload_is_accepted() {
        let result =
            parse_analysis_payload(&envelope(r#"{"isCorrect": true}"#.into()), "q").unwrap();
        assert!(result.is_correct);
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = ServiceClient::new("http://localhost:5000/", None).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
    }
}
