//! Question sources: the static catalog and the remote question generator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use equadiag_core::model::Question;
use equadiag_core::traits::QuestionSource;

use crate::error::ServiceError;
use crate::remote::ServiceClient;

/// Serves a fixed list of questions, filtered by theme.
#[derive(Debug, Clone)]
pub struct StaticQuestionSource {
    questions: Vec<Question>,
}

impl StaticQuestionSource {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }
}

#[async_trait]
impl QuestionSource for StaticQuestionSource {
    fn name(&self) -> &str {
        "catalog"
    }

    /// An empty theme returns every question; otherwise questions whose skill,
    /// context or prompt mention the theme (case-insensitive).
    async fn questions(&self, theme: &str) -> anyhow::Result<Vec<Question>> {
        let theme = theme.trim().to_lowercase();
        if theme.is_empty() {
            return Ok(self.questions.clone());
        }
        Ok(self
            .questions
            .iter()
            .filter(|q| {
                q.skill.to_lowercase().contains(&theme)
                    || q.question.to_lowercase().contains(&theme)
                    || q
                        .context
                        .as_deref()
                        .is_some_and(|c| c.to_lowercase().contains(&theme))
            })
            .cloned()
            .collect())
    }
}

#[derive(Serialize)]
struct ThemeRequest<'a> {
    theme: &'a str,
}

#[derive(Deserialize)]
struct QuestionsPayload {
    questions: Vec<Question>,
}

/// Fetches generated questions from the remote service.
pub struct RemoteQuestionSource {
    client: ServiceClient,
}

impl RemoteQuestionSource {
    pub fn new(base_url: &str, timeout_secs: Option<u64>) -> Result<Self, ServiceError> {
        Ok(Self {
            client: ServiceClient::new(base_url, timeout_secs)?,
        })
    }
}

#[async_trait]
impl QuestionSource for RemoteQuestionSource {
    fn name(&self) -> &str {
        "remote"
    }

    #[instrument(skip(self), fields(base_url = %self.client.base_url()))]
    async fn questions(&self, theme: &str) -> anyhow::Result<Vec<Question>> {
        let envelope = self
            .client
            .post_envelope("/api/questions/", &ThemeRequest { theme })
            .await?;
        let payload: QuestionsPayload = envelope.payload()?;

        tracing::info!(
            count = payload.questions.len(),
            model = envelope.model.as_deref().unwrap_or("unknown"),
            "fetched generated questions"
        );
        Ok(payload.questions)
    }
}
