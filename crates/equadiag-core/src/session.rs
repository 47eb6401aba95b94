//! Quiz session orchestrator.
//!
//! Walks a learner through a list of questions, sends each solution to a
//! [`SolutionAnalyzer`], and turns the recorded answers into a diagnostic and
//! a remediation plan.

use std::sync::Arc;
use std::time::Instant;

use crate::error::SessionError;
use crate::model::{Answer, Question};
use crate::remediation::{
    analyze_answers, generate_remediation_plan, DiagnosticResult, RemediationPlan, ResourceTable,
};
use crate::traits::SolutionAnalyzer;

/// One learner's pass through a quiz.
pub struct QuizSession {
    questions: Vec<Question>,
    answers: Vec<Answer>,
    analyzer: Arc<dyn SolutionAnalyzer>,
}

impl QuizSession {
    pub fn new(questions: Vec<Question>, analyzer: Arc<dyn SolutionAnalyzer>) -> Self {
        Self {
            questions,
            answers: Vec::new(),
            analyzer,
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn analyzer_name(&self) -> &str {
        self.analyzer.name()
    }

    /// First question without an answer, in quiz order.
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.iter().find(|q| !self.is_answered(&q.id))
    }

    pub fn is_complete(&self) -> bool {
        self.current_question().is_none()
    }

    /// `(answered, total)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.answers.len(), self.questions.len())
    }

    /// Answer the current question.
    pub async fn submit(&mut self, solution: &str) -> Result<&Answer, SessionError> {
        let id = match self.current_question() {
            Some(q) => q.id.clone(),
            None => return Err(SessionError::AlreadyComplete),
        };
        self.submit_for(&id, solution).await
    }

    /// Answer a question by id, replacing any earlier answer to it.
    ///
    /// An analyzer failure does not abort the quiz: the answer is recorded as
    /// incorrect with no analysis.
    pub async fn submit_for(
        &mut self,
        question_id: &str,
        solution: &str,
    ) -> Result<&Answer, SessionError> {
        let question = self
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| SessionError::UnknownQuestion(question_id.to_string()))?;

        if solution.trim().is_empty() {
            return Err(SessionError::EmptySolution(question_id.to_string()));
        }

        let start = Instant::now();
        let answer = match self.analyzer.analyze(question, solution).await {
            Ok(analysis) => {
                tracing::info!(
                    question = %question.id,
                    analyzer = self.analyzer.name(),
                    correct = analysis.is_correct,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "answer analyzed"
                );
                Answer {
                    question_id: question.id.clone(),
                    solution_text: solution.to_string(),
                    is_correct: analysis.is_correct,
                    analysis: Some(analysis),
                }
            }
            Err(e) => {
                tracing::warn!(
                    question = %question.id,
                    analyzer = self.analyzer.name(),
                    "analysis failed, recording answer as incorrect: {e:#}"
                );
                Answer {
                    question_id: question.id.clone(),
                    solution_text: solution.to_string(),
                    is_correct: false,
                    analysis: None,
                }
            }
        };

        self.answers.retain(|a| a.question_id != question_id);
        let index = self.answers.len();
        self.answers.push(answer);
        Ok(&self.answers[index])
    }

    /// Aggregate the answers so far and plan remediation for the weak skills.
    pub fn finish(&self, resources: &ResourceTable) -> (DiagnosticResult, RemediationPlan) {
        let diagnostic = analyze_answers(&self.questions, &self.answers);
        let plan = generate_remediation_plan(resources, &diagnostic.skills_to_improve);
        (diagnostic, plan)
    }

    fn is_answered(&self, question_id: &str) -> bool {
        self.answers.iter().any(|a| a.question_id == question_id)
    }
}
