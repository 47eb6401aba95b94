//! Trait seams for solution analyzers and question sources.
//!
//! The heuristic engine, the remote analysis service and chat-completion
//! backends all implement [`SolutionAnalyzer`]; they live in the
//! `equadiag-analyzers` crate.

use async_trait::async_trait;

use crate::model::{AnalysisResult, Question};

// ---------------------------------------------------------------------------
// Analyzer traits
// ---------------------------------------------------------------------------

/// Scores a learner's solution to a question.
#[async_trait]
pub trait SolutionAnalyzer: Send + Sync {
    /// Human-readable analyzer name (e.g. "heuristic").
    fn name(&self) -> &str;

    /// Analyze one solution.
    async fn analyze(&self, question: &Question, solution: &str) -> anyhow::Result<AnalysisResult>;
}

/// Produces quiz questions for a theme.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    fn name(&self) -> &str;

    async fn questions(&self, theme: &str) -> anyhow::Result<Vec<Question>>;
}

// ---------------------------------------------------------------------------
// Analysis prompt
// ---------------------------------------------------------------------------

/// System prompt for chat-completion analyzers.
pub const ANALYSIS_SYSTEM_PROMPT: &str = "Tu es un professeur de mathématiques expert.";

/// Build the analysis prompt sent to a chat-completion backend.
///
/// The reply is expected to be an [`AnalysisResult`] as JSON, possibly fenced.
pub fn build_analysis_prompt(question: &Question, solution: &str) -> String {
    let context = question
        .context
        .as_deref()
        .unwrap_or("Équation du premier degré");

    format!(
        r#"Tu es un professeur de mathématiques expert. Analyse la solution suivante d'un élève.

QUESTION:
{prompt}

CONTEXTE:
{context}

COMPÉTENCE ÉVALUÉE:
{skill}

SOLUTION DE L'ÉLÈVE:
{solution}

INSTRUCTIONS D'ANALYSE:
1. Vérifie si la solution finale est correcte (réponse(s) attendue(s): {expected})
2. Analyse chaque étape du raisonnement
3. Identifie les erreurs spécifiques (calcul, signe, méthode, etc.)
4. Note les points forts du raisonnement
5. Suggère des améliorations

RÉPONDS AU FORMAT JSON:
{{
  "isCorrect": boolean,
  "correctAnswers": ["liste", "des", "réponses", "correctes"],
  "stepsCorrect": boolean,
  "errors": [
    {{
      "step": "l'étape erronée",
      "issue": "description du problème",
      "correction": "comment corriger"
    }}
  ],
  "feedback": "commentaire général",
  "strengths": ["points forts"],
  "areasToImprove": ["points à améliorer"]
}}"#,
        prompt = question.question,
        skill = question.skill,
        expected = question.correct_answer,
    )
}

// ---------------------------------------------------------------------------
// Fenced JSON extraction
// ---------------------------------------------------------------------------

/// Extract the JSON body from a markdown-fenced model reply.
///
/// Handles:
/// - A ```json``` block (preferred)
/// - A generic ``` block (if no json-specific block is found)
/// - An unclosed block (truncated reply)
/// - Raw JSON with no fence (returned trimmed)
pub fn strip_json_fence(response: &str) -> String {
    let mut json_block: Option<String> = None;
    let mut generic_block: Option<String> = None;
    let mut in_block = false;
    let mut is_json_block = false;
    let mut current_block = String::new();

    for line in response.lines() {
        let trimmed = line.trim();

        if !in_block && trimmed.starts_with("```") {
            in_block = true;
            let lang = trimmed.trim_start_matches('`').trim().to_lowercase();
            is_json_block = lang == "json";
            current_block.clear();
            continue;
        }

        if in_block && trimmed == "```" {
            in_block = false;
            let block = std::mem::take(&mut current_block);
            if is_json_block {
                json_block.get_or_insert(block);
            } else {
                generic_block.get_or_insert(block);
            }
            continue;
        }

        if in_block {
            if !current_block.is_empty() {
                current_block.push('\n');
            }
            current_block.push_str(line);
        }
    }

    if in_block && !current_block.is_empty() {
        if is_json_block {
            json_block.get_or_insert(current_block);
        } else {
            generic_block.get_or_insert(current_block);
        }
    }

    json_block
        .or(generic_block)
        .unwrap_or_else(|| response.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_service_envelope_fence() {
        let input = "```json\n{\"questions\": []}\n```";
        assert_eq!(strip_json_fence(input), "{\"questions\": []}");
    }

    #[test]
    fn strip_fence_with_surrounding_prose() {
        let input = "Voici l'analyse :\n\n```json\n{\"isCorrect\": true}\n```\n\nBonne continuation !";
        assert_eq!(strip_json_fence(input), "{\"isCorrect\": true}");
    }

    #[test]
    fn raw_json_is_returned_as_is() {
        assert_eq!(strip_json_fence("  {\"a\": 1}\n"), "{\"a\": 1}");
    }

    #[test]
    fn generic_fence_fallback() {
        assert_eq!(strip_json_fence("```\n[1, 2]\n```"), "[1, 2]");
    }

    #[test]
    fn json_fence_preferred_over_generic() {
        let input = "```\nnot this\n```\n```json\n{\"b\": 2}\n```";
        assert_eq!(strip_json_fence(input), "{\"b\": 2}");
    }

    #[test]
    fn truncated_fence_is_captured() {
        let input = "```json\n{\"isCorrect\": false,\n\"errors\": []}";
        assert_eq!(strip_json_fence(input), "{\"isCorrect\": false,\n\"errors\": []}");
    }

    #[test]
    fn prompt_mentions_expected_answers_and_context() {
        let question = Question {
            id: "q1".into(),
            question: "Résous l'équation : 2x + 3 = 7".into(),
            correct_answer: "2".into(),
            skill: "Isolation de variable simple".into(),
            context: None,
            kind: None,
        };
        let prompt = build_analysis_prompt(&question, "x = 2");
        assert!(prompt.contains("réponse(s) attendue(s): 2"));
        assert!(prompt.contains("Équation du premier degré"));
        assert!(prompt.contains("SOLUTION DE L'ÉLÈVE:\nx = 2"));
        assert!(prompt.contains("\"areasToImprove\""));
    }
}
