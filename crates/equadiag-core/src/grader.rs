//! Heuristic grading of free-text solutions.
//!
//! Each question archetype has its own [`QuestionGrader`]. [`HeuristicGrader`]
//! picks one from [`Question::kind`] and applies the shared configuration.

use std::sync::LazyLock;

use regex::Regex;

use crate::extract::{extract_candidates, numeric_tokens, parse_numeric, Candidate, FractionPolicy};
use crate::model::{
    AnalysisResult, ErrorKind, Improvement, Question, QuestionKind, StepError, Strength,
};

/// Absolute tolerance when comparing a candidate with an expected answer.
pub const ANSWER_TOLERANCE: f64 = 0.01;

/// Wider tolerance for product-equation roots, whose literal fractions often fail to parse.
pub const ROOT_TOLERANCE: f64 = 0.1;

const CONNECTIVES: &[&str] = &["soit", "donc", "alors"];

static ALGEBRAIC_TERM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\dx").unwrap());

static PRODUCT_MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)produit|facteur|nul").unwrap());

static DISJUNCTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bou\b").unwrap());

/// Grades one solution against one question.
pub trait QuestionGrader: Send + Sync {
    fn grade(&self, question: &Question, solution: &str) -> AnalysisResult;
}

/// Grader settings shared by every archetype.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraderConfig {
    /// How learner candidates are parsed before comparison.
    pub fraction_policy: FractionPolicy,
}

/// Dispatches to the grader matching the question's archetype.
#[derive(Debug, Clone, Default)]
pub struct HeuristicGrader {
    linear: LinearGrader,
    product: ProductGrader,
}

impl HeuristicGrader {
    pub fn new(config: GraderConfig) -> Self {
        Self {
            linear: LinearGrader { config },
            product: ProductGrader { config },
        }
    }

    fn grader_for(&self, kind: QuestionKind) -> &dyn QuestionGrader {
        match kind {
            QuestionKind::Linear => &self.linear,
            QuestionKind::Product => &self.product,
        }
    }
}

impl QuestionGrader for HeuristicGrader {
    fn grade(&self, question: &Question, solution: &str) -> AnalysisResult {
        let kind = question.kind();
        let result = self.grader_for(kind).grade(question, solution);
        tracing::debug!(
            question = %question.id,
            %kind,
            correct = result.is_correct,
            errors = result.errors.len(),
            "graded solution"
        );
        result
    }
}

/// True when any expected answer is within [`ANSWER_TOLERANCE`] of any candidate.
///
/// Both sides are parsed under `policy`; strings that fail to parse never match.
pub fn answers_match(expected: &[String], candidates: &[Candidate], policy: FractionPolicy) -> bool {
    let candidates = candidate_values(candidates, policy);
    expected
        .iter()
        .filter_map(|e| parse_numeric(e, policy))
        .any(|e| within(&candidates, e, ANSWER_TOLERANCE))
}

fn candidate_values(candidates: &[Candidate], policy: FractionPolicy) -> Vec<f64> {
    candidates
        .iter()
        .filter_map(|c| parse_numeric(c.as_str(), policy))
        .collect()
}

fn within(values: &[f64], target: f64, tolerance: f64) -> bool {
    values.iter().any(|v| (v - target).abs() < tolerance)
}

/// Presentation signals that count as strengths, independent of correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolutionSignals {
    /// Contains an `=` and spans more than two lines.
    pub has_steps: bool,
    /// Uses a reasoning connective ("soit", "donc", "alors").
    pub has_explanation: bool,
    /// Has a digit immediately followed by `x`.
    pub shows_algebra: bool,
}

impl SolutionSignals {
    pub fn detect(solution: &str) -> Self {
        let lower = solution.to_lowercase();
        Self {
            has_steps: solution.contains('=') && solution.split('\n').count() > 2,
            has_explanation: CONNECTIVES.iter().any(|w| lower.contains(w)),
            shows_algebra: ALGEBRAIC_TERM_RE.is_match(&lower),
        }
    }

    pub fn strengths(&self) -> Vec<Strength> {
        let mut strengths = Vec::new();
        if self.has_steps {
            strengths.push(Strength::ClearSteps);
        }
        if self.has_explanation {
            strengths.push(Strength::NaturalLanguageExplanation);
        }
        if self.shows_algebra {
            strengths.push(Strength::AlgebraicReasoning);
        }
        strengths
    }
}

/// Grader for single-answer linear equations.
///
/// On a wrong answer the first matching error pattern wins.
#[derive(Debug, Clone, Default)]
pub struct LinearGrader {
    config: GraderConfig,
}

impl LinearGrader {
    pub fn new(config: GraderConfig) -> Self {
        Self { config }
    }
}

impl QuestionGrader for LinearGrader {
    fn grade(&self, question: &Question, solution: &str) -> AnalysisResult {
        let expected = question.expected_answers();
        let candidates = extract_candidates(solution);
        let is_correct = answers_match(&expected, &candidates, self.config.fraction_policy);
        let signals = SolutionSignals::detect(solution);

        let mut errors = Vec::new();
        let mut areas_to_improve = Vec::new();
        let first_expected = expected.first().map(String::as_str).unwrap_or_default();

        if !is_correct {
            let (kind, step, improvement) =
                classify_linear_error(solution, first_expected, self.config.fraction_policy);
            errors.push(StepError {
                step,
                issue: kind.issue(),
                correction: linear_correction(kind, first_expected),
                kind: Some(kind),
            });
            areas_to_improve.push(improvement.message().to_string());
        }

        if !signals.has_steps {
            areas_to_improve.push(Improvement::ShowIntermediateSteps.message().to_string());
        }

        AnalysisResult {
            is_correct,
            correct_answers: expected,
            steps_correct: signals.has_steps && is_correct,
            errors,
            feedback: if is_correct {
                "Excellente solution ! Le résultat est correct.".into()
            } else {
                "La solution nécessite quelques corrections. Vérifie les étapes ci-dessous.".into()
            },
            strengths: signals
                .strengths()
                .iter()
                .map(|s| s.message().to_string())
                .collect(),
            areas_to_improve,
        }
    }
}

/// Classify a wrong linear answer from the last number written in the solution.
fn classify_linear_error(
    solution: &str,
    expected: &str,
    policy: FractionPolicy,
) -> (ErrorKind, String, Improvement) {
    let Some(user_answer) = numeric_tokens(solution).last().copied() else {
        return (
            ErrorKind::Illegible,
            "Solution complète".into(),
            Improvement::WriteFinalAnswer,
        );
    };

    let step = format!("x = {user_answer}");
    let user = parse_numeric(user_answer, FractionPolicy::Strict);
    let target = parse_numeric(expected, policy);

    match (user, target) {
        (Some(u), Some(e)) if (u - e * 2.0).abs() < ANSWER_TOLERANCE => {
            (ErrorKind::ForgotToDivide, step, Improvement::DivideByCoefficient)
        }
        (Some(u), Some(e)) if (u + e).abs() < ANSWER_TOLERANCE => {
            (ErrorKind::SignError, step, Improvement::SignRules)
        }
        _ => (ErrorKind::WrongResult, step, Improvement::CheckEachStep),
    }
}

fn linear_correction(kind: ErrorKind, expected: &str) -> String {
    match kind {
        ErrorKind::ForgotToDivide => format!(
            "Il faut diviser par le coefficient de x. La bonne réponse est x = {expected}"
        ),
        ErrorKind::SignError => format!(
            "Attention au signe lors des opérations. La bonne réponse est x = {expected}"
        ),
        ErrorKind::Illegible => {
            format!("Essayez d'isoler x étape par étape. La réponse est x = {expected}")
        }
        _ => format!("Vérifiez vos calculs. La bonne réponse est x = {expected}"),
    }
}

/// Grader for product equations such as `(4x + 6)(3 - 7x) = 0`.
///
/// Every root must be found; all applicable errors accumulate.
#[derive(Debug, Clone, Default)]
pub struct ProductGrader {
    config: GraderConfig,
}

impl ProductGrader {
    pub fn new(config: GraderConfig) -> Self {
        Self { config }
    }
}

impl QuestionGrader for ProductGrader {
    fn grade(&self, question: &Question, solution: &str) -> AnalysisResult {
        let expected = question.expected_answers();
        // Roots are catalog data, so their fractions are always evaluated.
        let roots: Vec<(usize, f64, &str)> = expected
            .iter()
            .enumerate()
            .filter_map(|(i, e)| {
                let root = parse_numeric(e, FractionPolicy::Evaluate);
                if root.is_none() {
                    tracing::warn!(question = %question.id, "unparseable root: {e}");
                }
                root.map(|r| (i, r, e.as_str()))
            })
            .collect();
        let factors = question.factors();
        let candidates = extract_candidates(solution);
        let values = candidate_values(&candidates, self.config.fraction_policy);

        let mentions_product = PRODUCT_MENTION_RE.is_match(solution);
        // Raw count, so "x = -3/2" counts twice (literal and evaluated).
        let has_all_solutions = candidates.len() >= roots.len();
        let has_disjunction = DISJUNCTION_RE.is_match(solution);

        let mut strengths = Vec::new();
        let mut errors = Vec::new();
        let mut areas_to_improve = Vec::new();

        if mentions_product {
            strengths.push(Strength::ProductFormRecognized);
        }
        if has_disjunction || has_all_solutions {
            strengths.push(Strength::MultipleSolutionsUnderstood);
        }

        if !mentions_product {
            errors.push(product_error(
                ErrorKind::ProductFormNotRecognized,
                "Début de résolution".into(),
                "Si un produit de facteurs est nul, alors l'un au moins des facteurs est nul"
                    .into(),
            ));
            areas_to_improve.push(Improvement::RecognizeProductEquations);
        }

        if !has_all_solutions {
            let listed = expected
                .iter()
                .map(|e| format!("x = {e}"))
                .collect::<Vec<_>>()
                .join(" et ");
            errors.push(product_error(
                ErrorKind::SingleRootOnly,
                "Solutions".into(),
                format!("Cette équation a {} solutions : {listed}", roots.len()),
            ));
            areas_to_improve.push(Improvement::FindAllSolutions);
        }

        let mut found_all = !roots.is_empty();
        for &(index, root, literal) in &roots {
            if within(&values, root, ROOT_TOLERANCE) {
                continue;
            }
            found_all = false;
            let (step, correction) = match factors.get(index) {
                Some(factor) => (
                    format!("{factor} = 0"),
                    format!("De {factor} = 0, on obtient x = {literal}"),
                ),
                None => (
                    format!("Solution {}", index + 1),
                    format!("Une des solutions est x = {literal}"),
                ),
            };
            errors.push(product_error(
                ErrorKind::RootMissing { ordinal: index + 1 },
                step,
                correction,
            ));
        }

        let is_correct = found_all;

        AnalysisResult {
            is_correct,
            correct_answers: expected,
            steps_correct: is_correct && mentions_product,
            errors,
            feedback: if is_correct {
                "Parfait ! Les deux solutions ont été trouvées.".into()
            } else {
                "Cette équation produit nécessite de trouver toutes ses solutions.".into()
            },
            strengths: strengths.iter().map(|s| s.message().to_string()).collect(),
            areas_to_improve: areas_to_improve
                .iter()
                .map(|i| i.message().to_string())
                .collect(),
        }
    }
}

fn product_error(kind: ErrorKind, step: String, correction: String) -> StepError {
    StepError {
        step,
        issue: kind.issue(),
        correction,
        kind: Some(kind),
    }
}
