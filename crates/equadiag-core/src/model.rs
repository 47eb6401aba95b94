//! Core data model types for equadiag.
//!
//! These are the types every other module passes around: catalog questions,
//! learner answers, the analysis attached to an answer, and the learning
//! resources a remediation plan is built from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

/// A diagnostic question from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique identifier (e.g. "q1").
    pub id: String,
    /// The prompt shown to the learner.
    pub question: String,
    /// Expected answer(s), comma-separated when the equation has several roots.
    pub correct_answer: String,
    /// Competency this question evaluates.
    pub skill: String,
    /// Optional description of the equation family.
    #[serde(default)]
    pub context: Option<String>,
    /// Which grading archetype applies. Inferred when absent.
    #[serde(default)]
    pub kind: Option<QuestionKind>,
}

impl Question {
    /// Expected answers, split on commas and trimmed.
    ///
    /// A leading `x =` on an entry is dropped so that generated questions
    /// written as "x = -3" compare like "-3".
    pub fn expected_answers(&self) -> Vec<String> {
        self.correct_answer
            .split(',')
            .map(strip_assignment)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// The grading archetype, inferring it from the prompt when unset.
    pub fn kind(&self) -> QuestionKind {
        self.kind.unwrap_or_else(|| QuestionKind::infer(self))
    }

    /// Factors in the prompt, in order, e.g. `["4x + 6", "3 - 7x"]`.
    ///
    /// A monomial written directly before a parenthesis, as in `x(2x - 4)`,
    /// is a factor of its own.
    pub fn factors(&self) -> Vec<String> {
        let mut found: Vec<(usize, String)> = FACTOR_RE
            .captures_iter(&self.question)
            .filter_map(|c| c.get(1))
            .map(|m| (m.start(), m.as_str().trim().to_string()))
            .collect();
        found.extend(
            MONOMIAL_FACTOR_RE
                .captures_iter(&self.question)
                .filter_map(|c| c.get(1))
                .map(|m| (m.start(), m.as_str().to_string())),
        );
        found.sort_by_key(|(start, _)| *start);
        found.into_iter().map(|(_, factor)| factor).collect()
    }
}

fn strip_assignment(entry: &str) -> &str {
    let entry = entry.trim();
    entry
        .strip_prefix(['x', 'X'])
        .and_then(|rest| rest.trim_start().strip_prefix('='))
        .map(str::trim)
        .unwrap_or(entry)
}

static FACTOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([^()]+)\)").unwrap());

static MONOMIAL_FACTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d*x)\s*\(").unwrap());

static ZERO_RHS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"=\s*0\s*[?.!]*\s*$").unwrap());

/// Grading archetype of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// One unknown, one expected value; first matching error pattern wins.
    #[default]
    Linear,
    /// A product of factors set to zero; one root per factor, all errors accumulate.
    Product,
}

impl QuestionKind {
    /// Infer the archetype from the prompt shape and the expected answers.
    ///
    /// A prompt with at least two factors, a `= 0` right-hand side (trailing
    /// punctuation allowed) and at least two expected answers is a product
    /// equation.
    pub fn infer(question: &Question) -> Self {
        let prompt = question.question.trim();
        let is_product = question.factors().len() >= 2
            && ZERO_RHS_RE.is_match(prompt)
            && question.expected_answers().len() >= 2;
        if is_product {
            QuestionKind::Product
        } else {
            QuestionKind::Linear
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::Linear => write!(f, "linear"),
            QuestionKind::Product => write!(f, "product"),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" => Ok(QuestionKind::Linear),
            "product" => Ok(QuestionKind::Product),
            other => Err(format!("unknown question kind: {other}")),
        }
    }
}

/// A learner's submitted solution to one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    pub solution_text: String,
    pub is_correct: bool,
    /// Absent when the analyzer failed and the answer fell back to incorrect.
    #[serde(default, rename = "llmAnalysis", skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResult>,
}

/// Verdict produced for a single answer.
///
/// Field names follow the remote analysis service's JSON contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub is_correct: bool,
    #[serde(default)]
    pub correct_answers: Vec<String>,
    #[serde(default)]
    pub steps_correct: bool,
    #[serde(default)]
    pub errors: Vec<StepError>,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub areas_to_improve: Vec<String>,
}

/// One faulty step in a solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepError {
    /// Where the error is (e.g. "x = 10" or "4x + 6 = 0").
    pub step: String,
    /// What went wrong.
    pub issue: String,
    /// How to fix it.
    pub correction: String,
    /// Machine-readable category; only the heuristic engine fills this in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

/// Error categories recognised by the heuristic engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ErrorKind {
    /// Answer is twice the expected value.
    ForgotToDivide,
    /// Answer is the negation of the expected value.
    SignError,
    /// Some number was found but matches no known pattern.
    WrongResult,
    /// No number could be found at all.
    Illegible,
    /// Product equation solved without using the zero-product rule.
    ProductFormNotRecognized,
    /// Fewer candidate answers than the equation has roots.
    SingleRootOnly,
    /// Root number `ordinal` (1-based) is wrong or missing.
    RootMissing { ordinal: usize },
}

impl ErrorKind {
    /// Learner-facing description of the issue.
    pub fn issue(&self) -> String {
        match self {
            ErrorKind::ForgotToDivide => "Oubli de diviser par le coefficient".into(),
            ErrorKind::SignError => "Erreur de signe".into(),
            ErrorKind::WrongResult => "Résultat final incorrect".into(),
            ErrorKind::Illegible => "Solution non trouvée ou illisible".into(),
            ErrorKind::ProductFormNotRecognized => "Équation produit non reconnue".into(),
            ErrorKind::SingleRootOnly => "Une seule solution trouvée".into(),
            ErrorKind::RootMissing { ordinal } => {
                format!("{} solution incorrecte ou manquante", ordinal_fr(*ordinal))
            }
        }
    }
}

fn ordinal_fr(n: usize) -> String {
    match n {
        1 => "Première".into(),
        2 => "Deuxième".into(),
        3 => "Troisième".into(),
        4 => "Quatrième".into(),
        n => format!("{n}e"),
    }
}

/// Positive signals found in a solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strength {
    ClearSteps,
    NaturalLanguageExplanation,
    AlgebraicReasoning,
    ProductFormRecognized,
    MultipleSolutionsUnderstood,
}

impl Strength {
    pub fn message(&self) -> &'static str {
        match self {
            Strength::ClearSteps => "Présentation claire avec étapes détaillées",
            Strength::NaturalLanguageExplanation => "Explications en langage naturel présentes",
            Strength::AlgebraicReasoning => "Raisonnement algébrique visible",
            Strength::ProductFormRecognized => "Reconnaissance correcte de l'équation produit",
            Strength::MultipleSolutionsUnderstood => {
                "Compréhension qu'il y a plusieurs solutions"
            }
        }
    }
}

/// Improvement notes attached to an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Improvement {
    DivideByCoefficient,
    SignRules,
    CheckEachStep,
    WriteFinalAnswer,
    ShowIntermediateSteps,
    RecognizeProductEquations,
    FindAllSolutions,
}

impl Improvement {
    pub fn message(&self) -> &'static str {
        match self {
            Improvement::DivideByCoefficient => {
                "Bien penser à diviser par le coefficient de x à la fin"
            }
            Improvement::SignRules => "Revoir les règles des signes lors des opérations",
            Improvement::CheckEachStep => "Vérifier chaque étape de calcul",
            Improvement::WriteFinalAnswer => {
                "Écrire clairement la solution finale sous forme x = valeur"
            }
            Improvement::ShowIntermediateSteps => {
                "Montrer les étapes intermédiaires du raisonnement"
            }
            Improvement::RecognizeProductEquations => "Reconnaître les équations produit",
            Improvement::FindAllSolutions => "Chercher toutes les solutions possibles",
        }
    }
}

/// Format of a learning resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Video,
    Exercise,
    Lesson,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Video => write!(f, "video"),
            ResourceKind::Exercise => write!(f, "exercise"),
            ResourceKind::Lesson => write!(f, "lesson"),
        }
    }
}

/// Difficulty of a learning resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

/// A learning resource attached to a skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub url: Option<String>,
    pub difficulty: Difficulty,
}
