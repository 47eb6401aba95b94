//! Diagnostic aggregation and remediation planning.
//!
//! Turns a completed quiz into a [`DiagnosticResult`] (mastered skills, skill
//! gaps, error summaries) and a skill-gap list into a [`RemediationPlan`].

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Answer, Question, Resource, StepError};

/// Static lookup of learning resources by skill name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceTable {
    by_skill: HashMap<String, Vec<Resource>>,
}

impl ResourceTable {
    /// Build a table from `(skill, resource)` pairs, keeping per-skill order.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Resource)>,
    {
        let mut by_skill: HashMap<String, Vec<Resource>> = HashMap::new();
        for (skill, resource) in entries {
            by_skill.entry(skill).or_default().push(resource);
        }
        Self { by_skill }
    }

    /// Append another table's resources after this table's, skill by skill.
    pub fn merge(&mut self, other: ResourceTable) {
        for (skill, resources) in other.by_skill {
            self.by_skill.entry(skill).or_default().extend(resources);
        }
    }

    /// Resources for a skill; empty when the skill is unknown.
    pub fn get(&self, skill: &str) -> &[Resource] {
        self.by_skill.get(skill).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_skill(&self, skill: &str) -> bool {
        self.by_skill.contains_key(skill)
    }

    /// Skill names, sorted.
    pub fn skills(&self) -> Vec<&str> {
        let mut skills: Vec<&str> = self.by_skill.keys().map(String::as_str).collect();
        skills.sort_unstable();
        skills
    }

    pub fn len(&self) -> usize {
        self.by_skill.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_skill.is_empty()
    }
}

/// Skills to work on and the resources to work on them with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationPlan {
    pub skills: Vec<String>,
    pub resources: Vec<Resource>,
}

/// Flatten the resources of every skill, dropping repeated titles.
///
/// The first resource seen with a given title wins. Skills missing from the
/// table contribute nothing.
pub fn generate_remediation_plan(table: &ResourceTable, skills: &[String]) -> RemediationPlan {
    let mut seen = HashSet::new();
    let resources = skills
        .iter()
        .flat_map(|skill| table.get(skill))
        .filter(|r| seen.insert(r.title.as_str()))
        .cloned()
        .collect();

    RemediationPlan {
        skills: skills.to_vec(),
        resources,
    }
}

/// Summary of one incorrect answer, for display next to the diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorAnalysis {
    pub skill: String,
    pub error_type: String,
    pub description: String,
    pub recommendation: String,
    #[serde(default)]
    pub specific_errors: Vec<StepError>,
    #[serde(default)]
    pub strengths: Vec<String>,
}

/// Outcome of a whole quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticResult {
    pub total_questions: usize,
    pub correct_answers: usize,
    pub skills_mastered: Vec<String>,
    pub skills_to_improve: Vec<String>,
    pub errors: Vec<ErrorAnalysis>,
}

impl DiagnosticResult {
    /// Share of correct answers, rounded to the nearest percent.
    pub fn percentage(&self) -> u32 {
        if self.total_questions == 0 {
            return 0;
        }
        (self.correct_answers as f64 / self.total_questions as f64 * 100.0).round() as u32
    }

    pub fn performance_level(&self) -> PerformanceLevel {
        PerformanceLevel::from_percentage(self.percentage())
    }
}

/// Coarse band for a diagnostic score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceLevel {
    Excellent,
    Good,
    Average,
    NeedsWork,
}

impl PerformanceLevel {
    pub fn from_percentage(percent: u32) -> Self {
        match percent {
            80.. => PerformanceLevel::Excellent,
            60..=79 => PerformanceLevel::Good,
            40..=59 => PerformanceLevel::Average,
            _ => PerformanceLevel::NeedsWork,
        }
    }
}

impl fmt::Display for PerformanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerformanceLevel::Excellent => write!(f, "Excellent"),
            PerformanceLevel::Good => write!(f, "Bon"),
            PerformanceLevel::Average => write!(f, "Moyen"),
            PerformanceLevel::NeedsWork => write!(f, "À améliorer"),
        }
    }
}

const DEFAULT_ERROR_TYPE: &str = "Erreur de raisonnement";
const DEFAULT_RECOMMENDATION: &str = "Revoir les bases de cette compétence";

/// Aggregate answers into a diagnostic.
///
/// Answers are paired with questions by id; questions without an answer are
/// counted in the total but in neither skill list. Answers to unknown
/// questions are ignored, and the last answer to a question is the one kept.
pub fn analyze_answers(questions: &[Question], answers: &[Answer]) -> DiagnosticResult {
    let by_id: HashMap<&str, &Answer> = answers
        .iter()
        .map(|a| (a.question_id.as_str(), a))
        .collect();

    let mut skills_mastered: Vec<String> = Vec::new();
    let mut skills_to_improve: Vec<String> = Vec::new();
    let mut errors = Vec::new();
    let mut correct_answers = 0;

    for question in questions {
        let Some(answer) = by_id.get(question.id.as_str()) else {
            tracing::debug!(question = %question.id, "no answer recorded");
            continue;
        };

        if answer.is_correct {
            correct_answers += 1;
            push_unique(&mut skills_mastered, &question.skill);
            continue;
        }

        push_unique(&mut skills_to_improve, &question.skill);

        if let Some(analysis) = &answer.analysis {
            errors.push(ErrorAnalysis {
                skill: question.skill.clone(),
                error_type: analysis
                    .errors
                    .first()
                    .map(|e| e.issue.clone())
                    .unwrap_or_else(|| DEFAULT_ERROR_TYPE.to_string()),
                description: analysis.feedback.clone(),
                recommendation: if analysis.areas_to_improve.is_empty() {
                    DEFAULT_RECOMMENDATION.to_string()
                } else {
                    analysis.areas_to_improve.join(". ")
                },
                specific_errors: analysis.errors.clone(),
                strengths: analysis.strengths.clone(),
            });
        }
    }

    DiagnosticResult {
        total_questions: questions.len(),
        correct_answers,
        skills_mastered,
        skills_to_improve,
        errors,
    }
}

fn push_unique(list: &mut Vec<String>, skill: &str) {
    if !list.iter().any(|s| s == skill) {
        list.push(skill.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalysisResult, Difficulty, ResourceKind};

    fn resource(title: &str, description: &str) -> Resource {
        Resource {
            kind: ResourceKind::Lesson,
            title: title.into(),
            description: description.into(),
            url: None,
            difficulty: Difficulty::Easy,
        }
    }

    fn question(id: &str, skill: &str) -> Question {
        Question {
            id: id.into(),
            question: format!("Résous {id}"),
            correct_answer: "1".into(),
            skill: skill.into(),
            context: None,
            kind: None,
        }
    }

    fn answer(id: &str, correct: bool, analysis: Option<AnalysisResult>) -> Answer {
        Answer {
            question_id: id.into(),
            solution_text: "x = 1".into(),
            is_correct: correct,
            analysis,
        }
    }

    #[test]
    fn dedup_keeps_first_title() {
        let table = ResourceTable::from_entries(vec![
            ("A".to_string(), resource("R1", "first")),
            ("A".to_string(), resource("R1", "second")),
            ("B".to_string(), resource("R1", "third")),
        ]);
        let plan = generate_remediation_plan(&table, &["A".into(), "B".into()]);
        assert_eq!(plan.resources.len(), 1);
        assert_eq!(plan.resources[0].description, "first");
        assert_eq!(plan.skills, vec!["A", "B"]);
    }

    #[test]
    fn unknown_skills_contribute_nothing() {
        let table = ResourceTable::from_entries(vec![("A".to_string(), resource("R1", "d"))]);
        let plan = generate_remediation_plan(&table, &["Z".into(), "A".into()]);
        assert_eq!(plan.resources.len(), 1);
        assert_eq!(plan.skills, vec!["Z", "A"]);
    }

    #[test]
    fn resources_follow_skill_order() {
        let table = ResourceTable::from_entries(vec![
            ("A".to_string(), resource("RA", "d")),
            ("B".to_string(), resource("RB", "d")),
        ]);
        let plan = generate_remediation_plan(&table, &["B".into(), "A".into()]);
        let titles: Vec<&str> = plan.resources.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["RB", "RA"]);
    }

    #[test]
    fn analyze_splits_skills() {
        let questions = vec![question("q1", "S1"), question("q2", "S2"), question("q3", "S2")];
        let answers = vec![
            answer("q1", true, None),
            answer("q2", false, None),
            answer("q3", false, None),
        ];
        let result = analyze_answers(&questions, &answers);
        assert_eq!(result.total_questions, 3);
        assert_eq!(result.correct_answers, 1);
        assert_eq!(result.skills_mastered, vec!["S1"]);
        assert_eq!(result.skills_to_improve, vec!["S2"]);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn analyze_counts_only_paired_answers() {
        let questions = vec![question("q1", "S1"), question("q2", "S2")];
        let answers = vec![
            answer("q1", true, None),
            answer("q1", true, None),
            answer("zz", true, None),
            answer("q2", false, None),
        ];
        let result = analyze_answers(&questions, &answers);
        assert_eq!(result.correct_answers, 1);
        assert_eq!(result.total_questions, 2);
        assert_eq!(result.percentage(), 50);
    }

    #[test]
    fn analyze_builds_error_summary() {
        let analysis = AnalysisResult {
            is_correct: false,
            errors: vec![StepError {
                step: "x = 10".into(),
                issue: "Oubli de diviser par le coefficient".into(),
                correction: "x = 5".into(),
                kind: None,
            }],
            feedback: "À corriger".into(),
            areas_to_improve: vec!["Diviser".into(), "Vérifier".into()],
            ..Default::default()
        };
        let result = analyze_answers(&[question("q2", "S")], &[answer("q2", false, Some(analysis))]);
        let summary = &result.errors[0];
        assert_eq!(summary.error_type, "Oubli de diviser par le coefficient");
        assert_eq!(summary.recommendation, "Diviser. Vérifier");
        assert_eq!(summary.description, "À corriger");
    }

    #[test]
    fn analyze_uses_defaults_for_empty_analysis() {
        let result = analyze_answers(
            &[question("q1", "S")],
            &[answer("q1", false, Some(AnalysisResult::default()))],
        );
        assert_eq!(result.errors[0].error_type, DEFAULT_ERROR_TYPE);
        assert_eq!(result.errors[0].recommendation, DEFAULT_RECOMMENDATION);
    }

    #[test]
    fn performance_bands() {
        assert_eq!(PerformanceLevel::from_percentage(80), PerformanceLevel::Excellent);
        assert_eq!(PerformanceLevel::from_percentage(60), PerformanceLevel::Good);
        assert_eq!(PerformanceLevel::from_percentage(40), PerformanceLevel::Average);
        assert_eq!(PerformanceLevel::from_percentage(39), PerformanceLevel::NeedsWork);
        assert_eq!(PerformanceLevel::NeedsWork.to_string(), "À améliorer");
    }

    #[test]
    fn percentage_rounds() {
        let result = DiagnosticResult {
            total_questions: 3,
            correct_answers: 2,
            skills_mastered: vec![],
            skills_to_improve: vec![],
            errors: vec![],
        };
        assert_eq!(result.percentage(), 67);
        assert_eq!(result.performance_level(), PerformanceLevel::Good);
    }
}
