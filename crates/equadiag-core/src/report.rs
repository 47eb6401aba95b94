//! Diagnostic report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::model::Answer;
use crate::remediation::{DiagnosticResult, RemediationPlan};

/// A completed quiz: answers, diagnostic and remediation plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub catalog: CatalogSummary,
    /// Analyzer that produced the verdicts (e.g. "heuristic").
    pub analyzer: String,
    pub answers: Vec<Answer>,
    pub diagnostic: DiagnosticResult,
    pub plan: RemediationPlan,
}

/// Summary of a catalog (without the questions themselves).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub id: String,
    pub name: String,
    pub question_count: usize,
}

impl From<&Catalog> for CatalogSummary {
    fn from(catalog: &Catalog) -> Self {
        Self {
            id: catalog.id.clone(),
            name: catalog.name.clone(),
            question_count: catalog.questions.len(),
        }
    }
}

impl DiagnosticReport {
    pub fn new(
        catalog: CatalogSummary,
        analyzer: impl Into<String>,
        answers: Vec<Answer>,
        diagnostic: DiagnosticResult,
        plan: RemediationPlan,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            catalog,
            analyzer: analyzer.into(),
            answers,
            diagnostic,
            plan,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: DiagnosticReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// File name used when writing the report into an output directory.
    pub fn file_stem(&self) -> String {
        format!("diagnostic-{}", self.created_at.format("%Y%m%d-%H%M%S"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin;
    use crate::remediation::{analyze_answers, generate_remediation_plan};

    fn sample_report() -> DiagnosticReport {
        let catalog = builtin();
        let answers = vec![Answer {
            question_id: "q1".into(),
            solution_text: "x = 3".into(),
            is_correct: false,
            analysis: None,
        }];
        let diagnostic = analyze_answers(&catalog.questions, &answers);
        let plan = generate_remediation_plan(&catalog.resources, &diagnostic.skills_to_improve);
        DiagnosticReport::new(catalog.into(), "heuristic", answers, diagnostic, plan)
    }

    #[test]
    fn save_and_load() {
        let report = sample_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");
        report.save_json(&path).unwrap();

        let loaded = DiagnosticReport::load_json(&path).unwrap();
        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.catalog.question_count, 5);
        assert_eq!(loaded.diagnostic, report.diagnostic);
        assert_eq!(loaded.plan, report.plan);
    }

    #[test]
    fn fallback_answers_omit_analysis_field() {
        let json = serde_json::to_string(&sample_report().answers[0]).unwrap();
        assert!(json.contains("\"questionId\":\"q1\""));
        assert!(!json.contains("llmAnalysis"));
    }

    #[test]
    fn load_missing_file_fails() {
        let err = DiagnosticReport::load_json(Path::new("/nonexistent/report.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read report"));
    }

    #[test]
    fn file_stem_uses_timestamp() {
        assert!(sample_report().file_stem().starts_with("diagnostic-"));
    }
}
