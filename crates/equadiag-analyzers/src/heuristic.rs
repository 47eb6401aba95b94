//! Local analyzer backed by the heuristic grading engine.

use async_trait::async_trait;

use equadiag_core::grader::{GraderConfig, HeuristicGrader, QuestionGrader};
use equadiag_core::model::{AnalysisResult, Question};
use equadiag_core::traits::SolutionAnalyzer;

/// Grades solutions in-process, without any network call.
#[derive(Debug, Clone, Default)]
pub struct HeuristicAnalyzer {
    grader: HeuristicGrader,
}

impl HeuristicAnalyzer {
    pub fn new(config: GraderConfig) -> Self {
        Self {
            grader: HeuristicGrader::new(config),
        }
    }
}

#[async_trait]
impl SolutionAnalyzer for HeuristicAnalyzer {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn analyze(&self, question: &Question, solution: &str) -> anyhow::Result<AnalysisResult> {
        Ok(self.grader.grade(question, solution))
    }
}
