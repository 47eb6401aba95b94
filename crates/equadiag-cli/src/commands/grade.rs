//! The `equadiag grade` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use equadiag_analyzers::{create_analyzer, load_config_from};
use equadiag_core::model::AnalysisResult;

use super::resolve_catalog;

pub async fn execute(
    question_id: String,
    solution: Option<String>,
    solution_file: Option<PathBuf>,
    catalog_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    format: String,
) -> Result<()> {
    anyhow::ensure!(
        matches!(format.as_str(), "text" | "json"),
        "unknown format: {format} (expected text or json)"
    );

    let config = load_config_from(config_path.as_deref())?;
    let catalog = resolve_catalog(catalog_path.as_deref(), Some(&config))?;

    let question = catalog.question(&question_id).with_context(|| {
        let ids: Vec<&str> = catalog.questions.iter().map(|q| q.id.as_str()).collect();
        format!("unknown question: {question_id} (available: {})", ids.join(", "))
    })?;

    let solution = match (solution, solution_file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read solution file: {}", path.display()))?,
        (None, None) => anyhow::bail!("provide --solution or --solution-file"),
    };
    anyhow::ensure!(!solution.trim().is_empty(), "solution is empty");

    let analyzer = create_analyzer(&config)?;
    let result = analyzer.analyze(question, &solution).await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", question.question);
        print_analysis(&result);
    }

    Ok(())
}

fn print_analysis(result: &AnalysisResult) {
    if result.is_correct {
        println!("Correct");
    } else {
        println!("Incorrect");
    }
    if !result.correct_answers.is_empty() {
        println!("Réponse(s) attendue(s) : {}", result.correct_answers.join(", "));
    }
    if !result.feedback.is_empty() {
        println!("{}", result.feedback);
    }

    if !result.errors.is_empty() {
        println!("\nErreurs :");
        for e in &result.errors {
            println!("  [{}] {}", e.step, e.issue);
            println!("      {}", e.correction);
        }
    }
    if !result.strengths.is_empty() {
        println!("\nPoints forts :");
        for s in &result.strengths {
            println!("  + {s}");
        }
    }
    if !result.areas_to_improve.is_empty() {
        println!("\nÀ améliorer :");
        for a in &result.areas_to_improve {
            println!("  - {a}");
        }
    }
}
