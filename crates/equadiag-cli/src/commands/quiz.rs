//! The `equadiag quiz` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use serde::Deserialize;

use equadiag_analyzers::{create_analyzer, load_config_from};
use equadiag_core::catalog::Catalog;
use equadiag_core::error::SessionError;
use equadiag_core::report::DiagnosticReport;
use equadiag_core::session::QuizSession;
use equadiag_report::html::write_html_report;

use super::plan::print_plan;
use super::resolve_catalog;

/// A learner's answer sheet.
#[derive(Debug, Deserialize)]
struct AnswerSheet {
    #[serde(default)]
    answers: Vec<AnswerEntry>,
}

#[derive(Debug, Deserialize)]
struct AnswerEntry {
    question: String,
    solution: String,
}

fn load_answer_sheet(path: &Path) -> Result<AnswerSheet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answers: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("failed to parse answers: {}", path.display()))
}

pub async fn execute(
    answers_path: PathBuf,
    catalog_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
    format: String,
) -> Result<()> {
    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html"]
    } else {
        format.split(',').map(str::trim).collect()
    };
    if let Some(bad) = formats.iter().find(|f| !matches!(**f, "json" | "html")) {
        anyhow::bail!("unknown format: {bad} (expected json, html or all)");
    }

    let config = load_config_from(config_path.as_deref())?;
    let catalog = resolve_catalog(catalog_path.as_deref(), Some(&config))?;
    let sheet = load_answer_sheet(&answers_path)?;
    anyhow::ensure!(!sheet.answers.is_empty(), "answer sheet has no answers");

    let analyzer = create_analyzer(&config)?;
    let mut session = QuizSession::new(catalog.questions.clone(), analyzer);

    eprintln!(
        "equadiag v{} — Grading {} answers against {} ({} questions) with {}",
        env!("CARGO_PKG_VERSION"),
        sheet.answers.len(),
        catalog.name,
        catalog.questions.len(),
        session.analyzer_name()
    );

    for entry in &sheet.answers {
        match session.submit_for(&entry.question, &entry.solution).await {
            Ok(answer) => {
                let verdict = if answer.is_correct { "correct" } else { "incorrect" };
                eprintln!("  {} :: {verdict}", entry.question);
            }
            Err(e @ (SessionError::EmptySolution(_) | SessionError::UnknownQuestion(_))) => {
                eprintln!("  Skipped: {e}");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let (answered, total) = session.progress();
    if answered < total {
        eprintln!("  {} question(s) left unanswered", total - answered);
    }

    let (diagnostic, plan) = session.finish(&catalog.resources);
    let report = DiagnosticReport::new(
        (&catalog).into(),
        session.analyzer_name(),
        session.answers().to_vec(),
        diagnostic,
        plan,
    );

    print_summary(&report, &catalog);
    println!();
    println!("Plan de remédiation");
    print_plan(&report.plan, &catalog.resources);

    let output = output.unwrap_or(config.output_dir);
    std::fs::create_dir_all(&output)?;
    let stem = report.file_stem();

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("{stem}.json"));
                report.save_json(&path)?;
                eprintln!("Report saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("{stem}.html"));
                write_html_report(&report, &catalog.questions, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}

fn print_summary(report: &DiagnosticReport, catalog: &Catalog) {
    let mut table = Table::new();
    table.set_header(vec!["Question", "Compétence", "Résultat", "Erreur"]);

    for answer in &report.answers {
        let skill = catalog
            .question(&answer.question_id)
            .map(|q| q.skill.as_str())
            .unwrap_or("-");
        let verdict = if answer.is_correct { "Correct" } else { "Incorrect" };
        let error = match &answer.analysis {
            Some(a) => a.errors.first().map(|e| e.issue.clone()).unwrap_or_default(),
            None => "analyse indisponible".to_string(),
        };
        table.add_row(vec![
            Cell::new(&answer.question_id),
            Cell::new(skill),
            Cell::new(verdict),
            Cell::new(error),
        ]);
    }

    println!("{table}");

    let d = &report.diagnostic;
    println!(
        "Score : {}/{} ({}%) — {}",
        d.correct_answers,
        d.total_questions,
        d.percentage(),
        d.performance_level()
    );
    if !d.skills_mastered.is_empty() {
        println!("Compétences maîtrisées : {}", d.skills_mastered.join(", "));
    }
    if !d.skills_to_improve.is_empty() {
        println!("Compétences à renforcer : {}", d.skills_to_improve.join(", "));
    }
}
