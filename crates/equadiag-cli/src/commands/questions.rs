//! The `equadiag questions` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use equadiag_analyzers::{create_question_source, load_config_from};

use super::resolve_catalog;

pub async fn execute(
    theme: Option<String>,
    catalog_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let catalog = resolve_catalog(catalog_path.as_deref(), Some(&config))?;

    let questions = match &theme {
        Some(theme) => {
            let source = create_question_source(&config, &catalog)?;
            eprintln!("Fetching questions for \"{theme}\" from {}", source.name());
            source.questions(theme).await?
        }
        None => catalog.questions.clone(),
    };

    if questions.is_empty() {
        println!("No questions found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Id", "Kind", "Skill", "Question"]);
    for q in &questions {
        table.add_row(vec![
            Cell::new(&q.id),
            Cell::new(q.kind()),
            Cell::new(&q.skill),
            Cell::new(&q.question),
        ]);
    }
    println!("{table}");
    println!("{} question(s)", questions.len());

    Ok(())
}
