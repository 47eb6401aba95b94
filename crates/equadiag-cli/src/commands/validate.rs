//! The `equadiag validate` command.

use std::path::PathBuf;

use anyhow::Result;

use equadiag_analyzers::load_config_from;
use equadiag_core::catalog::validate_catalog;

use super::resolve_catalog;

pub fn execute(catalog_path: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let catalog = resolve_catalog(catalog_path.as_deref(), Some(&config))?;

    println!(
        "Catalog: {} ({} questions, {} resources)",
        catalog.name,
        catalog.questions.len(),
        catalog.resources.len()
    );

    let warnings = validate_catalog(&catalog);
    for w in &warnings {
        let prefix = w
            .question_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Catalog valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
