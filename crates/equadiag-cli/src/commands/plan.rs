//! The `equadiag plan` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use equadiag_analyzers::load_config_from;
use equadiag_core::remediation::{generate_remediation_plan, RemediationPlan, ResourceTable};

use super::resolve_catalog;

pub fn execute(
    skills: String,
    catalog_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let catalog = resolve_catalog(catalog_path.as_deref(), Some(&config))?;

    let skills: Vec<String> = skills
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    anyhow::ensure!(!skills.is_empty(), "no skills given");

    let plan = generate_remediation_plan(&catalog.resources, &skills);
    print_plan(&plan, &catalog.resources);
    Ok(())
}

/// Print a remediation plan as a table, noting skills with no resources.
pub fn print_plan(plan: &RemediationPlan, table: &ResourceTable) {
    for skill in &plan.skills {
        if !table.contains_skill(skill) {
            println!("Aucune ressource pour : {skill}");
        }
    }

    if plan.resources.is_empty() {
        println!("Aucune ressource à recommander.");
        return;
    }

    let mut out = Table::new();
    out.set_header(vec!["Type", "Ressource", "Difficulté", "Description"]);
    for r in &plan.resources {
        out.add_row(vec![
            Cell::new(r.kind),
            Cell::new(&r.title),
            Cell::new(r.difficulty),
            Cell::new(&r.description),
        ]);
    }
    println!("{out}");
}
