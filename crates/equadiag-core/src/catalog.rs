//! Question catalogs.
//!
//! A catalog is a TOML file with a `[catalog]` header, `[[questions]]` and
//! `[[resources]]` tables. The built-in catalog is embedded in the binary and
//! parsed once on first use.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::extract::{parse_numeric, FractionPolicy};
use crate::model::{Difficulty, Question, QuestionKind, Resource, ResourceKind};
use crate::remediation::ResourceTable;

const BUILTIN_TOML: &str = include_str!("../data/builtin.toml");

static BUILTIN: LazyLock<Catalog> = LazyLock::new(|| {
    parse_catalog_str(BUILTIN_TOML, Path::new("builtin.toml"))
        .expect("embedded catalog must parse")
});

/// The catalog shipped with equadiag.
pub fn builtin() -> &'static Catalog {
    &BUILTIN
}

/// Questions plus the resource table used to remediate their skills.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub id: String,
    pub name: String,
    pub description: String,
    pub questions: Vec<Question>,
    pub resources: ResourceTable,
}

impl Catalog {
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }
}

#[derive(Debug, Deserialize)]
struct TomlCatalogFile {
    catalog: TomlCatalogHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
    #[serde(default)]
    resources: Vec<TomlResource>,
}

#[derive(Debug, Deserialize)]
struct TomlCatalogHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    question: String,
    correct_answer: String,
    skill: String,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlResource {
    skill: String,
    #[serde(rename = "type")]
    kind: ResourceKind,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    url: Option<String>,
    difficulty: Difficulty,
}

/// Parse a single catalog file.
pub fn parse_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file: {}", path.display()))?;

    parse_catalog_str(&content, path)
}

/// Parse a TOML string into a `Catalog`.
pub fn parse_catalog_str(content: &str, source_path: &Path) -> Result<Catalog> {
    let parsed: TomlCatalogFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let kind = q
                .kind
                .map(|k| k.parse::<QuestionKind>().map_err(|e| anyhow::anyhow!("{}", e)))
                .transpose()?;

            Ok(Question {
                id: q.id,
                question: q.question,
                correct_answer: q.correct_answer,
                skill: q.skill,
                context: q.context,
                kind,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let resources = ResourceTable::from_entries(parsed.resources.into_iter().map(|r| {
        (
            r.skill,
            Resource {
                kind: r.kind,
                title: r.title,
                description: r.description,
                url: r.url,
                difficulty: r.difficulty,
            },
        )
    }));

    Ok(Catalog {
        id: parsed.catalog.id,
        name: parsed.catalog.name,
        description: parsed.catalog.description,
        questions,
        resources,
    })
}

/// Load a catalog from a file, or every `.toml` catalog under a directory merged into one.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    if !path.is_dir() {
        return parse_catalog(path);
    }

    let mut catalogs = load_catalog_directory(path)?;
    anyhow::ensure!(
        !catalogs.is_empty(),
        "no catalog files found in {}",
        path.display()
    );
    let mut merged = catalogs.remove(0);
    for other in catalogs {
        merged.questions.extend(other.questions);
        merged.resources.merge(other.resources);
    }
    Ok(merged)
}

/// Recursively load all `.toml` catalog files from a directory.
pub fn load_catalog_directory(dir: &Path) -> Result<Vec<Catalog>> {
    let mut catalogs = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            catalogs.extend(load_catalog_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_catalog(&path) {
                Ok(catalog) => catalogs.push(catalog),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(catalogs)
}

/// A warning from catalog validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    pub message: String,
}

/// Check a catalog for problems that would make grading or remediation misbehave.
pub fn validate_catalog(catalog: &Catalog) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut warn = |id: &str, message: String| {
        warnings.push(ValidationWarning {
            question_id: Some(id.to_string()),
            message,
        })
    };

    let mut seen_ids = HashSet::new();
    for q in &catalog.questions {
        if !seen_ids.insert(&q.id) {
            warn(&q.id, format!("duplicate question ID: {}", q.id));
        }

        if q.question.trim().is_empty() {
            warn(&q.id, "question prompt is empty".into());
        }

        let expected = q.expected_answers();
        if expected.is_empty() {
            warn(&q.id, "correct_answer is empty".into());
        }
        for answer in &expected {
            if parse_numeric(answer, FractionPolicy::Evaluate).is_none() {
                warn(&q.id, format!("expected answer is not numeric: {answer}"));
            } else if parse_numeric(answer, FractionPolicy::Strict).is_none()
                && q.kind() == QuestionKind::Linear
            {
                warn(
                    &q.id,
                    format!("fraction answer {answer} only matches with fraction_policy = \"evaluate\""),
                );
            }
        }

        if q.kind() == QuestionKind::Product && expected.len() < 2 {
            warn(&q.id, "product question needs at least two roots".into());
        }

        if !catalog.resources.contains_skill(&q.skill) {
            warn(&q.id, format!("no resources for skill: {}", q.skill));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[catalog]
id = "test"
name = "Test Catalog"

[[questions]]
id = "a1"
question = "Résous : x + 1 = 3"
correct_answer = "2"
skill = "Addition"

[[questions]]
id = "a2"
question = "Résous : (x - 1)(x + 2) = 0"
correct_answer = "1, -2"
skill = "Produit"
kind = "product"

[[resources]]
skill = "Addition"
type = "video"
title = "Ajouter des deux côtés"
description = "Opérations inverses"
difficulty = "easy"
"#;

    #[test]
    fn builtin_catalog_loads() {
        let catalog = builtin();
        assert_eq!(catalog.questions.len(), 5);
        let q5 = catalog.question("q5").unwrap();
        assert_eq!(q5.kind(), QuestionKind::Product);
        assert_eq!(catalog.question("q1").unwrap().kind(), QuestionKind::Linear);
        assert_eq!(catalog.resources.get("Isolation de variable simple").len(), 3);
    }

    #[test]
    fn builtin_catalog_is_valid() {
        let warnings = validate_catalog(builtin());
        assert!(
            warnings.is_empty(),
            "unexpected warnings: {:?}",
            warnings.iter().map(|w| &w.message).collect::<Vec<_>>()
        );
    }

    #[test]
    fn parse_valid_toml() {
        let catalog = parse_catalog_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(catalog.id, "test");
        assert_eq!(catalog.questions.len(), 2);
        assert_eq!(catalog.questions[1].kind, Some(QuestionKind::Product));
        assert_eq!(catalog.resources.len(), 1);
    }

    #[test]
    fn parse_unknown_kind_fails() {
        let toml = r#"
[catalog]
id = "bad"
name = "Bad"

[[questions]]
id = "b1"
question = "x = 1"
correct_answer = "1"
skill = "S"
kind = "quadratic"
"#;
        let err = parse_catalog_str(toml, &PathBuf::from("bad.toml")).unwrap_err();
        assert!(err.to_string().contains("quadratic"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_catalog_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn validate_reports_problems() {
        let toml = r#"
[catalog]
id = "problems"
name = "Problems"

[[questions]]
id = "p1"
question = "Résous : 2x = 4"
correct_answer = "deux"
skill = "S"

[[questions]]
id = "p1"
question = "  "
correct_answer = "2"
skill = "S"

[[questions]]
id = "p3"
question = "Résous : (x)(x) = 0"
correct_answer = "0"
skill = "S"
kind = "product"
"#;
        let catalog = parse_catalog_str(toml, &PathBuf::from("p.toml")).unwrap();
        let messages: Vec<String> = validate_catalog(&catalog)
            .into_iter()
            .map(|w| w.message)
            .collect();
        assert!(messages.iter().any(|m| m.contains("not numeric")));
        assert!(messages.iter().any(|m| m.contains("duplicate")));
        assert!(messages.iter().any(|m| m.contains("prompt is empty")));
        assert!(messages.iter().any(|m| m.contains("at least two roots")));
        assert!(messages.iter().any(|m| m.contains("no resources")));
    }

    #[test]
    fn load_directory_merges() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.toml"), VALID_TOML).unwrap();
        std::fs::write(
            dir.path().join("b.toml"),
            r#"
[catalog]
id = "extra"
name = "Extra"

[[questions]]
id = "e1"
question = "Résous : 5x = 10"
correct_answer = "2"
skill = "Addition"

[[resources]]
skill = "Addition"
type = "exercise"
title = "Plus d'exercices"
difficulty = "medium"
"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let catalog = load_catalog(dir.path()).unwrap();
        assert_eq!(catalog.id, "test");
        assert_eq!(catalog.questions.len(), 3);
        assert_eq!(catalog.resources.get("Addition").len(), 2);
    }

    #[test]
    fn load_empty_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_catalog(dir.path()).is_err());
    }
}
