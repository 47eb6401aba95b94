//! The `equadiag init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("equadiag.toml").exists() {
        println!("equadiag.toml already exists, skipping.");
    } else {
        std::fs::write("equadiag.toml", SAMPLE_CONFIG)?;
        println!("Created equadiag.toml");
    }

    std::fs::create_dir_all("catalog")?;
    let example_path = std::path::Path::new("catalog/example.toml");
    if example_path.exists() {
        println!("catalog/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_CATALOG)?;
        println!("Created catalog/example.toml");
    }

    let answers_path = std::path::Path::new("answers.toml");
    if answers_path.exists() {
        println!("answers.toml already exists, skipping.");
    } else {
        std::fs::write(answers_path, EXAMPLE_ANSWERS)?;
        println!("Created answers.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit equadiag.toml to pick an analyzer");
    println!("  2. Run: equadiag validate --catalog catalog/example.toml");
    println!("  3. Run: equadiag quiz --catalog catalog/example.toml --answers answers.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# equadiag configuration

# "strict" compares decimals only; "evaluate" also evaluates a/b literals.
fraction_policy = "strict"
output_dir = "./equadiag-reports"
# catalog = "catalog/example.toml"
# Question generation service
# backend_url = "http://127.0.0.1:5000"

[analyzer]
type = "heuristic"

# [analyzer]
# type = "remote"
# base_url = "http://127.0.0.1:5000"
# timeout_secs = 30

# [analyzer]
# type = "chat"
# api_key = "${OPENAI_API_KEY}"
# model = "gpt-4.1-mini"
"#;

const EXAMPLE_CATALOG: &str = r#"[catalog]
id = "example"
name = "Exemple"
description = "Un petit catalogue pour démarrer"

[[questions]]
id = "e1"
question = "Résous l'équation : x + 5 = 2"
correct_answer = "-3"
skill = "Isolation de variable simple"
context = "Équation linéaire simple du premier degré"

[[questions]]
id = "e2"
question = "Résous l'équation : (x - 1)(2x + 4) = 0"
correct_answer = "1, -2"
skill = "Équations avec produit nul"
kind = "product"

[[resources]]
skill = "Isolation de variable simple"
type = "video"
title = "Isoler la variable dans une équation simple"
description = "Apprendre à isoler x en utilisant les opérations inverses"
difficulty = "easy"

[[resources]]
skill = "Équations avec produit nul"
type = "lesson"
title = "La règle du produit nul"
description = "Un produit de facteurs est nul si et seulement si l'un des facteurs est nul"
difficulty = "medium"
"#;

const EXAMPLE_ANSWERS: &str = r#"[[answers]]
question = "e1"
solution = """
x + 5 = 2
x = 2 - 5
x = -3
"""

[[answers]]
question = "e2"
solution = "Produit nul : x - 1 = 0 donc x = 1"
"#;
