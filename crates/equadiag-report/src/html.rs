//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;

use equadiag_core::model::Question;
use equadiag_core::report::DiagnosticReport;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML report from a diagnostic report.
///
/// `questions` supplies prompts and skills for the answer table; answers to
/// questions not in the list are shown with their id only.
pub fn generate_html(report: &DiagnosticReport, questions: &[Question]) -> String {
    let by_id: HashMap<&str, &Question> = questions.iter().map(|q| (q.id.as_str(), q)).collect();
    let diagnostic = &report.diagnostic;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"fr\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>Diagnostic — {}</title>\n",
        html_escape(&report.catalog.name)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    html.push_str("<header>\n");
    html.push_str("<h1>Résultats du diagnostic</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Catalogue : <strong>{}</strong> | {} questions | analyse : {} | {}</p>\n",
        html_escape(&report.catalog.name),
        report.catalog.question_count,
        html_escape(&report.analyzer),
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Score
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Score</h2>\n");
    html.push_str(&format!(
        "<p class=\"score\">{}/{} ({}%) — {}</p>\n",
        diagnostic.correct_answers,
        diagnostic.total_questions,
        diagnostic.percentage(),
        diagnostic.performance_level()
    ));
    html.push_str(&score_bar(diagnostic.percentage()));
    html.push_str("<div class=\"skills\">\n");
    html.push_str(&skill_list("Compétences maîtrisées", "pass", &diagnostic.skills_mastered));
    html.push_str(&skill_list(
        "Compétences à renforcer",
        "fail",
        &diagnostic.skills_to_improve,
    ));
    html.push_str("</div>\n");
    html.push_str("</section>\n");

    // Answers
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Réponses</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Question</th><th onclick=\"sortTable(1)\">Compétence</th><th onclick=\"sortTable(2)\">Réponse</th><th onclick=\"sortTable(3)\">Résultat</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for answer in &report.answers {
        let question = by_id.get(answer.question_id.as_str());
        let class = if answer.is_correct { "pass" } else { "fail" };
        let verdict = match (&answer.analysis, answer.is_correct) {
            (_, true) => "Correct",
            (Some(_), false) => "Incorrect",
            (None, false) => "Incorrect (analyse indisponible)",
        };
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td><pre>{}</pre></td><td>{}</td></tr>\n",
            class,
            html_escape(question.map_or(answer.question_id.as_str(), |q| q.question.as_str())),
            html_escape(question.map_or("-", |q| q.skill.as_str())),
            html_escape(&answer.solution_text),
            verdict,
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Error analyses
    if !diagnostic.errors.is_empty() {
        html.push_str("<section class=\"errors\">\n");
        html.push_str("<h2>Analyse des erreurs</h2>\n");
        for error in &diagnostic.errors {
            html.push_str("<article class=\"error\">\n");
            html.push_str(&format!(
                "<h3>{} — {}</h3>\n",
                html_escape(&error.skill),
                html_escape(&error.error_type)
            ));
            if !error.description.is_empty() {
                html.push_str(&format!("<p>{}</p>\n", html_escape(&error.description)));
            }
            if !error.specific_errors.is_empty() {
                html.push_str("<ul>\n");
                for step in &error.specific_errors {
                    html.push_str(&format!(
                        "<li><code>{}</code> : {} → {}</li>\n",
                        html_escape(&step.step),
                        html_escape(&step.issue),
                        html_escape(&step.correction)
                    ));
                }
                html.push_str("</ul>\n");
            }
            if !error.strengths.is_empty() {
                html.push_str(&format!(
                    "<p class=\"strengths\">Points forts : {}</p>\n",
                    html_escape(&error.strengths.join(", "))
                ));
            }
            html.push_str(&format!(
                "<p class=\"recommendation\">Recommandation : {}</p>\n",
                html_escape(&error.recommendation)
            ));
            html.push_str("</article>\n");
        }
        html.push_str("</section>\n");
    }

    // Remediation plan
    html.push_str("<section class=\"plan\">\n");
    html.push_str("<h2>Plan de remédiation</h2>\n");
    if report.plan.resources.is_empty() {
        html.push_str("<p>Aucune ressource à recommander.</p>\n");
    } else {
        html.push_str("<table>\n");
        html.push_str("<thead><tr><th>Type</th><th>Ressource</th><th>Difficulté</th></tr></thead>\n<tbody>\n");
        for resource in &report.plan.resources {
            let title = match &resource.url {
                Some(url) => format!(
                    "<a href=\"{}\">{}</a>",
                    html_escape(url),
                    html_escape(&resource.title)
                ),
                None => html_escape(&resource.title),
            };
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}<br><small>{}</small></td><td>{}</td></tr>\n",
                resource.kind,
                title,
                html_escape(&resource.description),
                resource.difficulty
            ));
        }
        html.push_str("</tbody></table>\n");
    }
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Données JSON</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(report)
            .unwrap_or_default()
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &DiagnosticReport, questions: &[Question], path: &Path) -> Result<()> {
    let html = generate_html(report, questions);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn skill_list(title: &str, class: &str, skills: &[String]) -> String {
    let mut out = format!("<div class=\"{class}\">\n<h3>{title}</h3>\n");
    if skills.is_empty() {
        out.push_str("<p>—</p>\n");
    } else {
        out.push_str("<ul>\n");
        for skill in skills {
            out.push_str(&format!("<li>{}</li>\n", html_escape(skill)));
        }
        out.push_str("</ul>\n");
    }
    out.push_str("</div>\n");
    out
}

fn score_bar(percent: u32) -> String {
    let max_width = 400;
    let bar_height = 24;
    let width = percent.min(100) as usize * max_width / 100;

    let color = if percent >= 80 {
        "#22c55e"
    } else if percent >= 40 {
        "#eab308"
    } else {
        "#ef4444"
    };

    format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n  <rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"var(--border)\" rx=\"4\"/>\n  <rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n</svg>\n",
        max_width, bar_height, max_width, bar_height, width, bar_height, color
    )
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.score { font-size: 1.5rem; font-weight: bold; }
.skills { display: flex; gap: 2rem; }
.skills > div { flex: 1; padding: 0 1rem; border-radius: 8px; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; vertical-align: top; }
th { background: var(--border); cursor: pointer; }
td pre { margin: 0; padding: 0; background: none; white-space: pre-wrap; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
.error { border-left: 4px solid #ef4444; padding-left: 1rem; margin: 1rem 0; }
.recommendation { font-style: italic; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb) : vb.localeCompare(va);
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use equadiag_core::catalog::builtin;
    use equadiag_core::grader::{HeuristicGrader, QuestionGrader};
    use equadiag_core::model::Answer;
    use equadiag_core::remediation::{analyze_answers, generate_remediation_plan};

    fn make_test_report() -> DiagnosticReport {
        let catalog = builtin();
        let grader = HeuristicGrader::default();
        let solutions = [("q1", "2x = 4\nx = 2"), ("q2", "x = <10>")];

        let mut answers: Vec<Answer> = solutions
            .iter()
            .map(|(id, text)| {
                let analysis = grader.grade(catalog.question(id).unwrap(), text);
                Answer {
                    question_id: id.to_string(),
                    solution_text: text.to_string(),
                    is_correct: analysis.is_correct,
                    analysis: Some(analysis),
                }
            })
            .collect();
        answers.push(Answer {
            question_id: "q3".into(),
            solution_text: "x = 2".into(),
            is_correct: false,
            analysis: None,
        });

        let diagnostic = analyze_answers(&catalog.questions[..3], &answers);
        let plan = generate_remediation_plan(&catalog.resources, &diagnostic.skills_to_improve);
        DiagnosticReport::new(catalog.into(), "heuristic", answers, diagnostic, plan)
    }

    #[test]
    fn html_report_contains_required_elements() {
        let report = make_test_report();
        let html = generate_html(&report, &builtin().questions);

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Équations du premier degré"));
        assert!(html.contains("1/3 (33%) — À améliorer"));
        assert!(html.contains("Isolation de variable simple"));
        assert!(html.contains("Analyse des erreurs"));
        assert!(html.contains("analyse indisponible"));
        assert!(html.contains("Plan de remédiation"));
    }

    #[test]
    fn solution_text_is_escaped() {
        let html = generate_html(&make_test_report(), &builtin().questions);
        assert!(html.contains("x = &lt;10&gt;"));
        assert!(!html.contains("x = <10>"));
    }

    #[test]
    fn unknown_question_ids_are_shown() {
        let html = generate_html(&make_test_report(), &[]);
        assert!(html.contains("<td>q1</td>"));
    }

    #[test]
    fn html_report_write_to_file() {
        let report = make_test_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");

        write_html_report(&report, &builtin().questions, &path).unwrap();
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
