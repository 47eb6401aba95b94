//! Candidate answer extraction from free-text solutions.
//!
//! Two independent passes run over the text:
//!
//! 1. `x = <value>` assignments, captured literally (`x = -3/7` yields `"-3/7"`).
//! 2. Bare `a / b` fractions anywhere, evaluated to a decimal (`4/2` yields `"2"`).
//!
//! The passes are concatenated in that order and duplicates are kept, so a
//! fraction written as `x = 3/7` shows up once per pass.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static ASSIGNMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)x\s*=\s*(-?\d+\.?\d*(?:/\d+)?)").unwrap());

static FRACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-?\d+)\s*/\s*(\d+)").unwrap());

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d+\.?\d*").unwrap());

/// Which extraction pass produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    /// Literal right-hand side of an `x = ...` assignment.
    Assignment,
    /// Evaluated quotient of a bare fraction.
    Fraction,
}

/// A numeric string believed to be one of the learner's final answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    pub source: CandidateSource,
}

impl Candidate {
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// How candidate and expected strings are turned into numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FractionPolicy {
    /// Plain decimal parsing only; `"a/b"` literals never compare.
    #[default]
    Strict,
    /// Also evaluate `"a/b"` literals.
    Evaluate,
}

impl std::str::FromStr for FractionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(FractionPolicy::Strict),
            "evaluate" => Ok(FractionPolicy::Evaluate),
            other => Err(format!("unknown fraction policy: {other}")),
        }
    }
}

/// Extract candidate final answers from a solution, in pass order.
pub fn extract_candidates(text: &str) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = ASSIGNMENT_RE
        .captures_iter(text)
        .map(|c| Candidate {
            text: c[1].to_string(),
            source: CandidateSource::Assignment,
        })
        .collect();

    for caps in FRACTION_RE.captures_iter(text) {
        let (Ok(numerator), Ok(denominator)) = (caps[1].parse::<f64>(), caps[2].parse::<f64>())
        else {
            continue;
        };
        if denominator == 0.0 {
            tracing::debug!("skipping fraction with zero denominator: {}", &caps[0]);
            continue;
        }
        candidates.push(Candidate {
            text: format_decimal(numerator / denominator),
            source: CandidateSource::Fraction,
        });
    }

    candidates
}

/// Every signed decimal token in the text, in order of appearance.
pub fn numeric_tokens(text: &str) -> Vec<&str> {
    NUMBER_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// Parse a numeric string under the given policy.
///
/// Non-finite results are rejected so `"inf"` or `"1/0"` never compare.
pub fn parse_numeric(s: &str, policy: FractionPolicy) -> Option<f64> {
    let s = s.trim();
    let value = match s.parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) if policy == FractionPolicy::Evaluate => parse_fraction(s),
        Err(_) => None,
    }?;
    value.is_finite().then_some(value)
}

fn parse_fraction(s: &str) -> Option<f64> {
    let (numerator, denominator) = s.split_once('/')?;
    let numerator: f64 = numerator.trim().parse().ok()?;
    let denominator: f64 = denominator.trim().parse().ok()?;
    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator)
}

/// Shortest decimal rendering: `2.0` prints as `"2"`, `-1.5` as `"-1.5"`.
fn format_decimal(value: f64) -> String {
    if value == 0.0 {
        // Avoid "-0" for fractions like -0/5.
        return "0".to_string();
    }
    format!("{value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(Candidate::as_str).collect()
    }

    #[test]
    fn assignment_integer() {
        let c = extract_candidates("x = 2");
        assert_eq!(texts(&c), vec!["2"]);
        assert_eq!(c[0].source, CandidateSource::Assignment);
    }

    #[test]
    fn intermediate_assignments_are_candidates_too() {
        // "2x = 4" contains "x = 4"
        let c = extract_candidates("2x + 3 = 7\n2x = 4\nx = 2");
        assert_eq!(texts(&c), vec!["4", "2"]);
    }

    #[test]
    fn assignment_fraction_is_literal_then_evaluated() {
        let c = extract_candidates("x = -3/7");
        assert_eq!(c[0].text, "-3/7");
        assert_eq!(c[0].source, CandidateSource::Assignment);
        assert_eq!(c.len(), 2);
        assert_eq!(c[1].source, CandidateSource::Fraction);
        assert!(c[1].text.starts_with("-0.428571"));
    }

    #[test]
    fn bare_fraction_is_evaluated() {
        let c = extract_candidates("on divise : 4/2");
        assert_eq!(texts(&c), vec!["2"]);
        assert_eq!(c[0].source, CandidateSource::Fraction);
    }

    #[test]
    fn fraction_with_spaces() {
        let c = extract_candidates("-6 / 4");
        assert_eq!(texts(&c), vec!["-1.5"]);
    }

    #[test]
    fn uppercase_assignment() {
        let c = extract_candidates("X=5");
        assert_eq!(texts(&c), vec!["5"]);
    }

    #[test]
    fn zero_denominator_is_skipped() {
        let c = extract_candidates("5/0 puis 6/3");
        assert_eq!(texts(&c), vec!["2"]);
    }

    #[test]
    fn assignment_with_zero_denominator_stays_literal() {
        let c = extract_candidates("x = 5/0");
        assert_eq!(texts(&c), vec!["5/0"]);
        assert_eq!(parse_numeric("5/0", FractionPolicy::Evaluate), None);
    }

    #[test]
    fn no_candidates_in_prose() {
        assert!(extract_candidates("je ne sais pas").is_empty());
    }

    #[test]
    fn numeric_tokens_in_order() {
        assert_eq!(
            numeric_tokens("3x - 5 = 10\n3x = 15\nx = 5.0"),
            vec!["3", "5", "10", "3", "15", "5.0"]
        );
    }

    #[test]
    fn strict_parse_rejects_fraction_literal() {
        assert_eq!(parse_numeric("-3/7", FractionPolicy::Strict), None);
        assert_eq!(parse_numeric(" 2 ", FractionPolicy::Strict), Some(2.0));
    }

    #[test]
    fn evaluate_parse_accepts_fraction_literal() {
        let v = parse_numeric("-3/7", FractionPolicy::Evaluate).unwrap();
        assert!((v + 3.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn parse_rejects_non_finite() {
        assert_eq!(parse_numeric("inf", FractionPolicy::Strict), None);
        assert_eq!(parse_numeric("NaN", FractionPolicy::Evaluate), None);
    }

    #[test]
    fn fraction_policy_from_str() {
        assert_eq!(
            "Evaluate".parse::<FractionPolicy>().unwrap(),
            FractionPolicy::Evaluate
        );
        assert!("loose".parse::<FractionPolicy>().is_err());
    }

    mod properties {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn assignment_value_is_captured(
                prefix in "[a-w ]{0,20}",
                value in -1000i64..1000,
                suffix in "[a-w ]{0,20}",
            ) {
                let text = format!("{prefix}\nx = {value}\n{suffix}");
                let candidates = extract_candidates(&text);
                let expected = value.to_string();
                prop_assert!(candidates.iter().any(|c| c.text == expected));
            }

            #[test]
            fn bare_fraction_is_evaluated_exactly(
                numerator in -500i64..500,
                denominator in 1i64..50,
            ) {
                let text = format!("on trouve {numerator}/{denominator}");
                let candidates = extract_candidates(&text);
                prop_assert_eq!(candidates.len(), 1);
                let value: f64 = candidates[0].text.parse().unwrap();
                let expected = numerator as f64 / denominator as f64;
                prop_assert!((value - expected).abs() < 1e-9);
            }

            #[test]
            fn extraction_never_panics(text in "\\PC{0,200}") {
                let _ = extract_candidates(&text);
                let _ = numeric_tokens(&text);
            }
        }
    }
}
