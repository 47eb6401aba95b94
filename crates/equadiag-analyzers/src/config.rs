//! Analyzer configuration and factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use equadiag_core::catalog::Catalog;
use equadiag_core::extract::FractionPolicy;
use equadiag_core::grader::GraderConfig;
use equadiag_core::traits::{QuestionSource, SolutionAnalyzer};

use crate::chat::ChatAnalyzer;
use crate::heuristic::HeuristicAnalyzer;
use crate::questions::{RemoteQuestionSource, StaticQuestionSource};
use crate::remote::RemoteAnalyzer;

/// Which analyzer scores solutions.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnalyzerConfig {
    #[default]
    Heuristic,
    Remote {
        base_url: String,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
    Chat {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        model: String,
    },
}

impl std::fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalyzerConfig::Heuristic => f.write_str("Heuristic"),
            AnalyzerConfig::Remote {
                base_url,
                timeout_secs,
            } => f
                .debug_struct("Remote")
                .field("base_url", base_url)
                .field("timeout_secs", timeout_secs)
                .finish(),
            AnalyzerConfig::Chat {
                api_key: _,
                base_url,
                model,
            } => f
                .debug_struct("Chat")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("model", model)
                .finish(),
        }
    }
}

/// Top-level equadiag configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquadiagConfig {
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    /// Base URL of the question generation service.
    #[serde(default)]
    pub backend_url: Option<String>,
    /// How fraction literals are compared by the heuristic analyzer.
    #[serde(default)]
    pub fraction_policy: FractionPolicy,
    /// Catalog file or directory; the built-in catalog when unset.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./equadiag-reports")
}

impl Default for EquadiagConfig {
    fn default() -> Self {
        Self {
            analyzer: AnalyzerConfig::default(),
            backend_url: None,
            fraction_policy: FractionPolicy::default(),
            catalog: None,
            output_dir: default_output_dir(),
        }
    }
}

impl EquadiagConfig {
    /// Question service URL: `backend_url`, else the remote analyzer's base URL.
    pub fn question_backend(&self) -> Option<&str> {
        match (&self.backend_url, &self.analyzer) {
            (Some(url), _) => Some(url.as_str()),
            (None, AnalyzerConfig::Remote { base_url, .. }) => Some(base_url.as_str()),
            _ => None,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_analyzer_config(config: &AnalyzerConfig) -> AnalyzerConfig {
    match config {
        AnalyzerConfig::Heuristic => AnalyzerConfig::Heuristic,
        AnalyzerConfig::Remote {
            base_url,
            timeout_secs,
        } => AnalyzerConfig::Remote {
            base_url: resolve_env_vars(base_url),
            timeout_secs: *timeout_secs,
        },
        AnalyzerConfig::Chat {
            api_key,
            base_url,
            model,
        } => AnalyzerConfig::Chat {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            model: resolve_env_vars(model),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `equadiag.toml` in the current directory
/// 2. `~/.config/equadiag/config.toml`
///
/// Environment variable overrides: `EQUADIAG_BACKEND_URL`, `EQUADIAG_API_KEY`.
pub fn load_config() -> Result<EquadiagConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<EquadiagConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("equadiag.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => EquadiagConfig::default(),
    };

    Ok(apply_env_overrides(config))
}

/// Parse a config file body and resolve `${VAR}` references.
pub fn parse_config(content: &str) -> Result<EquadiagConfig> {
    let mut config: EquadiagConfig = toml::from_str(content)?;
    config.analyzer = resolve_analyzer_config(&config.analyzer);
    config.backend_url = config.backend_url.as_deref().map(resolve_env_vars);
    Ok(config)
}

fn apply_env_overrides(mut config: EquadiagConfig) -> EquadiagConfig {
    if let Ok(url) = std::env::var("EQUADIAG_BACKEND_URL") {
        config.backend_url = Some(url);
    }

    if let Ok(key) = std::env::var("EQUADIAG_API_KEY") {
        if let AnalyzerConfig::Chat { api_key, .. } = &mut config.analyzer {
            *api_key = key;
        }
    }

    config
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("equadiag"))
}

/// Create the configured analyzer.
pub fn create_analyzer(config: &EquadiagConfig) -> Result<Arc<dyn SolutionAnalyzer>> {
    let analyzer: Arc<dyn SolutionAnalyzer> = match &config.analyzer {
        AnalyzerConfig::Heuristic => Arc::new(HeuristicAnalyzer::new(GraderConfig {
            fraction_policy: config.fraction_policy,
        })),
        AnalyzerConfig::Remote {
            base_url,
            timeout_secs,
        } => Arc::new(RemoteAnalyzer::new(base_url, *timeout_secs)?),
        AnalyzerConfig::Chat {
            api_key,
            base_url,
            model,
        } => {
            anyhow::ensure!(
                !api_key.is_empty(),
                "chat analyzer needs an API key (set api_key or EQUADIAG_API_KEY)"
            );
            Arc::new(ChatAnalyzer::new(api_key, base_url.clone(), model)?)
        }
    };
    tracing::debug!(analyzer = analyzer.name(), "analyzer created");
    Ok(analyzer)
}

/// The remote generator when a question backend is configured, otherwise the catalog.
pub fn create_question_source(
    config: &EquadiagConfig,
    catalog: &Catalog,
) -> Result<Box<dyn QuestionSource>> {
    match config.question_backend() {
        Some(url) => Ok(Box::new(RemoteQuestionSource::new(url, None)?)),
        None => Ok(Box::new(StaticQuestionSource::new(catalog.questions.clone()))),
    }
}
