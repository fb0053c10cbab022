//! Configuration loading and generator factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizforge_core::engine::QuizEngineConfig;
use quizforge_core::traits::QuestionGenerator;

use crate::openai::{OpenAiGenerator, DEFAULT_MODEL};

/// Name of the per-project config file.
pub const CONFIG_FILE_NAME: &str = "quizforge.toml";

/// Environment variables that supply an API key, highest priority first.
pub const API_KEY_ENV_VARS: [&str; 2] = ["QUIZFORGE_OPENAI_KEY", "OPENAI_API_KEY"];

/// Settings for the external question generator.
///
/// Note: Custom Debug impl masks the API key to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub org_id: Option<String>,
}

impl std::fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("org_id", &self.org_id)
            .finish()
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            model: default_model(),
            org_id: None,
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

/// Top-level quizforge configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizforgeConfig {
    /// Address the HTTP server listens on.
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_question_count")]
    pub default_question_count: usize,
    #[serde(default = "default_min_questions")]
    pub min_question_count: usize,
    #[serde(default = "default_max_questions")]
    pub max_question_count: usize,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Upper bound on one generator call, in seconds.
    #[serde(default = "default_generator_timeout")]
    pub generator_timeout_secs: u64,
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold_percent: u8,
    /// External generator. Absent or keyless means local generation only.
    #[serde(default)]
    pub generator: Option<GeneratorConfig>,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}
fn default_question_count() -> usize {
    10
}
fn default_min_questions() -> usize {
    5
}
fn default_max_questions() -> usize {
    50
}
fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}
fn default_generator_timeout() -> u64 {
    60
}
fn default_pass_threshold() -> u8 {
    70
}

impl Default for QuizforgeConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            default_question_count: default_question_count(),
            min_question_count: default_min_questions(),
            max_question_count: default_max_questions(),
            max_upload_bytes: default_max_upload_bytes(),
            generator_timeout_secs: default_generator_timeout(),
            pass_threshold_percent: default_pass_threshold(),
            generator: None,
        }
    }
}

impl QuizforgeConfig {
    /// The engine settings this config describes.
    pub fn engine_config(&self) -> QuizEngineConfig {
        QuizEngineConfig {
            default_question_count: self.default_question_count,
            min_question_count: self.min_question_count,
            max_question_count: self.max_question_count,
            max_upload_bytes: self.max_upload_bytes,
            generator_timeout: Duration::from_secs(self.generator_timeout_secs),
            pass_threshold_percent: self.pass_threshold_percent.min(100),
        }
    }

    /// The generator settings, if a usable API key is present.
    pub fn active_generator(&self) -> Option<&GeneratorConfig> {
        self.generator
            .as_ref()
            .filter(|g| !g.api_key.trim().is_empty())
    }

    /// Apply API key overrides from `lookup` (normally the process environment).
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let key = API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.trim().is_empty());
        if let Some(key) = key {
            self.generator.get_or_insert_with(GeneratorConfig::default).api_key = key;
        }
    }

    /// Resolve `${VAR}` references in string values.
    pub fn resolve_env_refs(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        self.bind = resolve_env_vars(&self.bind, &lookup);
        if let Some(generator) = &mut self.generator {
            generator.api_key = resolve_env_vars(&generator.api_key, &lookup);
            generator.model = resolve_env_vars(&generator.model, &lookup);
            generator.base_url = generator
                .base_url
                .as_deref()
                .map(|u| resolve_env_vars(u, &lookup));
            generator.org_id = generator
                .org_id
                .as_deref()
                .map(|o| resolve_env_vars(o, &lookup));
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Unset variables resolve to the empty string.
fn resolve_env_vars(s: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
    let mut result = s.to_string();
    let mut from = 0;
    while let Some(offset) = result[from..].find("${") {
        let start = from + offset;
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = lookup(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
        from = start + value.len();
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizforge.toml` in the current directory
/// 2. `~/.config/quizforge/config.toml`
///
/// Environment variable overrides: `QUIZFORGE_OPENAI_KEY`, then `OPENAI_API_KEY`.
pub fn load_config() -> Result<QuizforgeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizforgeConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => search_paths().into_iter().find(|p| p.exists()),
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<QuizforgeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizforgeConfig::default(),
    };

    let env = |name: &str| std::env::var(name).ok();
    config.resolve_env_refs(env);
    config.apply_env_overrides(env);

    tracing::debug!(
        path = ?config_path,
        generator = config.active_generator().is_some(),
        "configuration loaded"
    );
    Ok(config)
}

fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs_path() {
        paths.push(dir.join("config.toml"));
    }
    paths
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizforge"))
}

/// Create a generator instance from its configuration.
pub fn create_generator(
    config: &GeneratorConfig,
    timeout_secs: u64,
) -> Result<Arc<dyn QuestionGenerator>> {
    let generator = OpenAiGenerator::with_timeout(
        &config.api_key,
        config.base_url.clone(),
        Some(config.model.clone()),
        config.org_id.clone(),
        timeout_secs,
    )?;
    Ok(Arc::new(generator))
}

/// Commented starter file written by `quizforge init`.
pub const STARTER_CONFIG: &str = r#"# quizforge configuration

# Address the HTTP server listens on.
bind = "127.0.0.1:3000"

# Question counts: uploads without a count get the default; everything is
# clamped into min..=max.
default_question_count = 10
min_question_count = 5
max_question_count = 50

# Largest accepted upload, in bytes (20 MiB).
max_upload_bytes = 20971520

# Minimum score, in percent, that counts as a pass.
pass_threshold_percent = 70

# Upper bound on one call to the external question generator.
generator_timeout_secs = 60

# Uncomment to generate questions with an OpenAI-compatible API. Without a
# key, questions come from the local text heuristics. QUIZFORGE_OPENAI_KEY or
# OPENAI_API_KEY in the environment also enable it.
#
# [generator]
# api_key = "${OPENAI_API_KEY}"
# model = "gpt-4o"
# base_url = "https://api.openai.com"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn resolve_env_vars_basic() {
        let lookup = env(&[("_QUIZFORGE_TEST_VAR", "hello")]);
        assert_eq!(resolve_env_vars("${_QUIZFORGE_TEST_VAR}", &lookup), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_QUIZFORGE_TEST_VAR}_suffix", &lookup),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${UNSET}-x", &lookup), "-x");
        assert_eq!(resolve_env_vars("${unterminated", &lookup), "${unterminated");
    }

    #[test]
    fn resolved_value_is_not_rescanned() {
        let lookup = env(&[("A", "${B}"), ("B", "loop")]);
        assert_eq!(resolve_env_vars("${A}", &lookup), "${B}");
    }

    #[test]
    fn default_config() {
        let config = QuizforgeConfig::default();
        assert_eq!(config.bind, "127.0.0.1:3000");
        assert_eq!(config.default_question_count, 10);
        assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
        assert!(config.active_generator().is_none());

        let engine = config.engine_config();
        assert_eq!(engine.min_question_count, 5);
        assert_eq!(engine.max_question_count, 50);
        assert_eq!(engine.generator_timeout, Duration::from_secs(60));
        assert_eq!(engine.pass_threshold_percent, 70);
    }

    #[test]
    fn parse_partial_config() {
        let config: QuizforgeConfig = toml::from_str(
            r#"
bind = "0.0.0.0:8080"
max_question_count = 30

[generator]
api_key = "sk-test"
"#,
        )
        .unwrap();
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert_eq!(config.max_question_count, 30);
        assert_eq!(config.min_question_count, 5);
        let generator = config.active_generator().unwrap();
        assert_eq!(generator.model, "gpt-4o");
        assert_eq!(generator.base_url, None);
    }

    #[test]
    fn starter_config_parses_to_defaults() {
        let config: QuizforgeConfig = toml::from_str(STARTER_CONFIG).unwrap();
        assert_eq!(config, QuizforgeConfig::default());
    }

    #[test]
    fn env_overrides_prefer_quizforge_key() {
        let mut config = QuizforgeConfig::default();
        config.apply_env_overrides(env(&[
            ("QUIZFORGE_OPENAI_KEY", "sk-quizforge"),
            ("OPENAI_API_KEY", "sk-openai"),
        ]));
        assert_eq!(config.active_generator().unwrap().api_key, "sk-quizforge");

        let mut config = QuizforgeConfig::default();
        config.apply_env_overrides(env(&[("QUIZFORGE_OPENAI_KEY", ""), ("OPENAI_API_KEY", "sk-openai")]));
        assert_eq!(config.active_generator().unwrap().api_key, "sk-openai");

        let mut config = QuizforgeConfig::default();
        config.apply_env_overrides(env(&[]));
        assert!(config.generator.is_none());
    }

    #[test]
    fn env_refs_resolved_in_generator() {
        let mut config: QuizforgeConfig = toml::from_str(
            r#"
[generator]
api_key = "${MY_KEY}"
base_url = "http://${HOST}:9000"
"#,
        )
        .unwrap();
        config.resolve_env_refs(env(&[("MY_KEY", "sk-env"), ("HOST", "localhost")]));
        let generator = config.active_generator().unwrap();
        assert_eq!(generator.api_key, "sk-env");
        assert_eq!(generator.base_url.as_deref(), Some("http://localhost:9000"));

        // An unset reference leaves the generator inactive.
        let mut keyless: QuizforgeConfig =
            toml::from_str("[generator]\napi_key = \"${MISSING_KEY}\"\n").unwrap();
        keyless.resolve_env_refs(env(&[]));
        assert!(keyless.active_generator().is_none());
    }

    #[test]
    fn debug_masks_api_key() {
        let config = GeneratorConfig {
            api_key: "sk-secret-value".into(),
            ..GeneratorConfig::default()
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("sk-secret-value"));
        assert!(printed.contains("***"));
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "default_question_count = 12\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.default_question_count, 12);

        let missing = dir.path().join("nope.toml");
        let err = load_config_from(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("config file not found"));

        std::fs::write(&path, "default_question_count = \"many\"\n").unwrap();
        let err = load_config_from(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config"));
    }

    #[test]
    fn create_generator_requires_key() {
        assert!(create_generator(&GeneratorConfig::default(), 5).is_err());
        let generator = create_generator(
            &GeneratorConfig {
                api_key: "sk-test".into(),
                ..GeneratorConfig::default()
            },
            5,
        )
        .unwrap();
        assert_eq!(generator.name(), "openai");
    }
}
