use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable that switches on error details in 500 responses
/// when set to `development`.
pub const ENV_MODE_VAR: &str = "LUACHAT_ENV";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Include raw error text in 500 responses.
    #[serde(default)]
    pub expose_error_details: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            expose_error_details: false,
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Bearer credential; `${VAR}` references are expanded from the environment.
    #[serde(default = "default_api_key")]
    pub api_key: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            api_key: default_api_key(),
        }
    }
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}
fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_max_tokens() -> u32 {
    1500
}
fn default_temperature() -> f32 {
    0.3
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_api_key() -> String {
    "${OPENAI_API_KEY}".to_string()
}

impl CompletionConfig {
    /// The expanded credential, or `None` when it resolves to an empty string.
    pub fn resolve_api_key(&self) -> Option<String> {
        let key = expand_env_vars(&self.api_key);
        let key = key.trim();
        if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogConfig {
    /// TOML file of `[[snippet]]` entries.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Keep the builtin snippets ahead of the file entries.
    #[serde(default)]
    pub include_builtin: bool,
}

impl Config {
    /// Whether 500 responses carry raw error text, honoring [`ENV_MODE_VAR`].
    pub fn expose_error_details(&self) -> bool {
        self.server.expose_error_details
            || std::env::var(ENV_MODE_VAR)
                .map(|v| v.eq_ignore_ascii_case("development"))
                .unwrap_or(false)
    }
}

/// Expand `${VAR_NAME}` patterns in a string from the process environment.
///
/// Substituted values are not expanded again.
pub fn expand_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut pos = 0;
    while let Some(offset) = result[pos..].find("${") {
        let start = pos + offset;
        let end = match result[start..].find('}') {
            Some(p) => start + p,
            None => break,
        };
        let var_name = &result[start + 2..end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[end + 1..]);
        pos = start + value.len();
    }
    result
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;

    Ok(config)
}

/// Load `path` if given, otherwise `default_path` if it exists, otherwise
/// built-in defaults.
pub fn load_or_default(path: Option<&Path>, default_path: &Path) -> Result<Config> {
    match path {
        Some(p) => load_config(p),
        None if default_path.exists() => load_config(default_path),
        None => Ok(Config::default()),
    }
}

fn validate(config: &Config) -> Result<()> {
    let c = &config.completion;

    if c.endpoint.trim().is_empty() {
        bail!("completion.endpoint must not be empty");
    }
    if c.model.trim().is_empty() {
        bail!("completion.model must not be empty");
    }
    if c.max_tokens == 0 {
        bail!("completion.max_tokens must be > 0");
    }
    if !(0.0..=2.0).contains(&c.temperature) {
        bail!("completion.temperature must be in [0.0, 2.0]");
    }
    if c.timeout_secs == 0 {
        bail!("completion.timeout_secs must be > 0");
    }
    if config.server.bind.trim().is_empty() {
        bail!("server.bind must not be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(tmp: &TempDir, body: &str) -> PathBuf {
        let path = tmp.path().join("luachat.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let cfg = load_config(&write(&tmp, "")).unwrap();
        assert_eq!(cfg.completion.model, "gpt-3.5-turbo");
        assert_eq!(cfg.completion.max_tokens, 1500);
        assert!((cfg.completion.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(cfg.server.bind, "127.0.0.1:3000");
        assert!(cfg.catalog.path.is_none());
    }

    #[test]
    fn test_overrides() {
        let tmp = TempDir::new().unwrap();
        let cfg = load_config(&write(
            &tmp,
            r#"
[server]
bind = "0.0.0.0:8080"
expose_error_details = true

[completion]
model = "gpt-4o-mini"
temperature = 0.7

[catalog]
path = "snippets.toml"
include_builtin = true
"#,
        ))
        .unwrap();
        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
        assert!(cfg.expose_error_details());
        assert_eq!(cfg.completion.model, "gpt-4o-mini");
        assert_eq!(cfg.catalog.path, Some(PathBuf::from("snippets.toml")));
        assert!(cfg.catalog.include_builtin);
    }

    #[test]
    fn test_rejects_bad_values() {
        let tmp = TempDir::new().unwrap();
        assert!(load_config(&write(&tmp, "[completion]\nmax_tokens = 0\n")).is_err());
        assert!(load_config(&write(&tmp, "[completion]\ntemperature = 3.5\n")).is_err());
        assert!(load_config(&write(&tmp, "[completion]\nmodel = \"\"\n")).is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.toml");
        assert!(load_or_default(Some(missing.as_path()), &missing).is_err());
        assert!(load_or_default(None, &missing).is_ok());
    }

    #[test]
    fn test_expand_env_vars_does_not_reexpand_values() {
        std::env::set_var("LUACHAT_TEST_SELF_REF", "a${LUACHAT_TEST_SELF_REF}b");
        assert_eq!(
            expand_env_vars("x ${LUACHAT_TEST_SELF_REF} y"),
            "x a${LUACHAT_TEST_SELF_REF}b y"
        );
    }

    #[test]
    fn test_expand_env_vars_multiple() {
        std::env::set_var("LUACHAT_TEST_PART_A", "one");
        std::env::set_var("LUACHAT_TEST_PART_B", "two");
        assert_eq!(
            expand_env_vars("${LUACHAT_TEST_PART_A}-${LUACHAT_TEST_PART_B}-${LUACHAT_TEST_UNSET}"),
            "one-two-"
        );
    }

    #[test]
    fn test_resolve_api_key() {
        std::env::set_var("LUACHAT_TEST_KEY_PRESENT", "sk-test");
        let cfg = CompletionConfig {
            api_key: "${LUACHAT_TEST_KEY_PRESENT}".to_string(),
            ..Default::default()
        };
        assert_eq!(cfg.resolve_api_key().as_deref(), Some("sk-test"));

        let cfg = CompletionConfig {
            api_key: "${LUACHAT_TEST_KEY_ABSENT}".to_string(),
            ..Default::default()
        };
        assert_eq!(cfg.resolve_api_key(), None);

        let cfg = CompletionConfig {
            api_key: "literal-key".to_string(),
            ..Default::default()
        };
        assert_eq!(cfg.resolve_api_key().as_deref(), Some("literal-key"));
    }
}
