//! Configuration and credentials
//!
//! [`CheckConfig`] is read from a YAML file; every field has a default, so a
//! missing file or a partial file both work. [`Credentials`] come from the
//! same file and from environment variables, with the environment winning.

use crate::check::backends::{ChatBackendConfig, SearchSynthesisConfig};
use crate::report::CitationStyle;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Environment variables read by [`Credentials::from_env`], and the
/// credential name each one supplies
pub const ENV_CREDENTIALS: [(&str, &str); 3] = [
    ("OPENAI_API_KEY", "openai_api_key"),
    ("PERPLEXITY_API_KEY", "perplexity_api_key"),
    ("SERPER_API_KEY", "serper_api_key"),
];

/// Named secrets used to authenticate against backends
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(BTreeMap<String, String>);

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// A usable credential value.
    ///
    /// Blank values and template placeholders (`sk-...`) count as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty() && !v.contains("..."))
    }

    /// Names of all usable credentials
    pub fn names(&self) -> Vec<&str> {
        self.0
            .keys()
            .map(String::as_str)
            .filter(|name| self.get(name).is_some())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.names().is_empty()
    }

    /// Credentials from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Credentials from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut credentials = Self::new();
        for (var, name) in ENV_CREDENTIALS {
            if let Some(value) = lookup(var) {
                credentials.insert(name, value);
            }
        }
        credentials
    }

    /// Overlay `other` on top of `self`; usable values in `other` win
    pub fn merged_with(&self, other: &Credentials) -> Credentials {
        let mut merged = self.clone();
        for name in other.names() {
            if let Some(value) = other.get(name) {
                merged.insert(name, value);
            }
        }
        merged
    }
}

/// One backend entry in the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendSpec {
    /// Single chat-completion call
    Chat(ChatBackendConfig),
    /// Web search feeding a chat-completion call
    SearchSynthesis(SearchSynthesisConfig),
}

impl BackendSpec {
    pub fn name(&self) -> &str {
        match self {
            BackendSpec::Chat(config) => &config.name,
            BackendSpec::SearchSynthesis(config) => &config.name,
        }
    }
}

/// Fact-check engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Per-backend timeout in seconds
    pub timeout_seconds: u64,
    /// Page context is cut to this many characters before prompting
    pub max_context_chars: usize,
    /// How citation markers are rendered in the final report
    pub citation_style: CitationStyle,
    /// Backends to query, in label order
    pub backends: Vec<BackendSpec>,
    /// Credentials stored in the file (environment overrides these)
    pub credentials: Credentials,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_context_chars: 4_000,
            citation_style: CitationStyle::default(),
            backends: default_backends(),
            credentials: Credentials::new(),
        }
    }
}

fn default_backends() -> Vec<BackendSpec> {
    vec![
        BackendSpec::Chat(ChatBackendConfig::openai()),
        BackendSpec::Chat(ChatBackendConfig::perplexity()),
        BackendSpec::SearchSynthesis(SearchSynthesisConfig::default()),
    ]
}

impl CheckConfig {
    /// Parse configuration from YAML text
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&text)
    }

    /// Load from an explicit path, or from the default path if it exists.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::load(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "timeout_seconds must be greater than zero".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for backend in &self.backends {
            if backend.name().trim().is_empty() {
                return Err(ConfigError::Invalid("backend name must not be empty".to_string()));
            }
            if !names.insert(backend.name()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate backend name '{}'",
                    backend.name()
                )));
            }
        }

        Ok(())
    }

    /// File credentials overlaid with environment credentials
    pub fn resolve_credentials(&self, environment: &Credentials) -> Credentials {
        self.credentials.merged_with(environment)
    }
}

/// Default config location (`~/.config/crosscheck/config.yaml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("crosscheck").join("config.yaml"))
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config: {0}")]
    Io(String),

    #[error("Invalid config syntax: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_cover_three_backends() {
        let config = CheckConfig::default();
        let names: Vec<_> = config.backends.iter().map(BackendSpec::name).collect();

        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(names, vec!["OpenAI", "Perplexity", "Web Search"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = CheckConfig::from_yaml("timeout_seconds: 5\ncitation_style: markdown\n").unwrap();

        assert_eq!(config.timeout_seconds, 5);
        assert_eq!(config.citation_style, CitationStyle::Markdown);
        assert_eq!(config.max_context_chars, 4_000);
        assert_eq!(config.backends.len(), 3);
    }

    #[test]
    fn yaml_backends_and_credentials() {
        let yaml = r#"
backends:
  - kind: chat
    name: Local
    base_url: http://localhost:8080/v1
    model: llama3
    credential: local_key
credentials:
  local_key: secret
"#;
        let config = CheckConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.backends.len(), 1);
        match &config.backends[0] {
            BackendSpec::Chat(chat) => {
                assert_eq!(chat.base_url, "http://localhost:8080/v1");
                assert_eq!(chat.model, "llama3");
            }
            other => panic!("unexpected backend: {other:?}"),
        }
        assert_eq!(config.credentials.get("local_key"), Some("secret"));
    }

    #[test]
    fn duplicate_backend_names_rejected() {
        let yaml = r#"
backends:
  - { kind: chat, name: Same, base_url: "http://a", model: m, credential: k }
  - { kind: chat, name: Same, base_url: "http://b", model: m, credential: k }
"#;
        assert!(matches!(
            CheckConfig::from_yaml(yaml),
            Err(ConfigError::Invalid(msg)) if msg.contains("Same")
        ));
    }

    #[test]
    fn zero_timeout_rejected() {
        assert!(matches!(
            CheckConfig::from_yaml("timeout_seconds: 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn bad_syntax_is_parse_error() {
        assert!(matches!(
            CheckConfig::from_yaml("timeout_seconds: [unclosed"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_context_chars: 100").unwrap();

        let config = CheckConfig::load_or_default(Some(file.path())).unwrap();
        assert_eq!(config.max_context_chars, 100);
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(matches!(
            CheckConfig::load_or_default(Some(&missing)),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn blank_and_placeholder_credentials_are_absent() {
        let credentials = Credentials::new()
            .with("a", "  ")
            .with("b", "sk-...")
            .with("c", " real-key ");

        assert_eq!(credentials.get("a"), None);
        assert_eq!(credentials.get("b"), None);
        assert_eq!(credentials.get("c"), Some("real-key"));
        assert_eq!(credentials.names(), vec!["c"]);
    }

    #[test]
    fn environment_overrides_file() {
        let env = Credentials::from_lookup(|var| match var {
            "OPENAI_API_KEY" => Some("env-openai".to_string()),
            "SERPER_API_KEY" => Some(String::new()),
            _ => None,
        });
        let config = CheckConfig {
            credentials: Credentials::new()
                .with("openai_api_key", "file-openai")
                .with("serper_api_key", "file-serper"),
            ..CheckConfig::default()
        };

        let resolved = config.resolve_credentials(&env);
        assert_eq!(resolved.get("openai_api_key"), Some("env-openai"));
        assert_eq!(resolved.get("serper_api_key"), Some("file-serper"));
        assert_eq!(resolved.get("perplexity_api_key"), None);
    }
}
