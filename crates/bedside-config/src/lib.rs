#![deny(unsafe_code)]

//! Configuration loading, environment overrides, and validation for Bedside.
//!
//! Loads TOML configuration files and validates them against expected schemas.
//! Provides the [`AppConfig`] type as the central configuration structure.
//! A handful of deployment settings (`PORT`, `ALLOWED_ORIGIN`, `BEDSIDE_MODEL`)
//! can be overridden from the environment, and the completion-service API key
//! is only ever read from the environment variable named in `[llm]`.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("missing secret: environment variable {0} is not set")]
    MissingSecret(String),
}

/// Persona presets shipped with the engine.
pub const PERSONA_PRESETS: [&str; 4] = ["patient", "doctor", "plain", "custom"];

/// Reply formatting styles understood by the formatter.
pub const FORMAT_STYLES: [&str; 3] = ["numbered-heading", "inline-style", "none"];

/// Placeholder an input template must contain.
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Top-level application configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP front door configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Completion service configuration.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Conversation session configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// Active persona.
    #[serde(default)]
    pub persona: PersonaConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration for the HTTP front door.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Port the server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Single origin allowed by CORS. `None` allows any origin.
    #[serde(default)]
    pub allowed_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
            allowed_origin: None,
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

/// Completion service configuration.
///
/// Any endpoint speaking the OpenAI Chat Completions format works here;
/// the defaults point at Groq.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Full URL of the chat completions endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum tokens to generate per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature (0.0–2.0).
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl LlmConfig {
    /// The per-call timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ConfigError::MissingSecret(self.api_key_env.clone())),
        }
    }
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "llama3-8b-8192".to_string()
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.7
}

/// Conversation session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Number of past turns kept as conversational context.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Maximum number of concurrently tracked sessions.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            max_sessions: default_max_sessions(),
        }
    }
}

fn default_history_capacity() -> usize {
    6
}

fn default_max_sessions() -> usize {
    256
}

/// Persona selection.
///
/// `preset` picks one of the built-in personas; the optional fields override
/// parts of it. With `preset = "custom"` the `instruction` is mandatory.
///
/// ## TOML Example
///
/// ```toml
/// [persona]
/// preset = "doctor"
/// input_template = "Patient says: {input}"
/// style = "none"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Built-in persona: "patient", "doctor", "plain", or "custom".
    #[serde(default = "default_persona_preset")]
    pub preset: String,

    /// Replacement system instruction.
    #[serde(default)]
    pub instruction: Option<String>,

    /// Template wrapping each new input; must contain `{input}`.
    #[serde(default)]
    pub input_template: Option<String>,

    /// Formatting style: "numbered-heading", "inline-style", or "none".
    #[serde(default)]
    pub style: Option<String>,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            preset: default_persona_preset(),
            instruction: None,
            input_template: None,
            style: None,
        }
    }
}

impl PersonaConfig {
    /// Check the preset and style names, the custom instruction, and the
    /// input template placeholder.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !PERSONA_PRESETS.contains(&self.preset.as_str()) {
            return Err(ConfigError::Validation(format!(
                "persona.preset must be one of {:?}, got {:?}",
                PERSONA_PRESETS, self.preset
            )));
        }
        match self.instruction.as_deref() {
            Some(instruction) if instruction.trim().is_empty() => {
                return Err(ConfigError::Validation(
                    "persona.instruction must not be blank".to_string(),
                ));
            }
            None if self.preset == "custom" => {
                return Err(ConfigError::Validation(
                    "persona.instruction is required when preset is \"custom\"".to_string(),
                ));
            }
            _ => {}
        }
        if let Some(ref template) = self.input_template
            && !template.contains(INPUT_PLACEHOLDER)
        {
            return Err(ConfigError::Validation(format!(
                "persona.input_template must contain the {INPUT_PLACEHOLDER} placeholder, got {template:?}"
            )));
        }
        if let Some(ref style) = self.style
            && !FORMAT_STYLES.contains(&style.as_str())
        {
            return Err(ConfigError::Validation(format!(
                "persona.style must be one of {FORMAT_STYLES:?}, got {style:?}"
            )));
        }
        Ok(())
    }
}

fn default_persona_preset() -> String {
    "patient".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides using `lookup` to resolve variable names. Pass
    /// `|key| std::env::var(key).ok()` to read the process environment.
    ///
    /// Recognised variables: `PORT`, `ALLOWED_ORIGIN`, `BEDSIDE_MODEL`.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port.trim().parse().map_err(|_| {
                ConfigError::Validation(format!("PORT must be a valid port number, got {port:?}"))
            })?;
            debug!(port = self.server.port, "port overridden from environment");
        }
        if let Some(origin) = lookup("ALLOWED_ORIGIN") {
            let origin = origin.trim();
            self.server.allowed_origin = (!origin.is_empty()).then(|| origin.to_string());
        }
        if let Some(model) = lookup("BEDSIDE_MODEL") {
            self.llm.model = model;
        }
        self.validate()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port must be non-zero".to_string(),
            ));
        }
        if self.server.listen_addr.is_empty() {
            return Err(ConfigError::Validation(
                "server.listen_addr must not be empty".to_string(),
            ));
        }

        // Completion service
        if !self.llm.base_url.starts_with("http://") && !self.llm.base_url.starts_with("https://")
        {
            return Err(ConfigError::Validation(format!(
                "llm.base_url must be an http(s) URL, got {:?}",
                self.llm.base_url
            )));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Validation(
                "llm.model must not be empty".to_string(),
            ));
        }
        if self.llm.api_key_env.is_empty() {
            return Err(ConfigError::Validation(
                "llm.api_key_env must not be empty".to_string(),
            ));
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "llm.timeout_secs must be at least 1".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Validation(format!(
                "llm.temperature must be in [0.0, 2.0], got {}",
                self.llm.temperature
            )));
        }

        // Sessions
        if self.session.history_capacity == 0 {
            return Err(ConfigError::Validation(
                "session.history_capacity must be at least 1".to_string(),
            ));
        }
        if self.session.max_sessions == 0 {
            return Err(ConfigError::Validation(
                "session.max_sessions must be at least 1".to_string(),
            ));
        }

        self.persona.validate()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.listen_addr, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.llm.model, "llama3-8b-8192");
        assert_eq!(config.llm.api_key_env, "GROQ_API_KEY");
        assert_eq!(config.session.history_capacity, 6);
        assert_eq!(config.persona.preset, "patient");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.llm.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
            [server]
            listen_addr = "127.0.0.1"
            port = 8080
            allowed_origin = "https://clinic.example.com"

            [llm]
            base_url = "http://localhost:11434/v1/chat/completions"
            model = "llama3"
            api_key_env = "LOCAL_KEY"
            timeout_secs = 5
            max_tokens = 256
            temperature = 0.2

            [session]
            history_capacity = 5
            max_sessions = 10

            [persona]
            preset = "doctor"
            input_template = "Patient says: {input}"
            style = "none"

            [logging]
            level = "debug"
        "#;
        let config = AppConfig::parse(toml).unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.server.allowed_origin.as_deref(),
            Some("https://clinic.example.com")
        );
        assert_eq!(config.llm.model, "llama3");
        assert_eq!(config.llm.timeout(), Duration::from_secs(5));
        assert_eq!(config.llm.max_tokens, 256);
        assert_eq!(config.session.history_capacity, 5);
        assert_eq!(config.session.max_sessions, 10);
        assert_eq!(config.persona.preset, "doctor");
        assert_eq!(config.persona.style.as_deref(), Some("none"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validation_rejects_zero_port() {
        let result = AppConfig::parse("[server]\nport = 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_empty_addr() {
        let result = AppConfig::parse("[server]\nlisten_addr = \"\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_non_http_base_url() {
        let result = AppConfig::parse("[llm]\nbase_url = \"ftp://example.com\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let result = AppConfig::parse("[llm]\ntimeout_secs = 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_bad_temperature() {
        let result = AppConfig::parse("[llm]\ntemperature = 3.5\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_zero_history() {
        let result = AppConfig::parse("[session]\nhistory_capacity = 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_preset() {
        let result = AppConfig::parse("[persona]\npreset = \"pirate\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_custom_preset_requires_instruction() {
        let result = AppConfig::parse("[persona]\npreset = \"custom\"\n");
        assert!(result.is_err());

        let config = AppConfig::parse(
            "[persona]\npreset = \"custom\"\ninstruction = \"You are a pharmacist.\"\n",
        )
        .unwrap();
        assert_eq!(
            config.persona.instruction.as_deref(),
            Some("You are a pharmacist.")
        );
    }

    #[test]
    fn test_blank_instruction_rejected_for_any_preset() {
        let persona = PersonaConfig {
            preset: "doctor".to_string(),
            instruction: Some("   ".to_string()),
            ..PersonaConfig::default()
        };
        assert!(matches!(persona.validate(), Err(ConfigError::Validation(_))));
        assert!(PersonaConfig::default().validate().is_ok());
    }

    #[test]
    fn test_template_requires_placeholder() {
        let result = AppConfig::parse("[persona]\ninput_template = \"no placeholder\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_style() {
        let result = AppConfig::parse("[persona]\nstyle = \"fancy\"\n");
        assert!(result.is_err());
    }

    // ── Environment overrides ─────────────────────────────────────────

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PORT", "7000"),
            ("ALLOWED_ORIGIN", "https://app.example.com"),
            ("BEDSIDE_MODEL", "llama3-70b-8192"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_overrides_from(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.server.port, 7000);
        assert_eq!(
            config.server.allowed_origin.as_deref(),
            Some("https://app.example.com")
        );
        assert_eq!(config.llm.model, "llama3-70b-8192");
    }

    #[test]
    fn test_env_override_rejects_bad_port() {
        let mut config = AppConfig::default();
        let result = config.apply_overrides_from(|k| (k == "PORT").then(|| "http".to_string()));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_blank_allowed_origin_clears_it() {
        let mut config = AppConfig::default();
        config.server.allowed_origin = Some("https://old.example.com".to_string());
        config
            .apply_overrides_from(|k| (k == "ALLOWED_ORIGIN").then(|| "  ".to_string()))
            .unwrap();
        assert_eq!(config.server.allowed_origin, None);
    }

    #[test]
    fn test_missing_api_key() {
        let llm = LlmConfig {
            api_key_env: "BEDSIDE_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..LlmConfig::default()
        };
        let err = llm.api_key().unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecret(_)));
        assert!(err.to_string().contains("BEDSIDE_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    // ── Async file-based loading ──────────────────────────────────────

    #[tokio::test]
    async fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bedside.toml");
        tokio::fs::write(&path, b"[server]\nport = 4242\n\n[session]\nhistory_capacity = 2\n")
            .await
            .unwrap();

        let config = AppConfig::load(&path).await.unwrap();
        assert_eq!(config.server.port, 4242);
        assert_eq!(config.session.history_capacity, 2);
    }

    #[tokio::test]
    async fn test_load_nonexistent_file() {
        let result = AppConfig::load(Path::new("/nonexistent/file.toml")).await;
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[tokio::test]
    async fn test_load_invalid_toml_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        tokio::fs::write(&path, b"not valid toml [[[").await.unwrap();

        let result = AppConfig::load(&path).await;
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("bad value".to_string());
        assert_eq!(err.to_string(), "validation error: bad value");
    }
}
