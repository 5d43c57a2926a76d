//! Configuration builders and temp config files for tests.
//!
//! Use [`TestConfigBuilder`] to create customised [`AppConfig`] values without
//! repeating boilerplate across crate boundaries, and [`TempConfig`] when the
//! code under test reads a config file from disk.

use std::path::PathBuf;

use bedside_config::AppConfig;
use tempfile::TempDir;

/// Fluent builder for [`AppConfig`] in tests.
///
/// # Example
///
/// ```ignore
/// let config = TestConfigBuilder::new()
///     .history_capacity(2)
///     .persona_preset("plain")
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn allowed_origin(mut self, origin: &str) -> Self {
        self.config.server.allowed_origin = Some(origin.to_string());
        self
    }

    pub fn model(mut self, model: &str) -> Self {
        self.config.llm.model = model.to_string();
        self
    }

    pub fn history_capacity(mut self, k: usize) -> Self {
        self.config.session.history_capacity = k;
        self
    }

    pub fn max_sessions(mut self, n: usize) -> Self {
        self.config.session.max_sessions = n;
        self
    }

    pub fn persona_preset(mut self, preset: &str) -> Self {
        self.config.persona.preset = preset.to_string();
        self
    }

    pub fn persona_instruction(mut self, instruction: &str) -> Self {
        self.config.persona.instruction = Some(instruction.to_string());
        self
    }

    pub fn input_template(mut self, template: &str) -> Self {
        self.config.persona.input_template = Some(template.to_string());
        self
    }

    pub fn format_style(mut self, style: &str) -> Self {
        self.config.persona.style = Some(style.to_string());
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A config file in an owned temp directory.
///
/// The directory is deleted when this value is dropped, even on panic.
pub struct TempConfig {
    pub path: PathBuf,
    _temp_dir: TempDir,
}

impl TempConfig {
    /// Write `toml_content` to a fresh `bedside.toml`.
    pub async fn with_toml(toml_content: &str) -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let path = temp_dir.path().join("bedside.toml");
        tokio::fs::write(&path, toml_content)
            .await
            .expect("failed to write test config");
        Self {
            path,
            _temp_dir: temp_dir,
        }
    }
}
