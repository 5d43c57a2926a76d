//! Personas: the fixed instruction, input template, and reply style a
//! session runs with.
//!
//! Three presets ship with the engine; a config file can override any part
//! of one or describe a custom persona from scratch.

use bedside_config::{ConfigError, INPUT_PLACEHOLDER, PersonaConfig};

use crate::format::FormatStyle;

const PATIENT_INSTRUCTION: &str = include_str!("../personas/patient.md");

const DOCTOR_INSTRUCTION: &str =
    "You are a Doctor and you are advising a patient on the importance of regular health check-ups.";

const PLAIN_INSTRUCTION: &str = "You are a helpful assistant. Answer clearly and concisely.";

/// Static persona configuration, fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaSpec {
    pub name: String,
    /// The system prompt, sent verbatim.
    pub instruction: String,
    /// Optional wrapper for each new input; contains [`INPUT_PLACEHOLDER`].
    pub input_template: Option<String>,
    pub style: FormatStyle,
}

impl PersonaSpec {
    pub fn new(name: impl Into<String>, instruction: impl Into<String>, style: FormatStyle) -> Self {
        Self {
            name: name.into(),
            instruction: instruction.into(),
            input_template: None,
            style,
        }
    }

    /// Set the input template.
    pub fn with_input_template(mut self, template: impl Into<String>) -> Self {
        self.input_template = Some(template.into());
        self
    }

    /// Virtual patient for student doctors to interview.
    pub fn patient() -> Self {
        Self::new("patient", PATIENT_INSTRUCTION.trim_end(), FormatStyle::NumberedHeading)
    }

    /// Doctor explaining why regular check-ups matter.
    pub fn doctor() -> Self {
        Self::new("doctor", DOCTOR_INSTRUCTION, FormatStyle::InlineStyle)
    }

    /// Generic assistant with no reply formatting.
    pub fn plain() -> Self {
        Self::new("plain", PLAIN_INSTRUCTION, FormatStyle::None)
    }

    /// Look up a built-in preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "patient" => Some(Self::patient()),
            "doctor" => Some(Self::doctor()),
            "plain" => Some(Self::plain()),
            _ => None,
        }
    }

    /// Build the active persona from the `[persona]` config section.
    ///
    /// The section is validated first, so a hand-built [`PersonaConfig`] is
    /// held to the same rules as one loaded from a file.
    pub fn from_config(config: &PersonaConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut persona = match config.preset.as_str() {
            "custom" => Self::new("custom", String::new(), FormatStyle::default()),
            name => Self::preset(name).ok_or_else(|| undefined("preset", name))?,
        };
        if let Some(ref instruction) = config.instruction {
            persona.instruction = instruction.clone();
        }
        if let Some(ref template) = config.input_template {
            persona.input_template = Some(template.clone());
        }
        if let Some(ref style) = config.style {
            persona.style =
                FormatStyle::from_config_name(style).ok_or_else(|| undefined("style", style))?;
        }
        Ok(persona)
    }

    /// Wrap `input` in the template, if any.
    pub fn render_input(&self, input: &str) -> String {
        match self.input_template {
            Some(ref template) => template.replace(INPUT_PLACEHOLDER, input),
            None => input.to_string(),
        }
    }
}

fn undefined(field: &str, name: &str) -> ConfigError {
    ConfigError::Validation(format!("persona.{field} {name:?} has no built-in definition"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_presets() {
        let patient = PersonaSpec::patient();
        assert!(patient.instruction.contains("John Doe"));
        assert_eq!(patient.style, FormatStyle::NumberedHeading);

        assert_eq!(PersonaSpec::doctor().style, FormatStyle::InlineStyle);
        assert_eq!(PersonaSpec::plain().style, FormatStyle::None);
        assert!(PersonaSpec::preset("pirate").is_none());
    }

    #[test]
    fn test_from_default_config_is_patient() {
        let persona = PersonaSpec::from_config(&PersonaConfig::default()).unwrap();
        assert_eq!(persona, PersonaSpec::patient());
    }

    #[test]
    fn test_config_overrides() {
        let config = PersonaConfig {
            preset: "doctor".to_string(),
            instruction: Some("You are a cardiologist.".to_string()),
            input_template: Some("Patient: {input}".to_string()),
            style: Some("none".to_string()),
        };
        let persona = PersonaSpec::from_config(&config).unwrap();
        assert_eq!(persona.name, "doctor");
        assert_eq!(persona.instruction, "You are a cardiologist.");
        assert_eq!(persona.style, FormatStyle::None);
        assert_eq!(persona.render_input("my chest hurts"), "Patient: my chest hurts");
    }

    #[test]
    fn test_custom_requires_instruction() {
        let config = PersonaConfig {
            preset: "custom".to_string(),
            ..PersonaConfig::default()
        };
        assert!(matches!(
            PersonaSpec::from_config(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_template_without_placeholder_rejected() {
        let config = PersonaConfig {
            input_template: Some("no slot".to_string()),
            ..PersonaConfig::default()
        };
        assert!(matches!(
            PersonaSpec::from_config(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_every_configurable_name_has_a_definition() {
        for name in bedside_config::PERSONA_PRESETS {
            let config = PersonaConfig {
                preset: name.to_string(),
                instruction: Some("You are a nurse.".to_string()),
                ..PersonaConfig::default()
            };
            let persona = PersonaSpec::from_config(&config).unwrap();
            assert_eq!(persona.name, name);
        }
        for style in bedside_config::FORMAT_STYLES {
            let parsed = FormatStyle::from_config_name(style).unwrap();
            assert_eq!(parsed.config_name(), style);
        }
    }

    #[test]
    fn test_render_input_without_template() {
        assert_eq!(PersonaSpec::plain().render_input("hi"), "hi");
    }
}
