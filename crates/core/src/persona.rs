//! Persona definitions
//!
//! A persona is a named character profile: the system prompt the LLM is asked
//! to role-play and the voice used when its replies are spoken.

use serde::{Deserialize, Serialize};

/// A character the backend can role-play
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    /// Stable identifier used by clients (`einstein`, `gandhi`, ...)
    pub id: String,

    /// Human readable name
    #[serde(alias = "name")]
    pub display_name: String,

    /// Short description shown in persona pickers
    #[serde(default)]
    pub description: String,

    /// Historical era or tagline, presentation only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub era: Option<String>,

    /// Portrait/image URL, presentation only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Instruction text prepended to every LLM call for this persona
    #[serde(alias = "prompt")]
    pub system_prompt: String,

    /// Voice name or id handed unchanged to every speech provider
    #[serde(alias = "voice", alias = "voice_id")]
    pub voice_selector: String,
}

impl Persona {
    /// Create a persona with the required fields
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        system_prompt: impl Into<String>,
        voice_selector: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            description: String::new(),
            era: None,
            image: None,
            system_prompt: system_prompt.into(),
            voice_selector: voice_selector.into(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the era/tagline
    pub fn with_era(mut self, era: impl Into<String>) -> Self {
        self.era = Some(era.into());
        self
    }

    /// Public metadata (no prompt, no voice internals)
    pub fn summary(&self) -> PersonaSummary {
        PersonaSummary {
            id: self.id.clone(),
            name: self.display_name.clone(),
            description: self.description.clone(),
            era: self.era.clone(),
            image: self.image.clone(),
        }
    }
}

/// Persona metadata returned by the listing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub era: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_aliases() {
        let json = r#"{
            "id": "gandhi",
            "name": "Mahatma Gandhi",
            "prompt": "You are Mahatma Gandhi.",
            "voice_id": "abc123"
        }"#;

        let persona: Persona = serde_json::from_str(json).unwrap();
        assert_eq!(persona.display_name, "Mahatma Gandhi");
        assert_eq!(persona.system_prompt, "You are Mahatma Gandhi.");
        assert_eq!(persona.voice_selector, "abc123");
        assert!(persona.description.is_empty());
    }

    #[test]
    fn test_summary_hides_prompt() {
        let persona = Persona::new("cleopatra", "Cleopatra", "secret prompt", "v")
            .with_description("Queen of Egypt");
        let json = serde_json::to_string(&persona.summary()).unwrap();

        assert!(json.contains("Queen of Egypt"));
        assert!(!json.contains("secret prompt"));
    }
}
