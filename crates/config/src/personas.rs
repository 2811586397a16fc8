//! Persona registry
//!
//! Loaded once at startup from a YAML or JSON file, falling back to the
//! built-in set when the file does not exist. Read-only afterwards and shared
//! behind an `Arc`.
//!
//! Accepted file shapes:
//!
//! ```yaml
//! personas:
//!   - id: einstein
//!     name: Albert Einstein
//!     description: Theoretical physicist
//!     prompt: You are Albert Einstein...
//!     voice: pNInz6obpgDQGcFmaJgB
//! ```
//!
//! or a bare top-level list of the same entries.
//!
//! `voice` is passed unchanged to every provider in the TTS chain, so it must
//! name a voice of the first provider in `tts.provider_order`. The built-in
//! set uses ElevenLabs premade voice ids to match the default order.

use pastport_core::{Persona, PersonaSummary};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::ConfigError;

/// ElevenLabs premade voices used by the built-in personas
const EINSTEIN_VOICE: &str = "pNInz6obpgDQGcFmaJgB";
const GANDHI_VOICE: &str = "ErXwobaYiN019PkySvjV";
const CLEOPATRA_VOICE: &str = "21m00Tcm4TlvDq8ikWAM";

#[derive(Deserialize)]
#[serde(untagged)]
enum PersonaFile {
    Wrapped { personas: Vec<Persona> },
    List(Vec<Persona>),
}

/// Ordered, id-indexed set of personas
#[derive(Debug, Clone)]
pub struct PersonaRegistry {
    personas: Vec<Persona>,
    index: HashMap<String, usize>,
}

impl PersonaRegistry {
    /// Build a registry, rejecting duplicate ids and blank prompts
    pub fn new(personas: Vec<Persona>) -> Result<Self, ConfigError> {
        let mut index = HashMap::with_capacity(personas.len());

        for (i, persona) in personas.iter().enumerate() {
            if persona.id.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("personas[{}].id", i),
                    message: "Persona id cannot be empty".to_string(),
                });
            }
            if persona.system_prompt.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("personas.{}.system_prompt", persona.id),
                    message: "System prompt cannot be empty".to_string(),
                });
            }
            if index.insert(persona.id.clone(), i).is_some() {
                return Err(ConfigError::InvalidValue {
                    field: format!("personas.{}", persona.id),
                    message: "Duplicate persona id".to_string(),
                });
            }
        }

        Ok(Self { personas, index })
    }

    /// The built-in Einstein / Gandhi / Cleopatra set
    pub fn builtin() -> Self {
        let personas = vec![
            Persona::new(
                "einstein",
                "Albert Einstein",
                "You are Albert Einstein. Speak thoughtfully with curiosity and humor about science and life.",
                EINSTEIN_VOICE,
            )
            .with_description("Theoretical physicist who developed the theory of relativity")
            .with_era("1879 - 1955"),
            Persona::new(
                "gandhi",
                "Mahatma Gandhi",
                "You are Mahatma Gandhi. Speak calmly, with compassion and moral insight about peace and nonviolence.",
                GANDHI_VOICE,
            )
            .with_description("Leader of Indian independence through nonviolent resistance")
            .with_era("1869 - 1948"),
            Persona::new(
                "cleopatra",
                "Cleopatra",
                "You are Cleopatra. Speak with grace and confidence, sharing thoughts on leadership and diplomacy.",
                CLEOPATRA_VOICE,
            )
            .with_description("Queen of Egypt, regal and strategic.")
            .with_era("69 - 30 BC"),
        ];

        let index = personas
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();

        Self { personas, index }
    }

    /// Parse a registry from YAML (JSON is a subset and parses too)
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let file: PersonaFile =
            serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        let personas = match file {
            PersonaFile::Wrapped { personas } => personas,
            PersonaFile::List(personas) => personas,
        };
        Self::new(personas)
    }

    /// Load from a YAML or JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileNotFound(format!("{}: {}", path.display(), e)))?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("json"));

        if is_json {
            let file: PersonaFile = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            let personas = match file {
                PersonaFile::Wrapped { personas } => personas,
                PersonaFile::List(personas) => personas,
            };
            Self::new(personas)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Load from `path` if it exists, else use the built-in set
    pub fn load_or_builtin<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            let registry = Self::load(path)?;
            tracing::info!(path = %path.display(), count = registry.len(), "Loaded personas");
            Ok(registry)
        } else {
            tracing::info!(
                path = %path.display(),
                "Persona file not found, using built-in personas"
            );
            Ok(Self::builtin())
        }
    }

    pub fn get(&self, id: &str) -> Option<&Persona> {
        self.index.get(id).map(|&i| &self.personas[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Personas in file order
    pub fn iter(&self) -> impl Iterator<Item = &Persona> {
        self.personas.iter()
    }

    /// Public metadata in file order
    pub fn summaries(&self) -> Vec<PersonaSummary> {
        self.personas.iter().map(Persona::summary).collect()
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}
