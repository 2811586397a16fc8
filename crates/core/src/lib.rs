//! Core traits and types for the persona voice backend
//!
//! This crate provides foundational types used across all other crates:
//! - Persona definitions
//! - Conversation turns
//! - Content safety filter
//! - Core traits for pluggable speech backends (STT, TTS)
//! - Error types

pub mod audio;
pub mod conversation;
pub mod error;
pub mod persona;
pub mod safety;
pub mod traits;

pub use audio::{AudioReference, DEFAULT_AUDIO_MIME};
pub use conversation::{Turn, TurnRole};
pub use error::{Error, Result};
pub use persona::{Persona, PersonaSummary};
pub use safety::{ContentFilter, DEFAULT_BANNED_WORDS};
pub use traits::{SpeechProvider, SpeechToText};
