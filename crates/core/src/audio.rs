//! Stored audio references

use serde::{Deserialize, Serialize};

/// Mime type assumed for uploads that do not declare one
pub const DEFAULT_AUDIO_MIME: &str = "audio/mpeg";

/// A synthesized audio file persisted for later retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioReference {
    /// Bare file name inside the audio directory
    pub filename: String,
    /// Public URL the file is served from
    pub url: String,
}

impl AudioReference {
    pub fn new(filename: impl Into<String>, url_prefix: &str) -> Self {
        let filename = filename.into();
        let url = format!("{}/{}", url_prefix.trim_end_matches('/'), filename);
        Self { filename, url }
    }
}
