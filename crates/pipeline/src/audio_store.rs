//! Audio store
//!
//! Synthesized audio is written to a single directory under a unique name
//! and served back by bare filename. Files are never deleted by the
//! process.

use std::path::{Path, PathBuf};

use pastport_core::AudioReference;

use crate::PipelineError;

/// Directory-backed store for synthesized audio
#[derive(Debug, Clone)]
pub struct AudioStore {
    dir: PathBuf,
    url_prefix: String,
}

impl AudioStore {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Create the directory if missing
    pub async fn ensure_dir(&self) -> Result<(), PipelineError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            PipelineError::Storage(format!("cannot create {}: {}", self.dir.display(), e))
        })
    }

    /// Persist `bytes` under `{persona_id}-{uuid}.{ext}`
    pub async fn save(
        &self,
        persona_id: &str,
        extension: &str,
        bytes: &[u8],
    ) -> Result<AudioReference, PipelineError> {
        self.ensure_dir().await?;

        let filename = format!(
            "{}-{}.{}",
            sanitize(persona_id),
            uuid::Uuid::new_v4().simple(),
            sanitize(extension)
        );
        let path = self.dir.join(&filename);

        tokio::fs::write(&path, bytes).await.map_err(|e| {
            PipelineError::Storage(format!("cannot write {}: {}", path.display(), e))
        })?;

        tracing::debug!(file = %filename, bytes = bytes.len(), "Stored audio");
        Ok(AudioReference::new(filename, &self.url_prefix))
    }

    /// Read a stored file by bare name
    ///
    /// Returns `None` for names that fail validation and for missing files.
    pub async fn read(&self, filename: &str) -> Result<Option<Vec<u8>>, PipelineError> {
        if !is_valid_filename(filename) {
            return Ok(None);
        }

        match tokio::fs::read(self.dir.join(filename)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PipelineError::Io(e)),
        }
    }
}

/// A bare file name made only of safe characters
pub fn is_valid_filename(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 255
        && !name.starts_with('.')
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Content type for a stored file, by extension
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") | Some("opus") => "audio/ogg",
        Some("webm") => "audio/webm",
        Some("aac") => "audio/aac",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}

fn sanitize(part: &str) -> String {
    let cleaned: String = part
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "audio".to_string()
    } else {
        cleaned
    }
}
