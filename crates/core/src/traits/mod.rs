//! Core traits for pluggable backends
//!
//! ```text
//! Speech Processing:
//!   - SpeechToText: uploaded audio → transcript
//!   - SpeechProvider: reply text → encoded audio (one link in the TTS chain)
//! ```
//!
//! Language model traits live in `pastport-llm`.

mod speech;

pub use speech::{SpeechProvider, SpeechToText};
