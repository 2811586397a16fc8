//! Conversation construction
//!
//! Turns persona + history + new message into a provider-neutral message
//! list. Neither provider request shape is assumed here: each backend maps
//! [`ChatMessage`] to its own wire format.
//!
//! The system prompt is not sent as a separate system message. It is fused
//! into the first user-originated message as
//! `[SYSTEM INSTRUCTION: {prompt}] {text}`, which keeps the persona framing
//! identical across backends.

use pastport_core::{Turn, TurnRole};

/// Message originator as seen by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Model,
}

impl From<TurnRole> for ChatRole {
    fn from(role: TurnRole) -> Self {
        match role {
            TurnRole::User => ChatRole::User,
            TurnRole::Assistant => ChatRole::Model,
        }
    }
}

/// Provider-neutral chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// Prefix `text` with the persona instruction
pub fn fuse_system_instruction(system_prompt: &str, text: &str) -> String {
    format!("[SYSTEM INSTRUCTION: {}] {}", system_prompt, text)
}

/// Build the message list for one generation call
///
/// - Empty history: a single user message carrying the fused instruction and
///   the new message.
/// - Otherwise: the first history turn is fused and emitted as a user message
///   whatever its original role, the remaining turns keep their mapped role,
///   and the new message is appended as the final user message.
pub fn build_conversation(system_prompt: &str, history: &[Turn], message: &str) -> Vec<ChatMessage> {
    let Some((first, rest)) = history.split_first() else {
        return vec![ChatMessage::user(fuse_system_instruction(system_prompt, message))];
    };

    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::user(fuse_system_instruction(
        system_prompt,
        &first.content,
    )));
    messages.extend(rest.iter().map(|turn| ChatMessage {
        role: turn.role.into(),
        text: turn.content.clone(),
    }));
    messages.push(ChatMessage::user(message));
    messages
}
