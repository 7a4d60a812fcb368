pub mod azure;
pub mod session;

use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Produces the assistant reply to an ordered message history.
pub trait ChatModel {
    fn complete(&mut self, messages: &[ChatMessage]) -> anyhow::Result<String>;
}

impl<M: ChatModel + ?Sized> ChatModel for Box<M> {
    fn complete(&mut self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        (**self).complete(messages)
    }
}
