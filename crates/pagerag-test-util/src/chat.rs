use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use pagerag_lib::chat::{ChatMessage, ChatModel};

/// Every message list a [`ScriptedChat`] was asked to complete.
pub type Transcript = Arc<Mutex<Vec<Vec<ChatMessage>>>>;

/// Chat model that replies from a fixed script and records its inputs.
#[derive(Debug, Clone, Default)]
pub struct ScriptedChat {
    replies: VecDeque<String>,
    transcript: Transcript,
}

impl ScriptedChat {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: replies.iter().map(|r| (*r).to_string()).collect(),
            transcript: Transcript::default(),
        }
    }

    /// Record requests into an existing transcript.
    #[must_use]
    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = transcript;
        self
    }

    pub fn transcript(&self) -> Transcript {
        Arc::clone(&self.transcript)
    }
}

impl ChatModel for ScriptedChat {
    fn complete(&mut self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        self.transcript.lock().unwrap().push(messages.to_vec());
        self.replies
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted reply left"))
    }
}
