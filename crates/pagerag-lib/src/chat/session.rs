use tracing::debug;

use crate::chat::{ChatMessage, ChatModel};
use crate::config::MAX_HISTORY_MESSAGES;
use crate::embedding::Embedder;
use crate::error::RagError;
use crate::pipeline::context::ContextBundle;
use crate::pipeline::retriever::Retriever;

/// Retrieval parameters for one question.
#[derive(Debug, Clone, Copy)]
pub struct AskParams {
    pub top_n: usize,
    pub threshold: f32,
}

/// A model reply plus the citations of the evidence it was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    /// `None` when no evidence cleared the threshold.
    pub citations: Option<String>,
}

impl Answer {
    /// Reply text followed by a references block when there is one.
    pub fn render(&self) -> String {
        match &self.citations {
            Some(citations) => format!("{}\n\nReferences:\n{citations}", self.text),
            None => self.text.clone(),
        }
    }
}

/// Conversation state for one chat user.
///
/// Owned by the caller and passed explicitly; nothing here is global.
#[derive(Debug, Default)]
pub struct ChatSession {
    history: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prior user/assistant messages, oldest first.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Answer `question` grounded in the documents behind `retriever`.
    ///
    /// The system prompt carries freshly retrieved context on every call; the
    /// exchange is appended to the history only when the model replies.
    pub fn ask(
        &mut self,
        question: &str,
        retriever: &Retriever,
        embedder: &mut dyn Embedder,
        model: &mut dyn ChatModel,
        params: AskParams,
    ) -> Result<Answer, RagError> {
        let bundle = retriever.answer_context(embedder, question, params.top_n, params.threshold)?;

        let skip = self.history.len().saturating_sub(MAX_HISTORY_MESSAGES);
        let mut messages = Vec::with_capacity(self.history.len() - skip + 2);
        messages.push(ChatMessage::system(system_prompt(&bundle)));
        messages.extend(self.history[skip..].iter().cloned());
        messages.push(ChatMessage::user(question));

        debug!(
            messages = messages.len(),
            has_evidence = bundle.has_evidence(),
            "Sending chat request"
        );
        let reply = model.complete(&messages).map_err(|e| RagError::chat(&e))?;

        self.history.push(ChatMessage::user(question));
        self.history.push(ChatMessage::assistant(reply.clone()));

        let citations = bundle.has_evidence().then_some(bundle.citations);
        Ok(Answer {
            text: reply,
            citations,
        })
    }
}

/// Instructions plus the retrieved evidence for the model.
pub fn system_prompt(bundle: &ContextBundle) -> String {
    format!(
        "You are an assistant that answers questions about a collection of documents. \
         Use only the documentation excerpts below. If the excerpts are \"null\" or do not \
         contain the answer, say that the documents do not contain that information.\n\n\
         Excerpts:\n{}\n\nSources:\n{}",
        bundle.context, bundle.citations
    )
}
