//! Answer generation over retrieved context

pub mod prompt;

pub use prompt::PromptBuilder;

use std::sync::Arc;
use tracing::error;

use crate::providers::{ChatMessage, LlmProvider};
use crate::types::ChatTurn;

/// Reply returned when the store has nothing relevant to answer from
pub const NO_RELEVANT_CONTENT: &str = "I couldn't find any relevant document content.";

/// Turns a grounded prompt plus chat history into an answer string
pub struct AnswerGenerator {
    llm: Arc<dyn LlmProvider>,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Generate an answer for a prompt, carrying prior turns so the model
    /// can resolve follow-up questions.
    ///
    /// Inference failures are folded into the reply rather than propagated;
    /// a dead model backend should degrade the chat, not break it.
    pub async fn generate(&self, prompt: &str, history: &[ChatTurn]) -> String {
        let mut messages = vec![ChatMessage::system(
            "You are a helpful assistant that answers questions using the provided document content.",
        )];
        for turn in history {
            messages.push(ChatMessage::user(&turn.query));
            messages.push(ChatMessage::assistant(&turn.response));
        }
        messages.push(ChatMessage::user(prompt));

        match self.llm.chat(&messages).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(error = %e, "answer generation failed");
                format!("Error generating answer: {e}")
            }
        }
    }
}
